use poise::serenity_prelude as serenity;

/// Failures a jail or unjail transition can surface to its caller.
///
/// Validation variants are raised before anything is written. Failed
/// notifications never show up here: they are logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum JailError {
    #[error("invalid jail duration: {0}")]
    InvalidDuration(String),

    #[error("jail reason must be between 1 and {max} characters", max = super::MAX_REASON_LEN)]
    InvalidReason,

    #[error("member {0} could not be found")]
    SubjectNotFound(serenity::UserId),

    #[error("jail storage failed: {0}")]
    Store(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Platform(#[from] anyhow::Error),
}
