use crate::modules::jail::checks::is_jail_admin;
use crate::modules::jail::duration_parser::parse_duration;
use crate::services::discord::report_embed;
use crate::services::jail::{JailError, JailReport, JailRequest};
use crate::services::localization::{ContextL10nExt, L10nProxy};
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::error;

/// Jail a user, swapping their roles for the jail role until the time runs out
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    check = "is_jail_admin",
    ephemeral
)]
pub async fn jail(
    ctx: Context<'_>,
    #[description = "User to jail"] user: serenity::User,
    #[description = "Reason for the jail"]
    #[min_length = 1]
    #[max_length = 100]
    reason: String,
    #[description = "Time for the jail, e.g. 10m, 1h, 1d"] duration: String,
) -> Result<(), Error> {
    let l10n = ctx.l10n_user();

    let Some(duration) = parse_duration(&duration) else {
        ctx.say(l10n.t("mod-error-invalid-duration", None)).await?;
        return Ok(());
    };

    ctx.defer_ephemeral().await?;

    let request = JailRequest {
        user_id: user.id,
        moderator: ctx.author().id,
        reason,
        duration,
    };

    match ctx.data().jail.jail_user(request).await {
        Ok(record) => {
            let report = JailReport::Jailed {
                user_id: record.user_id,
                reason: record.reason,
                expires_at: record.expires_at,
                issued_by: record.issued_by,
            };
            ctx.send(poise::CreateReply::default().embed(report_embed(&report, &l10n)))
                .await?;
        }
        Err(e) => {
            ctx.say(jail_error_message(&e, &l10n, "mod-error-jail-failed"))
                .await?;
        }
    }

    Ok(())
}

/// User-facing text for a failed jail or unjail; unexpected failures are logged.
pub(crate) fn jail_error_message(e: &JailError, l10n: &L10nProxy, failure_key: &str) -> String {
    match e {
        JailError::InvalidDuration(_) => l10n.t("mod-error-invalid-duration", None),
        JailError::InvalidReason => l10n.t("mod-error-invalid-reason", None),
        JailError::SubjectNotFound(_) => l10n.t("mod-error-member-not-found", None),
        JailError::Store(_) | JailError::Platform(_) => {
            error!("Jail command failed: {:?}", e);
            l10n.t(failure_key, None)
        }
    }
}
