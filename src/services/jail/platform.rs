use super::store::Actor;
use crate::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;

/// Payload for jail and unjail notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JailReport {
    Jailed {
        user_id: serenity::UserId,
        reason: String,
        expires_at: DateTime<Utc>,
        issued_by: serenity::UserId,
    },
    Unjailed {
        user_id: serenity::UserId,
        by: Actor,
        at: DateTime<Utc>,
    },
}

/// Member lookup and role mutation on the chat platform.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Current roles of a member, or `None` if they are not in the guild.
    async fn member_roles(
        &self,
        user_id: serenity::UserId,
    ) -> Result<Option<Vec<serenity::RoleId>>, Error>;

    /// Replace the member's roles with exactly `roles`.
    async fn set_roles(
        &self,
        user_id: serenity::UserId,
        roles: &[serenity::RoleId],
        audit_reason: &str,
    ) -> Result<(), Error>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Direct message to the member. Callers treat failure as non-fatal.
    async fn notify_member(
        &self,
        user_id: serenity::UserId,
        report: &JailReport,
    ) -> Result<(), Error>;

    /// Post to the jail report channel.
    async fn broadcast(&self, report: &JailReport) -> Result<(), Error>;
}
