//! serenity-backed implementations of the jail collaborators.

use crate::Error;
use crate::services::jail::{Actor, JailReport, MemberDirectory, Notifier};
use crate::services::localization::L10nProxy;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

const JAIL_COLOR: u32 = 0xFF0000;
const UNJAIL_COLOR: u32 = 0x00FF00;

pub struct DiscordPlatform {
    http: Arc<serenity::Http>,
    guild_id: serenity::GuildId,
    report_channel: serenity::ChannelId,
    l10n: L10nProxy,
}

impl DiscordPlatform {
    pub fn new(
        http: Arc<serenity::Http>,
        guild_id: serenity::GuildId,
        report_channel: serenity::ChannelId,
        l10n: L10nProxy,
    ) -> Self {
        Self {
            http,
            guild_id,
            report_channel,
            l10n,
        }
    }

    fn everyone_role(&self) -> serenity::RoleId {
        serenity::RoleId::new(self.guild_id.get())
    }
}

/// Embed describing a jail transition, shared by reports, DMs and command replies.
pub fn report_embed(report: &JailReport, l10n: &L10nProxy) -> serenity::CreateEmbed {
    match report {
        JailReport::Jailed {
            user_id,
            reason,
            expires_at,
            issued_by,
        } => serenity::CreateEmbed::new()
            .title(l10n.t("jail-report-title", None))
            .field(
                l10n.t("report-field-user-jailed", None),
                format!("<@{}>", user_id),
                true,
            )
            .field(l10n.t("report-field-reason", None), reason.clone(), true)
            .field(
                l10n.t("report-field-expires", None),
                format!("<t:{}:R>", expires_at.timestamp()),
                true,
            )
            .field(
                l10n.t("report-field-jailed-by", None),
                format!("<@{}>", issued_by),
                true,
            )
            .colour(JAIL_COLOR),
        JailReport::Unjailed { user_id, by, at } => {
            let by = match by {
                Actor::Moderator(id) => format!("<@{}>", id),
                Actor::Automated => l10n.t("report-val-automated", None),
            };
            serenity::CreateEmbed::new()
                .title(l10n.t("unjail-report-title", None))
                .field(
                    l10n.t("report-field-user-unjailed", None),
                    format!("<@{}>", user_id),
                    true,
                )
                .field(l10n.t("report-field-unjailed-by", None), by, true)
                .field(
                    l10n.t("report-field-time", None),
                    format!("<t:{}:F>", at.timestamp()),
                    false,
                )
                .colour(UNJAIL_COLOR)
        }
    }
}

/// True when Discord answered 404, e.g. the member left the guild.
fn is_not_found(e: &serenity::Error) -> bool {
    match e {
        serenity::Error::Http(http_err) => http_err
            .status_code()
            .is_some_and(|status| status.as_u16() == 404),
        _ => false,
    }
}

#[async_trait]
impl MemberDirectory for DiscordPlatform {
    async fn member_roles(
        &self,
        user_id: serenity::UserId,
    ) -> Result<Option<Vec<serenity::RoleId>>, Error> {
        match self.guild_id.member(self.http.as_ref(), user_id).await {
            Ok(member) => Ok(Some(member.roles)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_roles(
        &self,
        user_id: serenity::UserId,
        roles: &[serenity::RoleId],
        audit_reason: &str,
    ) -> Result<(), Error> {
        // @everyone is implicit; an empty list leaves the member with only it
        let everyone = self.everyone_role();
        let roles: Vec<serenity::RoleId> =
            roles.iter().copied().filter(|r| *r != everyone).collect();

        self.guild_id
            .edit_member(
                self.http.as_ref(),
                user_id,
                serenity::EditMember::new()
                    .roles(roles)
                    .audit_log_reason(audit_reason),
            )
            .await?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordPlatform {
    async fn notify_member(
        &self,
        user_id: serenity::UserId,
        report: &JailReport,
    ) -> Result<(), Error> {
        let content = match report {
            JailReport::Jailed { .. } => self.l10n.t("jail-dm-content", None),
            JailReport::Unjailed { .. } => self.l10n.t("unjail-dm-content", None),
        };

        let channel = user_id.create_dm_channel(self.http.as_ref()).await?;
        channel
            .id
            .send_message(
                self.http.as_ref(),
                serenity::CreateMessage::new()
                    .content(content)
                    .embed(report_embed(report, &self.l10n)),
            )
            .await?;

        Ok(())
    }

    async fn broadcast(&self, report: &JailReport) -> Result<(), Error> {
        self.report_channel
            .send_message(
                self.http.as_ref(),
                serenity::CreateMessage::new()
                    .embed(report_embed(report, &self.l10n))
                    .allowed_mentions(serenity::CreateAllowedMentions::new()),
            )
            .await?;

        Ok(())
    }
}
