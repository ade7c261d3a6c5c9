use crate::db::entities::jail_logs::JailAction;
use crate::modules::jail::checks::is_jail_admin;
use crate::services::jail::{Actor, AuditLogEntry};
use crate::services::localization::{ContextL10nExt, L10nProxy};
use crate::services::log_session::{Navigation, PageView, custom_id};
use crate::{Context, Error};
use chrono::Utc;
use fluent::FluentArgs;
use poise::serenity_prelude as serenity;
use tracing::error;

const LOG_COLOR: u32 = 0x0099FF;

/// Show the jail history of a user
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    check = "is_jail_admin"
)]
pub async fn jaillog(
    ctx: Context<'_>,
    #[description = "User whose jail history to show"] user: serenity::User,
) -> Result<(), Error> {
    let l10n = ctx.l10n_user();

    let entries = match ctx.data().jail.logs_for(user.id).await {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to load jail logs for {}: {:?}", user.id, e);
            ctx.send(
                poise::CreateReply::default()
                    .content(l10n.t("jaillog-error", None))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    };

    let sessions = &ctx.data().log_sessions;
    let view = sessions.open(ctx.author().id, user.id, user.tag(), entries, Utc::now());
    let (embed, components) = render_page(&view, &l10n);

    if let Err(e) = ctx
        .send(
            poise::CreateReply::default()
                .embed(embed)
                .components(components),
        )
        .await
    {
        sessions.close(&view.session_id);
        return Err(e.into());
    }

    Ok(())
}

/// Embed and navigation buttons for one page of a log session.
pub(crate) fn render_page(
    view: &PageView,
    l10n: &L10nProxy,
) -> (serenity::CreateEmbed, Vec<serenity::CreateActionRow>) {
    let mut args = FluentArgs::new();
    args.set("user", view.subject_label.clone());
    args.set("page", view.index + 1);
    args.set("total", view.total);

    let description = if view.entries.is_empty() {
        l10n.t("jaillog-empty", None)
    } else {
        view.entries
            .iter()
            .map(|entry| format_entry(entry, l10n))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let embed = serenity::CreateEmbed::new()
        .title(l10n.t("jaillog-title", Some(&args)))
        .description(description)
        .colour(LOG_COLOR);

    let buttons = vec![
        serenity::CreateButton::new(custom_id(Navigation::Previous, &view.session_id))
            .label(l10n.t("jaillog-button-previous", None))
            .style(serenity::ButtonStyle::Primary)
            .disabled(!view.has_previous()),
        serenity::CreateButton::new(custom_id(Navigation::Next, &view.session_id))
            .label(l10n.t("jaillog-button-next", None))
            .style(serenity::ButtonStyle::Primary)
            .disabled(!view.has_next()),
    ];

    (embed, vec![serenity::CreateActionRow::Buttons(buttons)])
}

fn format_entry(entry: &AuditLogEntry, l10n: &L10nProxy) -> String {
    let action = match entry.action {
        JailAction::Jailed => l10n.t("jaillog-action-jailed", None),
        JailAction::Unjailed => l10n.t("jaillog-action-unjailed", None),
    };
    let by = match entry.by {
        Actor::Moderator(id) => format!("<@{}>", id),
        Actor::Automated => l10n.t("jaillog-by-system", None),
    };

    format!(
        "**{}**: {}\n**{}**: {}\n**{}**: {}\n**{}**: <t:{}:f>",
        l10n.t("jaillog-field-action", None),
        action,
        l10n.t("jaillog-field-reason", None),
        entry.reason,
        l10n.t("jaillog-field-by", None),
        by,
        l10n.t("jaillog-field-date", None),
        entry.timestamp.timestamp(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::localization::LocalizationManager;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn l10n() -> L10nProxy {
        Arc::new(LocalizationManager::new()).get_proxy("en-US")
    }

    fn view(entries: Vec<AuditLogEntry>, index: usize, total: usize) -> PageView {
        PageView {
            session_id: "1".to_string(),
            subject: serenity::UserId::new(20),
            subject_label: "spammer".to_string(),
            index,
            total,
            entries,
        }
    }

    #[test]
    fn entries_show_action_reason_actor_and_date() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let moderator = AuditLogEntry {
            action: JailAction::Jailed,
            reason: "spam".to_string(),
            by: Actor::Moderator(serenity::UserId::new(900)),
            timestamp,
        };
        assert_eq!(
            format_entry(&moderator, &l10n()),
            "**Action**: Jailed\n**Reason**: spam\n**By**: <@900>\n**Date**: <t:1704067200:f>"
        );

        let automated = AuditLogEntry {
            action: JailAction::Unjailed,
            reason: "N/A".to_string(),
            by: Actor::Automated,
            timestamp,
        };
        let text = format_entry(&automated, &l10n());
        assert!(text.contains("**Action**: Unjailed"));
        assert!(text.contains("**By**: System"));
    }

    #[test]
    fn page_title_counts_from_one() {
        let (embed, rows) = render_page(&view(Vec::new(), 1, 3), &l10n());
        let json = serde_json::to_value(&embed).unwrap();

        assert_eq!(json["title"], "Jail Logs for spammer (Page 2 of 3)");
        assert_eq!(json["description"], "No logs available for this user.");
        assert_eq!(rows.len(), 1);
    }
}
