use super::jail::jail_error_message;
use crate::modules::jail::checks::is_jail_admin;
use crate::services::jail::{Actor, UnjailOutcome};
use crate::services::localization::ContextL10nExt;
use crate::{Context, Error};
use fluent::FluentArgs;
use poise::serenity_prelude as serenity;

/// Unjail a user, restoring the roles they had before the jail
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    check = "is_jail_admin",
    ephemeral
)]
pub async fn unjail(
    ctx: Context<'_>,
    #[description = "User to unjail"] user: serenity::User,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let l10n = ctx.l10n_user();

    let mut args = FluentArgs::new();
    args.set("userId", user.id.get().to_string());

    let reply = match ctx
        .data()
        .jail
        .unjail_user(user.id, Actor::Moderator(ctx.author().id))
        .await
    {
        Ok(UnjailOutcome::Unjailed(_)) => l10n.t("mod-unjail-success", Some(&args)),
        Ok(UnjailOutcome::NotJailed) => l10n.t("mod-unjail-not-jailed", Some(&args)),
        Err(e) => jail_error_message(&e, &l10n, "mod-error-unjail-failed"),
    };

    ctx.say(reply).await?;
    Ok(())
}
