use crate::services::localization::ContextL10nExt;
use crate::{Context, Error};

/// Restricts the jail commands to the configured guild and, when set, the admin role.
pub async fn is_jail_admin(ctx: Context<'_>) -> Result<bool, Error> {
    let settings = &ctx.data().settings;

    let allowed = if ctx.guild_id() != Some(settings.guild_id) {
        false
    } else {
        match settings.admin_role_id {
            None => true,
            Some(admin_role) => ctx
                .author_member()
                .await
                .is_some_and(|member| member.roles.contains(&admin_role)),
        }
    };

    if !allowed {
        ctx.send(
            poise::CreateReply::default()
                .content(ctx.l10n_user().t("mod-error-no-permission", None))
                .ephemeral(true),
        )
        .await?;
    }

    Ok(allowed)
}
