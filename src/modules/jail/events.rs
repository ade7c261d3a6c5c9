use crate::modules::jail::commands::log::render_page;
use crate::services::log_session::{Navigated, parse_custom_id};
use crate::{Data, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use tracing::warn;

/// Handles the Previous/Next buttons of a jail log message.
///
/// Clicks on expired sessions are acknowledged and otherwise ignored.
pub async fn handle_log_navigation(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let Some((navigation, session_id)) = parse_custom_id(&interaction.data.custom_id) else {
        return Ok(());
    };
    let l10n = data.l10n.get_proxy(&interaction.locale);

    let response = match data.log_sessions.navigate(
        session_id,
        interaction.user.id,
        navigation,
        Utc::now(),
    ) {
        Navigated::Moved(view) | Navigated::Unchanged(view) => {
            let (embed, components) = render_page(&view, &l10n);
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(components),
            )
        }
        Navigated::NotOwner => serenity::CreateInteractionResponse::Message(
            serenity::CreateInteractionResponseMessage::new()
                .content(l10n.t("jaillog-not-owner", None))
                .ephemeral(true),
        ),
        Navigated::Expired => {
            warn!(
                "Ignoring navigation on expired jail log session {}",
                session_id
            );
            serenity::CreateInteractionResponse::Acknowledge
        }
    };

    interaction.create_response(ctx, response).await?;
    Ok(())
}
