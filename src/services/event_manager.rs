use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use tracing::{error, info};

/// Handles gateway events that are not slash commands.
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("Logged in as {}", data_about_bot.user.name);
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => {
            if let Err(e) =
                crate::modules::jail::events::handle_log_navigation(ctx, component, data).await
            {
                error!(
                    "Error handling component {}: {:?}",
                    component.data.custom_id, e
                );
            }
        }
        _ => {}
    }

    Ok(())
}
