use anyhow::Context as _;
use clap::Parser as _;
use dotenvy::dotenv;
use jailkeeper::services::discord::DiscordPlatform;
use jailkeeper::services::jail::{JailService, JailStore, RoleLayout};
use jailkeeper::services::localization::LocalizationManager;
use jailkeeper::services::log_session::LogSessionService;
use jailkeeper::settings::Settings;
use jailkeeper::{Data, Error, db, modules, services};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Publish commands. If no guild ID is provided, publish globally.
    #[arg(long, num_args = 0..)]
    publish: Option<Vec<u64>>,

    /// Clear all commands instead of publishing them.
    #[arg(long)]
    clear: bool,

    /// Rollback the specified number of migrations and run all migrations again.
    #[arg(long, num_args = 0..=1, default_missing_value = "1")]
    refresh_migrations: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting jailkeeper...");

    let settings = Arc::new(Settings::from_env().context("Invalid configuration")?);

    // Establish database connection
    let db = db::establish_connection(&settings.database_url)
        .await
        .context("Failed to connect to database")?;

    // Run migrations
    use sea_orm_migration::MigratorTrait;
    if let Some(depth) = args.refresh_migrations {
        info!("Refreshing migrations (down {}, then up)...", depth);
        db::migrations::Migrator::down(&db, Some(depth))
            .await
            .context("Failed to rollback migration")?;
    }

    db::migrations::Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    if args.refresh_migrations.is_some() {
        info!("Migrations refreshed successfully.");
        return Ok(());
    }

    let token = std::env::var("DISCORD_TOKEN").context("missing DISCORD_TOKEN")?;
    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::GUILD_MEMBERS;

    // Initialize localization manager
    let l10n = Arc::new(LocalizationManager::new());

    // Load and translate commands
    let mut commands = modules::commands();
    l10n.apply_translations(&mut commands);

    // Handle command registration if requested
    if let Some(publish_args) = args.publish {
        let http = serenity::Http::new(&token);
        let application = http
            .get_current_application_info()
            .await
            .context("Failed to fetch application info")?;
        info!("Fetched Application ID: {}", application.id);
        http.set_application_id(application.id);

        let empty_commands = vec![];
        let commands = if args.clear {
            &empty_commands
        } else {
            &commands
        };

        if publish_args.is_empty() {
            if args.clear {
                info!("Clearing commands globally...");
            } else {
                info!("Registering commands globally...");
            }

            if let Err(e) = poise::builtins::register_globally(&http, commands).await {
                error!("Failed to register commands globally: {}", e);
            } else {
                info!("Global command operation successful");
            }
        } else {
            for guild_id in publish_args {
                if args.clear {
                    info!("Clearing commands in guild {}...", guild_id);
                } else {
                    info!("Registering commands in guild {}...", guild_id);
                }

                if let Err(e) = poise::builtins::register_in_guild(
                    &http,
                    commands,
                    serenity::GuildId::new(guild_id),
                )
                .await
                {
                    error!("Failed to register commands in guild {}: {}", guild_id, e);
                } else {
                    info!("Guild command operation successful for guild {}", guild_id);
                }
            }
        }
        return Ok(());
    }

    let log_sessions = Arc::new(LogSessionService::new(
        settings.log_page_size,
        settings.log_session_idle,
    ));

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            event_handler: |ctx, event, _framework, data| {
                Box::pin(services::event_manager::handle_event(ctx, event, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, _framework| {
            Box::pin(async move {
                let guild = settings
                    .guild_id
                    .to_partial_guild(ctx)
                    .await
                    .context("Failed to fetch the configured guild")?;

                let platform = Arc::new(DiscordPlatform::new(
                    ctx.http.clone(),
                    settings.guild_id,
                    settings.report_channel_id,
                    l10n.get_proxy(&guild.preferred_locale),
                ));

                let jail = Arc::new(JailService::new(
                    JailStore::new(db),
                    RoleLayout::for_guild(settings.guild_id, settings.jail_role_id),
                    platform.clone(),
                    platform,
                ));

                // Start unjail runner
                jail.clone().start_unjail_runner(settings.sweep_interval);

                Ok(Data {
                    settings,
                    l10n,
                    jail,
                    log_sessions,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .context("Failed to create client")?;

    info!("Bot is ready!");
    client.start().await.context("Client error")?;

    Ok(())
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start the bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}
