pub mod db;
pub mod modules;
pub mod services;
pub mod settings;

use std::sync::Arc;

// Custom user data passed to all command functions
pub struct Data {
    pub settings: Arc<settings::Settings>,
    pub l10n: Arc<services::localization::LocalizationManager>,
    pub jail: Arc<services::jail::JailService>,
    pub log_sessions: Arc<services::log_session::LogSessionService>,
}

pub type Error = anyhow::Error;
pub type Context<'a> = poise::Context<'a, Data, Error>;
