pub mod discord;
pub mod event_manager;
pub mod jail;
pub mod localization;
pub mod log_session;
