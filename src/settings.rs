use crate::services::log_session::{DEFAULT_IDLE_SECS, DEFAULT_PAGE_SIZE};
use anyhow::{Context as _, bail};
use poise::serenity_prelude as serenity;
use std::time::Duration;

const DEFAULT_SWEEP_SECS: u64 = 10;

/// Runtime configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub guild_id: serenity::GuildId,
    pub jail_role_id: serenity::RoleId,
    pub report_channel_id: serenity::ChannelId,
    /// When set, only members holding this role may use the jail commands.
    pub admin_role_id: Option<serenity::RoleId>,
    pub sweep_interval: Duration,
    pub log_page_size: usize,
    pub log_session_idle: chrono::Duration,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| -> anyhow::Result<String> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                _ => bail!("{key} must be set"),
            }
        };
        let snowflake = |key: &str| -> anyhow::Result<u64> {
            let raw = required(key)?;
            let id: u64 = raw
                .parse()
                .with_context(|| format!("{key} must be a numeric Discord id, got {raw:?}"))?;
            if id == 0 {
                bail!("{key} must not be 0");
            }
            Ok(id)
        };
        let optional_number = |key: &str, default: u64| -> anyhow::Result<u64> {
            match lookup(key).filter(|v| !v.trim().is_empty()) {
                Some(raw) => {
                    let value: u64 = raw
                        .trim()
                        .parse()
                        .with_context(|| format!("{key} must be a positive integer, got {raw:?}"))?;
                    if value == 0 {
                        bail!("{key} must be greater than 0");
                    }
                    Ok(value)
                }
                None => Ok(default),
            }
        };

        let admin_role_id = match lookup("ADMIN_ROLE_ID").filter(|v| !v.trim().is_empty()) {
            Some(_) => Some(serenity::RoleId::new(snowflake("ADMIN_ROLE_ID")?)),
            None => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            guild_id: serenity::GuildId::new(snowflake("GUILD_ID")?),
            jail_role_id: serenity::RoleId::new(snowflake("JAIL_ROLE_ID")?),
            report_channel_id: serenity::ChannelId::new(snowflake("JAIL_REPORT_CHANNEL_ID")?),
            admin_role_id,
            sweep_interval: Duration::from_secs(optional_number(
                "JAIL_SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_SECS,
            )?),
            log_page_size: optional_number("JAIL_LOG_PAGE_SIZE", DEFAULT_PAGE_SIZE as u64)?
                as usize,
            log_session_idle: chrono::Duration::seconds(optional_number(
                "JAIL_LOG_SESSION_IDLE_SECS",
                DEFAULT_IDLE_SECS as u64,
            )? as i64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> HashMap<String, String> {
        env(&[
            ("DATABASE_URL", "sqlite://jail.db?mode=rwc"),
            ("GUILD_ID", "100"),
            ("JAIL_ROLE_ID", "7"),
            ("JAIL_REPORT_CHANNEL_ID", "55"),
        ])
    }

    #[test]
    fn defaults_apply_when_optional_values_are_missing() {
        let vars = base();
        let settings = Settings::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(settings.guild_id, serenity::GuildId::new(100));
        assert_eq!(settings.admin_role_id, None);
        assert_eq!(settings.sweep_interval, Duration::from_secs(10));
        assert_eq!(settings.log_page_size, 5);
        assert_eq!(settings.log_session_idle, chrono::Duration::seconds(60));
    }

    #[test]
    fn optional_values_override_defaults() {
        let mut vars = base();
        vars.extend(env(&[
            ("ADMIN_ROLE_ID", "42"),
            ("JAIL_SWEEP_INTERVAL_SECS", "30"),
            ("JAIL_LOG_PAGE_SIZE", "10"),
        ]));
        let settings = Settings::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(settings.admin_role_id, Some(serenity::RoleId::new(42)));
        assert_eq!(settings.sweep_interval, Duration::from_secs(30));
        assert_eq!(settings.log_page_size, 10);
    }

    #[test]
    fn missing_or_malformed_ids_name_the_variable() {
        let mut vars = base();
        vars.remove("JAIL_ROLE_ID");
        let err = Settings::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("JAIL_ROLE_ID"));

        let mut vars = base();
        vars.insert("GUILD_ID".to_string(), "abc".to_string());
        let err = Settings::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("GUILD_ID"));

        let mut vars = base();
        vars.insert("JAIL_LOG_PAGE_SIZE".to_string(), "0".to_string());
        assert!(Settings::from_lookup(|k| vars.get(k).cloned()).is_err());
    }
}
