use fluent::{FluentArgs, FluentResource};
use fluent_bundle::bundle::FluentBundle;
use include_dir::{Dir, include_dir};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use unic_langid::LanguageIdentifier;

// We use the concurrent memoizer to ensure thread safety (Sync + Send)
type ConcurrentBundle = FluentBundle<FluentResource, intl_memoizer::concurrent::IntlLangMemoizer>;

// Embed the locales directory at compile time
static LOCALES_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/locales");

pub const FALLBACK_LOCALE: &str = "en-US";

#[derive(Debug, Deserialize)]
pub struct CommandLocale {
    pub name: Option<String>,
    pub desc: Option<String>,
    #[serde(default)]
    pub options: HashMap<String, OptionLocale>,
}

#[derive(Debug, Deserialize)]
pub struct OptionLocale {
    pub name: Option<String>,
    pub desc: Option<String>,
}

pub struct LocalizationManager {
    bundles: HashMap<LanguageIdentifier, ConcurrentBundle>,
    command_locales: HashMap<LanguageIdentifier, HashMap<String, CommandLocale>>,
    fallback: LanguageIdentifier,
}

impl LocalizationManager {
    pub fn new() -> Self {
        let mut bundles = HashMap::new();
        let mut command_locales = HashMap::new();

        for entry in LOCALES_DIR.dirs() {
            let locale_name = entry.path().to_string_lossy();

            let Ok(lang_id) = locale_name.parse::<LanguageIdentifier>() else {
                error!("Skipping locale directory with invalid name: {}", locale_name);
                continue;
            };

            let mut bundle = ConcurrentBundle::new_concurrent(vec![lang_id.clone()]);
            // Discord renders the isolation marks literally
            bundle.set_use_isolating(false);
            let mut commands = HashMap::new();

            for file in entry.files() {
                let path = file.path();
                let extension = path.extension().and_then(|e| e.to_str());
                let file_name = path.file_name().and_then(|n| n.to_str());
                let Some(content) = file.contents_utf8() else {
                    continue;
                };

                if extension == Some("ftl") {
                    match FluentResource::try_new(content.to_string()) {
                        Ok(resource) => {
                            if let Err(errors) = bundle.add_resource(resource) {
                                for err in errors {
                                    error!("Error adding resource for {}: {:?}", locale_name, err);
                                }
                            }
                        }
                        Err((_, errors)) => {
                            for err in errors {
                                error!("Error parsing resource for {}: {:?}", locale_name, err);
                            }
                        }
                    }
                } else if matches!(file_name, Some("commands.yaml") | Some("commands.yml")) {
                    match serde_yaml::from_str::<HashMap<String, CommandLocale>>(content) {
                        Ok(yaml_commands) => commands.extend(yaml_commands),
                        Err(err) => {
                            error!("Error parsing commands.yaml for {}: {:?}", locale_name, err);
                        }
                    }
                }
            }

            info!("Loaded embedded locale: {}", locale_name);
            bundles.insert(lang_id.clone(), bundle);
            command_locales.insert(lang_id, commands);
        }

        Self {
            bundles,
            command_locales,
            fallback: FALLBACK_LOCALE
                .parse()
                .unwrap_or_else(|_| LanguageIdentifier::default()),
        }
    }

    pub fn get_proxy(self: &Arc<Self>, locale: &str) -> L10nProxy {
        L10nProxy {
            manager: self.clone(),
            locale: locale.to_string(),
        }
    }

    fn format(
        &self,
        lang_id: &LanguageIdentifier,
        key: &str,
        args: Option<&FluentArgs>,
    ) -> Option<String> {
        let bundle = self.bundles.get(lang_id)?;
        let pattern = bundle.get_message(key)?.value()?;
        let mut errors = vec![];
        let text = bundle.format_pattern(pattern, args, &mut errors).into_owned();
        if !errors.is_empty() {
            error!("Errors formatting {} for {}: {:?}", key, lang_id, errors);
        }
        Some(text)
    }

    /// Looks `key` up in `locale`, then in en-US, then gives back the key itself.
    pub fn translate(&self, locale: &str, key: &str, args: Option<&FluentArgs>) -> String {
        let lang_id = locale
            .parse::<LanguageIdentifier>()
            .unwrap_or_else(|_| self.fallback.clone());

        self.format(&lang_id, key, args)
            .or_else(|| {
                (lang_id != self.fallback)
                    .then(|| self.format(&self.fallback, key, args))
                    .flatten()
            })
            .unwrap_or_else(|| key.to_string())
    }

    pub fn apply_translations<U, E>(&self, commands: &mut [poise::Command<U, E>]) {
        for (lang_id, locales) in &self.command_locales {
            let locale_str = lang_id.to_string();

            for cmd in commands.iter_mut() {
                self.apply_to_command(cmd, locales, &locale_str);
            }
        }
    }

    fn apply_to_command<U, E>(
        &self,
        cmd: &mut poise::Command<U, E>,
        locales: &HashMap<String, CommandLocale>,
        locale_str: &str,
    ) {
        // Look up by the source name; the en-US pass may rename the command
        let Some(loc) = locales.get(cmd.identifying_name.as_str()) else {
            return;
        };

        if let Some(name) = &loc.name {
            cmd.name_localizations
                .insert(locale_str.to_string(), name.clone());
            if locale_str == FALLBACK_LOCALE {
                cmd.name = name.clone();
            }
        }
        if let Some(desc) = &loc.desc {
            cmd.description_localizations
                .insert(locale_str.to_string(), desc.clone());
            if locale_str == FALLBACK_LOCALE {
                cmd.description = Some(desc.clone());
            }
        }

        for param in cmd.parameters.iter_mut() {
            let Some(opt_loc) = loc.options.get(param.name.as_str()) else {
                continue;
            };
            if let Some(name) = &opt_loc.name {
                param
                    .name_localizations
                    .insert(locale_str.to_string(), name.clone());
            }
            if let Some(desc) = &opt_loc.desc {
                param
                    .description_localizations
                    .insert(locale_str.to_string(), desc.clone());
                if locale_str == FALLBACK_LOCALE {
                    param.description = Some(desc.clone());
                }
            }
        }
    }
}

/// A proxy for translation that holds a reference to the manager and a specific locale
#[derive(Clone)]
pub struct L10nProxy {
    pub manager: Arc<LocalizationManager>,
    pub locale: String,
}

impl L10nProxy {
    pub fn t(&self, key: &str, args: Option<&FluentArgs>) -> String {
        self.manager.translate(&self.locale, key, args)
    }
}

/// Helper trait to add localization to the Poise context
pub trait ContextL10nExt {
    fn l10n_guild(&self) -> L10nProxy;
    fn l10n_user(&self) -> L10nProxy;
}

impl ContextL10nExt for crate::Context<'_> {
    fn l10n_guild(&self) -> L10nProxy {
        let manager = self.data().l10n.clone();
        let locale = self
            .guild()
            .map(|guild| guild.preferred_locale.clone())
            .or_else(|| self.locale().map(str::to_string))
            .unwrap_or_else(|| FALLBACK_LOCALE.to_string());
        L10nProxy { manager, locale }
    }

    fn l10n_user(&self) -> L10nProxy {
        match self.locale() {
            Some(locale) => L10nProxy {
                manager: self.data().l10n.clone(),
                locale: locale.to_string(),
            },
            None => self.l10n_guild(),
        }
    }
}
