use super::models::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.items.iter().any(|w| w.message.contains(needle))
    }
}

/// Non-fatal checks over a composed configuration.
pub fn apply_guard_rails(config: &Config) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();

    if config.database.url.is_none() {
        warnings.push_with_hint(
            "No database configured; manifests, locations and panic events are kept in memory",
            "Set DATABASE_URL or [database].url to persist data",
        );
    }

    if config.tracking.base_url.is_some() && config.tracking.api_key.is_none() {
        warnings.push_with_hint(
            "Tracking base URL is set without an API key; sync is disabled",
            "Set TRACKING_API_KEY or [tracking].api_key",
        );
    }

    if config.tracking.poll_interval_secs.is_some()
        && config.tracking.base_url.is_none()
    {
        warnings.push("Tracking poll interval is set but no tracking base URL is configured");
    }

    if config.notifications.gateway_url.is_none() {
        warnings.push_with_hint(
            "No SMS gateway configured; notifications will only be logged",
            "Set SMS_GATEWAY_URL or [notifications].gateway_url",
        );
    }

    if config.cors.is_wildcard_included() {
        warnings.push("CORS allows any origin");
    }

    warnings
}
