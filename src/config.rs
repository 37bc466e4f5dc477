use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::search::registry::SearchConfigRegistry;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// MongoDB connection string. The bare `MONGODB_URI` variable wins.
    pub mongodb_uri: String,

    #[serde(default)]
    pub environment: Environment,

    /// Enable the built-in demo accounts.
    #[serde(default)]
    pub demo_mode: bool,

    /// Insert sample documents into empty collections at startup.
    #[serde(default)]
    pub seed_demo_data: bool,

    /// Create the Atlas Search index of every config at startup.
    #[serde(default)]
    pub ensure_search_indexes: bool,

    /// Config type preselected by the UI.
    pub default_config_type: String,

    /// Secret the session cookie is signed with. At least 64 bytes.
    pub session_secret: String,
}

/// Minimum secret length accepted by the cookie signing key.
const MIN_SESSION_SECRET_LEN: usize = 64;

/// Prefix of the secret shipped in the built-in defaults.
const DEV_SESSION_SECRET_PREFIX: &str = "dossier-development-only";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl AppConfig {
    /// Load configuration from the built-in defaults, an optional file and
    /// the environment.
    ///
    /// Without an explicit `path`, `config/dossier.toml` is read if present.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config/dossier").required(false),
        };

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/dossier.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("DOSSIER")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(uri) = std::env::var("MONGODB_URI") {
            builder = builder.set_override("mongodb_uri", uri)?;
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate(SearchConfigRegistry::builtin())?;
        Ok(config)
    }

    pub fn validate(&self, registry: &SearchConfigRegistry) -> Result<(), config::ConfigError> {
        if self.mongodb_uri.trim().is_empty() {
            return Err(config::ConfigError::Message("mongodb_uri must not be empty".into()));
        }
        if self.session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(config::ConfigError::Message(format!(
                "session_secret must be at least {MIN_SESSION_SECRET_LEN} bytes"
            )));
        }
        if self.is_production() && self.session_secret.starts_with(DEV_SESSION_SECRET_PREFIX) {
            return Err(config::ConfigError::Message(
                "session_secret must be replaced in production".into(),
            ));
        }
        if registry.get(&self.default_config_type).is_none() {
            return Err(config::ConfigError::Message(format!(
                "default_config_type '{}' is not a registered config (known: {})",
                self.default_config_type,
                registry.config_types().join(", ")
            )));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Signing key for the session cookie.
    pub fn session_key(&self) -> Result<axum_extra::extract::cookie::Key, config::ConfigError> {
        axum_extra::extract::cookie::Key::try_from(self.session_secret.as_bytes())
            .map_err(|e| config::ConfigError::Message(format!("invalid session_secret: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> AppConfig {
        AppConfig {
            mongodb_uri: "mongodb://localhost:27017".into(),
            environment: Environment::Development,
            demo_mode: true,
            seed_demo_data: false,
            ensure_search_indexes: false,
            default_config_type: "princesofindia".into(),
            session_secret: "s".repeat(MIN_SESSION_SECRET_LEN),
        }
    }

    #[test]
    fn test_validate_accepts_registered_default() {
        assert!(sample().validate(SearchConfigRegistry::builtin()).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_default() {
        let config = AppConfig {
            default_config_type: "nope".into(),
            ..sample()
        };
        let err = config.validate(SearchConfigRegistry::builtin()).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_validate_rejects_empty_uri() {
        let config = AppConfig {
            mongodb_uri: "  ".into(),
            ..sample()
        };
        assert!(config.validate(SearchConfigRegistry::builtin()).is_err());
    }

    #[test]
    fn test_validate_rejects_short_session_secret() {
        let config = AppConfig {
            session_secret: "too-short".into(),
            ..sample()
        };
        let err = config.validate(SearchConfigRegistry::builtin()).unwrap_err();
        assert!(err.to_string().contains("session_secret"));
    }

    #[test]
    fn test_validate_rejects_dev_secret_in_production() {
        let defaults = AppConfig::load(None).unwrap();
        assert!(defaults.session_secret.starts_with(DEV_SESSION_SECRET_PREFIX));

        let config = AppConfig {
            environment: Environment::Production,
            ..defaults
        };
        assert!(config.validate(SearchConfigRegistry::builtin()).is_err());
    }

    #[test]
    fn test_session_key_from_secret() {
        let a = sample().session_key().unwrap();
        let b = sample().session_key().unwrap();
        assert_eq!(a.master(), b.master());
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("dossier-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "environment = \"production\"").unwrap();
        writeln!(file, "session_secret = \"{}\"", "p".repeat(80)).unwrap();
        writeln!(file, "default_config_type = \"mongodbExamples\"").unwrap();
        writeln!(file, "seed_demo_data = true").unwrap();
        drop(file);

        let config = AppConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(config.is_production());
        assert!(config.seed_demo_data);
        assert_eq!(config.default_config_type, "mongodbExamples");
        assert!(config.demo_mode);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("dossier-does-not-exist.toml");
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_environment_parses_lowercase() {
        let env: Environment = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(env, Environment::Production);
    }
}
