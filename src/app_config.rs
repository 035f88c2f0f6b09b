//! Settings for the course service.
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults
//! 2. `config.toml` in the working directory, if present
//! 3. `COURSEAPP_<SECTION>__<KEY>` environment variables
//!
//! `DATABASE_URL` and `SALT` are secrets and stay in the environment.

use config::{Config, ConfigError, Environment, File, FileFormat};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

const CONFIG_PATH: &str = "config.toml";

static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    let config = AppConfig::load_from_path(CONFIG_PATH).unwrap_or_else(|e| {
        log::warn!("Invalid configuration, falling back to defaults: {}", e);
        AppConfig::default()
    });
    RwLock::new(config)
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Shown on the admin pages.
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Course App".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// 0 lets actix start one worker per core.
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_owned(),
            workers: 0,
        }
    }
}

/// Where course, lesson and avatar images live and the URL they are served at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub url_prefix: String,
    pub root: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            url_prefix: "/static".to_owned(),
            root: "static".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub token_lifetime_minutes: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        // One day.
        Self {
            token_lifetime_minutes: 24 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub courses_per_page: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            courses_per_page: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub server: ServerConfig,
    pub media: MediaConfig,
    pub security: SecurityConfig,
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Layers defaults, the TOML file at `path` (optional) and the environment.
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("COURSEAPP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

/// Forces the first load so problems show up in the startup log.
pub fn init() {
    let config = get_config();
    log::info!(
        "Serving {} on {} (media {} from {})",
        config.site.name,
        config.server.bind,
        config.media.url_prefix,
        config.media.root
    );
}

/// Snapshot of the current settings.
pub fn get_config() -> AppConfig {
    APP_CONFIG
        .read()
        .map(|config| config.clone())
        .unwrap_or_default()
}

macro_rules! section {
    ($name:ident, $ty:ty) => {
        pub fn $name() -> $ty {
            get_config().$name
        }
    };
}

section!(site, SiteConfig);
section!(server, ServerConfig);
section!(media, MediaConfig);
section!(security, SecurityConfig);
section!(limits, LimitsConfig);

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.site.name, "Course App");
        assert_eq!(config.media.url_prefix, "/static");
        assert_eq!(config.security.token_lifetime_minutes, 1440);
        assert_eq!(config.limits.courses_per_page, 20);
        assert_eq!(config.server.workers, 0);
    }

    #[test]
    fn test_file_overrides_some_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[site]
name = "Test Courses"

[media]
url_prefix = "/media"

[limits]
courses_per_page = 5
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.site.name, "Test Courses");
        assert_eq!(config.media.url_prefix, "/media");
        assert_eq!(config.limits.courses_per_page, 5);
        // untouched keys keep their defaults
        assert_eq!(config.media.root, "static");
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let config = AppConfig::load_from_path("/nonexistent/config.toml").unwrap();
        assert_eq!(config.limits.courses_per_page, 20);
    }

    #[test]
    fn test_bad_value_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[limits]\ncourses_per_page = \"many\"").unwrap();
        assert!(AppConfig::load_from_path(file.path().to_str().unwrap()).is_err());
    }
}
