//! Layered configuration loading with figment.
//!
//! Sources, later ones winning:
//!
//! 1. [`FloofbotConfig::default`]
//! 2. values handed to [`ConfigLoader::merge`]
//! 3. the configuration file: the one given to [`ConfigLoader::file`], or
//!    the first `floofbot.yaml` / `floofbot.yml` in the search directories
//!    (the working directory, then `<user config dir>/floofbot`)
//! 4. the file's profile sibling, `floofbot.<profile>.yaml`, when a profile
//!    is selected with [`ConfigLoader::profile`] or `FLOOFBOT_PROFILE`
//! 5. `FLOOFBOT_*` environment variables, `__` separating nested keys:
//!    `FLOOFBOT_LOG__ROTATION=hourly` sets `log.rotation` and
//!    `FLOOFBOT_PLUGINS__GREETER__GREETING=hi` sets `plugins.greeter.greeting`
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .file("deploy/floofbot.yaml")
//!     .profile("production")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use tracing::{debug, info, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::FloofbotConfig;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "FLOOFBOT_";

/// Variable selecting the profile when none is set programmatically.
pub const PROFILE_VAR: &str = "FLOOFBOT_PROFILE";

const FILE_NAMES: &[&str] = &["floofbot.yaml", "floofbot.yml"];

pub struct ConfigLoader {
    overrides: Figment,
    profile: Option<String>,
    search_paths: Vec<PathBuf>,
    file: Option<PathBuf>,
    use_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: None,
            search_paths: Vec::new(),
            file: None,
            use_env: true,
        }
    }

    /// Selects a profile, taking precedence over `FLOOFBOT_PROFILE`.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Searches `dir` instead of the default directories. May be repeated.
    pub fn search_path<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.search_paths.push(dir.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file; a missing file is an error.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Ignores `FLOOFBOT_*` variables, including the profile selector.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Layers `config` between the built-in defaults and the file.
    pub fn merge(mut self, config: FloofbotConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Merges every source and extracts the result. Validation is left to
    /// [`validate_config`](super::validate_config).
    pub fn load(self) -> ConfigResult<FloofbotConfig> {
        let profile = self.active_profile();
        let located = self.locate()?;
        let mut figment =
            Figment::from(Serialized::defaults(FloofbotConfig::default())).merge(self.overrides);

        match located {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                figment = figment.merge(Yaml::file(&path));

                if let Some(profile) = &profile {
                    let sibling = profile_sibling(&path, profile);
                    if sibling.exists() {
                        debug!(path = %sibling.display(), profile = %profile, "Loading profile overrides");
                        figment = figment.merge(Yaml::file(sibling));
                    }
                }
            }
            None => warn!("No configuration file found, using defaults"),
        }

        if self.use_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["profile"]).split("__"));
        }

        let config: FloofbotConfig = figment.extract()?;
        debug!(
            profile = profile.as_deref().unwrap_or("none"),
            debug = config.debug,
            plugins = config.plugins.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn active_profile(&self) -> Option<String> {
        self.profile.clone().or_else(|| {
            self.use_env
                .then(|| std::env::var(PROFILE_VAR).ok())
                .flatten()
                .filter(|p| !p.is_empty())
        })
    }

    fn locate(&self) -> ConfigResult<Option<PathBuf>> {
        if let Some(file) = &self.file {
            return if file.is_file() {
                Ok(Some(file.clone()))
            } else {
                Err(ConfigError::NotFound(file.clone()))
            };
        }

        let dirs = if self.search_paths.is_empty() {
            default_search_paths()
        } else {
            self.search_paths.clone()
        };

        Ok(dirs
            .iter()
            .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file()))
    }
}

fn default_search_paths() -> Vec<PathBuf> {
    std::env::current_dir()
        .ok()
        .into_iter()
        .chain(dirs::config_dir().map(|dir| dir.join("floofbot")))
        .collect()
}

/// `conf/floofbot.yaml` + `prod` → `conf/floofbot.prod.yaml`.
fn profile_sibling(path: &Path, profile: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("floofbot");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");
    path.with_file_name(format!("{stem}.{profile}.{ext}"))
}
