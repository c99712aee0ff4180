//! Process-level configuration read from the environment.

use crate::profiling::ProfilingBackend;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "GLYPHFIELD_LOG";
/// Environment variable selecting the profiling mode (`off`, `on`, `http`).
pub const PROFILE_ENV: &str = "GLYPHFIELD_PROFILE";

/// Configurations for glyphfield tools and demos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Explicit log filter; `None` defers to `RUST_LOG` / the default filter.
    pub log_filter: Option<String>,
    pub profiling: ProfilingMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfilingMode {
    /// Profiling is disabled
    #[default]
    Off,
    /// Scopes are recorded in-process
    On,
    /// Scopes are recorded and served to `puffin_viewer`
    WithWebserver,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_filter: None,
            profiling: ProfilingMode::Off,
        }
    }
}

impl ProfilingMode {
    /// Parse a mode name; unknown values map to `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "off" | "false" => Some(Self::Off),
            "1" | "on" | "true" => Some(Self::On),
            "http" | "web" | "webserver" => Some(Self::WithWebserver),
            _ => None,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_filter = lookup(LOG_ENV).filter(|f| !f.trim().is_empty());
        let profiling = match lookup(PROFILE_ENV) {
            Some(value) => ProfilingMode::parse(&value).unwrap_or_else(|| {
                tracing::warn!("Ignoring unknown {} value: {:?}", PROFILE_ENV, value);
                ProfilingMode::Off
            }),
            None => ProfilingMode::Off,
        };

        Config {
            log_filter,
            profiling,
        }
    }

    /// Install logging and profiling according to this configuration.
    pub fn apply(&self) {
        match &self.log_filter {
            Some(filter) => {
                crate::logging::init_with_filter(filter);
            }
            None => crate::logging::init(),
        }

        match self.profiling {
            ProfilingMode::Off => {}
            ProfilingMode::On => crate::profiling::init_profiling(ProfilingBackend::InProcess),
            #[cfg(feature = "profiling")]
            ProfilingMode::WithWebserver => {
                crate::profiling::init_profiling(ProfilingBackend::PuffinHttp)
            }
            #[cfg(not(feature = "profiling"))]
            ProfilingMode::WithWebserver => {
                tracing::warn!("Built without the `profiling` feature, recording in-process only");
                crate::profiling::init_profiling(ProfilingBackend::InProcess)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.log_filter, None);
        assert_eq!(config.profiling, ProfilingMode::Off);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = Config::from_lookup(|key| match key {
            LOG_ENV => Some("debug,wgpu_core=warn".to_string()),
            PROFILE_ENV => Some("HTTP".to_string()),
            _ => None,
        });
        assert_eq!(config.log_filter.as_deref(), Some("debug,wgpu_core=warn"));
        assert_eq!(config.profiling, ProfilingMode::WithWebserver);
    }

    #[test]
    fn test_config_blank_and_unknown_values() {
        let config = Config::from_lookup(|key| match key {
            LOG_ENV => Some("   ".to_string()),
            PROFILE_ENV => Some("sometimes".to_string()),
            _ => None,
        });
        assert_eq!(config.log_filter, None);
        assert_eq!(config.profiling, ProfilingMode::Off);
    }

    #[test]
    fn test_profiling_mode_parse() {
        assert_eq!(ProfilingMode::parse("on"), Some(ProfilingMode::On));
        assert_eq!(ProfilingMode::parse("0"), Some(ProfilingMode::Off));
        assert_eq!(ProfilingMode::parse("nope"), None);
    }
}
