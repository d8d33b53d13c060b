use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Namespace the built-in sample handlers live in
pub const DEFAULT_HANDLER_NAMESPACE: &str = "devtools.demo.handlers";

/// Main devtools configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    pub devtools: DevToolsConfig,
}

/// Log verbosity when RUST_LOG is not set
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevToolsConfig {
    /// Master switch for the plugin
    pub enabled: bool,
    /// Namespaces scanned for handler types
    pub handler_namespaces: Vec<String>,
    /// Event names never subscribed to
    pub disabled_logging_events: HashSet<String>,
    /// Fully-qualified type names whose values are never expanded
    pub disabled_logging_class_name_for_nest: HashSet<String>,
    /// Install instrumentation patches on activation
    pub instrumentation: bool,
}

impl Default for DevToolsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            handler_namespaces: vec![DEFAULT_HANDLER_NAMESPACE.to_string()],
            disabled_logging_events: HashSet::new(),
            disabled_logging_class_name_for_nest: HashSet::new(),
            instrumentation: true,
        }
    }
}

impl DevToolsConfig {
    /// Snapshot of both exclusion sets for one activation cycle
    pub fn exclusions(&self) -> Exclusions {
        Exclusions {
            events: self.disabled_logging_events.clone(),
            nested_types: self.disabled_logging_class_name_for_nest.clone(),
        }
    }
}

/// Exclusion sets, immutable for the duration of an activation cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    pub events: HashSet<String>,
    pub nested_types: HashSet<String>,
}

impl Exclusions {
    pub fn skips_event(&self, name: &str) -> bool {
        self.events.contains(name)
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            let path = Self::expand_path(path);
            return Self::load_from_file(&path).context(format!("Failed to load config from {}", path.display()));
        }

        // Check DEVTOOLS_CONFIG env var
        if let Ok(env_path) = std::env::var("DEVTOOLS_CONFIG") {
            let path = Self::expand_path(Path::new(&env_path));
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from DEVTOOLS_CONFIG: {}", e);
                    }
                }
            }
        }

        // Try DEVTOOLS_DIR/devtools.yaml, then ~/.config/devtools/devtools.yaml
        let path = Self::devtools_dir().join("devtools.yaml");
        if path.exists() {
            match Self::load_from_file(&path) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }

        // Try ./devtools.yaml (for development)
        let local_config = PathBuf::from("devtools.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Directory holding devtools.yaml
    pub fn devtools_dir() -> PathBuf {
        std::env::var("DEVTOOLS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("devtools"))
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}
