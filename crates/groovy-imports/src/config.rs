use anyhow::{Context, Result};
use indexmap::IndexSet;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::combine::Combine;
use crate::dirs::{CONFIG_FILE_NAME, system_config_file, user_config_file};
use crate::unused_import_trimmer::TrimConfig;

/// Extensions scanned when a directory is given on the command line.
pub const DEFAULT_EXTENSIONS: [&str; 5] = ["groovy", "gradle", "gvy", "gy", "gsh"];

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Import paths (or `prefix.*` patterns) that are never removed
    pub preserve: IndexSet<String>,

    /// Keep `import static a.B.*` even when nothing seems to use it
    pub preserve_static_wildcards: bool,

    /// Keep imports that carry annotations such as `@Grab`
    pub preserve_annotated_imports: bool,

    /// File extensions processed when walking directories
    pub extensions: IndexSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preserve: IndexSet::new(),
            preserve_static_wildcards: true,
            preserve_annotated_imports: true,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_owned()).collect(),
        }
    }
}

/// One configuration layer: a config file or the environment. Unset keys
/// fall through to lower precedence layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options {
    pub preserve: Option<IndexSet<String>>,
    pub preserve_static_wildcards: Option<bool>,
    pub preserve_annotated_imports: Option<bool>,
    pub extensions: Option<IndexSet<String>>,
}

impl Combine for Options {
    fn combine(self, other: Self) -> Self {
        Self {
            // Allow-lists from every layer apply
            preserve: self.preserve.combine(other.preserve),
            preserve_static_wildcards: self
                .preserve_static_wildcards
                .combine(other.preserve_static_wildcards),
            preserve_annotated_imports: self
                .preserve_annotated_imports
                .combine(other.preserve_annotated_imports),
            // A layer that lists extensions replaces the lower ones
            extensions: self.extensions.or(other.extensions),
        }
    }
}

impl Options {
    /// Load configuration from environment variables with the
    /// `GROOVY_IMPORTS_` prefix
    pub fn from_env() -> Self {
        let mut options = Self::default();

        // GROOVY_IMPORTS_PRESERVE - comma-separated list of import paths
        if let Ok(value) = env::var("GROOVY_IMPORTS_PRESERVE") {
            options.preserve = parse_list(&value);
        }

        if let Ok(value) = env::var("GROOVY_IMPORTS_PRESERVE_STATIC_WILDCARDS") {
            options.preserve_static_wildcards =
                parse_env_bool("GROOVY_IMPORTS_PRESERVE_STATIC_WILDCARDS", &value);
        }

        if let Ok(value) = env::var("GROOVY_IMPORTS_PRESERVE_ANNOTATED_IMPORTS") {
            options.preserve_annotated_imports =
                parse_env_bool("GROOVY_IMPORTS_PRESERVE_ANNOTATED_IMPORTS", &value);
        }

        // GROOVY_IMPORTS_EXTENSIONS - comma-separated, leading dots allowed
        if let Ok(value) = env::var("GROOVY_IMPORTS_EXTENSIONS") {
            options.extensions = parse_list(&value).map(|extensions| {
                extensions
                    .into_iter()
                    .map(|e| e.trim_start_matches('.').to_owned())
                    .collect()
            });
        }

        options
    }

    /// Load a single config file from a path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Fill unset keys from the defaults.
    pub fn resolve(self) -> Config {
        let defaults = Config::default();
        Config {
            preserve: self.preserve.unwrap_or(defaults.preserve),
            preserve_static_wildcards: self
                .preserve_static_wildcards
                .unwrap_or(defaults.preserve_static_wildcards),
            preserve_annotated_imports: self
                .preserve_annotated_imports
                .unwrap_or(defaults.preserve_annotated_imports),
            extensions: self.extensions.unwrap_or(defaults.extensions),
        }
    }
}

fn parse_list(value: &str) -> Option<IndexSet<String>> {
    let items: IndexSet<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    (!items.is_empty()).then_some(items)
}

/// Parse a boolean value from string, supporting various common formats
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_env_bool(name: &str, value: &str) -> Option<bool> {
    let parsed = parse_bool(value);
    if parsed.is_none() {
        log::warn!("Ignoring {name}={value:?}: expected a boolean");
    }
    parsed
}

impl Config {
    /// Load configuration with hierarchical precedence:
    /// 1. CLI-provided config path (highest precedence)
    /// 2. Environment variables (GROOVY_IMPORTS_*)
    /// 3. Project config (groovy-imports.toml in current directory)
    /// 4. User config (~/.config/groovy-imports/groovy-imports.toml)
    /// 5. System config (/etc/groovy-imports/groovy-imports.toml or equivalent)
    /// 6. Default values (lowest precedence)
    pub fn load(cli_config_path: Option<&Path>) -> Result<Self> {
        let mut options = Options::default();

        if let Some(system_config_path) = system_config_file() {
            log::debug!("Loading system config from: {}", system_config_path.display());
            let system = Options::load_from_file(&system_config_path)
                .context("Failed to load system config")?;
            options = system.combine(options);
        }

        if let Some(user_config_path) = user_config_file() {
            log::debug!("Loading user config from: {}", user_config_path.display());
            let user = Options::load_from_file(&user_config_path)
                .context("Failed to load user config")?;
            options = user.combine(options);
        }

        let project_config_path = PathBuf::from(CONFIG_FILE_NAME);
        if project_config_path.exists() {
            log::debug!("Loading project config from: {}", project_config_path.display());
            let project = Options::load_from_file(&project_config_path)
                .context("Failed to load project config")?;
            options = project.combine(options);
        }

        options = Options::from_env().combine(options);

        if let Some(cli_config_path) = cli_config_path {
            log::debug!("Loading CLI config from: {}", cli_config_path.display());
            let cli = Options::load_from_file(cli_config_path)
                .context("Failed to load CLI config")?;
            options = cli.combine(options);
        }

        Ok(options.resolve())
    }

    /// The engine configuration described by this config.
    pub fn trim_config(&self) -> TrimConfig {
        TrimConfig {
            preserve: self.preserve.iter().cloned().collect(),
            preserve_static_wildcards: self.preserve_static_wildcards,
            preserve_annotated_imports: self.preserve_annotated_imports,
        }
    }

    /// Whether `path` has one of the configured extensions.
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.contains(e))
    }
}
