//! Configuration for the generic type engine.
//!
//! ```toml
//! [model]
//! include_minimal_jdk = true
//! files = ["models/api.json"]
//! simple_types = ["com.example.Money"]
//! cache_class_types = true
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Once, OnceLock};

use apigw_generic::{ClassRegistry, TypeError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;

mod diagnostics;
mod schema;

pub use diagnostics::{ConfigDiagnostics, ConfigWarning};
pub use schema::json_schema;

/// Conventional file name of the engine configuration.
pub const CONFIG_FILE_NAME: &str = "apigw-generic.toml";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct GenericsConfig {
    /// Where class declarations come from.
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct ModelConfig {
    /// Seed the registry with the platform classes (`java.lang.Object`, collections, boxes, ...).
    #[serde(default = "ModelConfig::default_include_minimal_jdk")]
    pub include_minimal_jdk: bool,

    /// JSON files holding arrays of class models, loaded in order. Relative paths are resolved
    /// against the directory of the config file.
    #[serde(default)]
    #[schemars(with = "Vec<String>")]
    pub files: Vec<PathBuf>,

    /// Binary names of additional classes treated as simple (leaf) types.
    #[serde(default)]
    pub simple_types: Vec<String>,

    /// Memoise class types. Never changes results.
    #[serde(default)]
    pub cache_class_types: bool,
}

impl ModelConfig {
    fn default_include_minimal_jdk() -> bool {
        true
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            include_minimal_jdk: Self::default_include_minimal_jdk(),
            files: Vec::new(),
            simple_types: Vec::new(),
            cache_class_types: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective filter: the configured directives, merged with `RUST_LOG` when it is set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("failed to load class models from {path}: {source}")]
    Model {
        path: String,
        #[source]
        source: TypeError,
    },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` carries a source snippet; keep only the message.
        ConfigError::Toml(sanitize_toml_error_message(err.message()))
    }
}

fn sanitize_toml_error_message(message: &str) -> String {
    static QUOTED_STRING_RE: OnceLock<Option<regex::Regex>> = OnceLock::new();

    let re = QUOTED_STRING_RE.get_or_init(|| regex::Regex::new(r#""(?:\\.|[^"\\])*""#).ok());
    let mut out = match re {
        Some(re) => re.replace_all(message, r#""<redacted>""#).into_owned(),
        None => message.to_owned(),
    };

    // Scalars quoted with backticks are user input in `invalid type/value` messages; field
    // names in `missing field` messages are not.
    if out.contains("invalid type:") || out.contains("invalid value:") {
        let boundary = out.find(", expected").unwrap_or(out.len());
        if let Some(start) = out[..boundary].find('`') {
            if let Some(end_rel) = out[start + 1..boundary].rfind('`') {
                let end = start + 1 + end_rel;
                out.replace_range(start + 1..end, "<redacted>");
            }
        }
    }
    out
}

impl GenericsConfig {
    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read_file(path)?;
        Self::load_from_str(&text)
    }

    /// Parse a config from TOML text.
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Parse a config and report unknown keys and recoverable problems.
    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<GenericsConfig>(text)?;
        let diagnostics = ConfigDiagnostics {
            unknown_keys,
            warnings: config.validate(),
        };
        Ok((config, diagnostics))
    }

    fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let level = LoggingConfig::normalize_level_directives(&self.logging.level);
        if tracing_subscriber::EnvFilter::try_new(&level).is_err() {
            warnings.push(ConfigWarning::LoggingLevelInvalid {
                value: self.logging.level.clone(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for file in &self.model.files {
            if !seen.insert(file) {
                warnings.push(ConfigWarning::DuplicateModelFile {
                    path: file.display().to_string(),
                });
            }
        }

        for (index, name) in self.model.simple_types.iter().enumerate() {
            if name.trim().is_empty() {
                warnings.push(ConfigWarning::EmptySimpleTypeName { index });
            }
        }
        warnings
    }

    /// Build a registry from the model section. Relative model files are resolved against
    /// `base_dir`.
    ///
    /// Simple-type names that do not name a defined class are logged and skipped.
    pub fn build_registry(&self, base_dir: impl AsRef<Path>) -> Result<ClassRegistry, ConfigError> {
        let base_dir = base_dir.as_ref();
        let mut registry = if self.model.include_minimal_jdk {
            ClassRegistry::with_minimal_jdk()
        } else {
            ClassRegistry::new()
        };

        for file in &self.model.files {
            let path = if file.is_absolute() {
                file.clone()
            } else {
                base_dir.join(file)
            };
            let text = read_file(&path)?;
            let ids = registry
                .load_json(&text)
                .map_err(|source| ConfigError::Model {
                    path: path.display().to_string(),
                    source,
                })?;
            tracing::debug!(
                target = "apigw.config",
                path = %path.display(),
                classes = ids.len(),
                "loaded model file"
            );
        }

        for name in &self.model.simple_types {
            match registry
                .class_id(name)
                .filter(|id| registry.is_defined(*id))
            {
                Some(id) => registry.mark_simple_class(id),
                None => tracing::warn!(
                    target = "apigw.config",
                    class = %name,
                    "ignoring simple type that names no defined class"
                ),
            }
        }

        registry.set_cache_enabled(self.model.cache_class_types);
        Ok(registry)
    }
}

/// Load the config at `path` and build its registry, resolving model files next to it.
pub fn load_registry(path: impl AsRef<Path>) -> Result<(GenericsConfig, ClassRegistry), ConfigError> {
    let path = path.as_ref();
    let config = GenericsConfig::load_from_path(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let registry = config.build_registry(base_dir)?;
    Ok((config, registry))
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

static TRACING_INIT: Once = Once::new();

/// Install a global `tracing` subscriber writing to stderr.
///
/// Only the first call has an effect. A subscriber installed by someone else is left alone.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();

        // `cargo test` only captures output written through the stdlib print macros.
        let writer = if cfg!(debug_assertions) {
            BoxMakeWriter::new(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
        } else {
            BoxMakeWriter::new(std::io::stderr)
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(true);
        let result = if config.json {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        };
        if result.is_err() {
            tracing::debug!(
                target = "apigw.config",
                "global tracing subscriber already installed"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_synonyms_are_normalized() {
        assert_eq!(LoggingConfig::normalize_level_directives(" WARNING "), "warn");
        assert_eq!(LoggingConfig::normalize_level_directives(""), "info");
        assert_eq!(
            LoggingConfig::normalize_level_directives("apigw.generic=trace"),
            "apigw.generic=trace"
        );
    }

    #[test]
    fn toml_errors_do_not_echo_string_values() {
        let err = GenericsConfig::load_from_str(
            r#"
[logging]
json = "secret-value"
"#,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(!message.contains("secret-value"), "{message}");
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
