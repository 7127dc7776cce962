//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/exprtree/exprtree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `EXPRTREE_*` prefix, `__` between sections
//!    (e.g. `EXPRTREE_IDS__STRATEGY=uuid`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, IdStrategy};
use crate::domain::UnknownTargetPolicy;

/// Labels given to nodes created by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LabelSettings {
    /// Label of the root operator of a fresh tree
    pub root: String,
    pub criteria: String,
    pub operator: String,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            root: "Root".into(),
            criteria: "New Criteria".into(),
            operator: "New Operator".into(),
        }
    }
}

/// Identifier generation for new nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdSettings {
    pub strategy: IdStrategy,
    /// Prepended to every generated id
    pub prefix: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MoveSettings {
    /// What a move onto a non-existent target does
    pub unknown_target: UnknownTargetPolicy,
}

/// Unified configuration for exprtree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub labels: LabelSettings,
    pub ids: IdSettings,
    pub moves: MoveSettings,
}

/// Get the XDG config directory for exprtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "exprtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("exprtree.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - Optional config file layered over the global one; must exist
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), explicit)
    }

    /// Same as [`Settings::load`] with the global config location given.
    ///
    /// A missing global file is skipped, a missing explicit file is an error.
    pub fn load_from(global: Option<&Path>, explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_err)?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(global_path) = global {
            debug!("global config: {}", global_path.display());
            builder = builder.add_source(
                File::from(global_path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        if let Some(explicit_path) = explicit {
            debug!("explicit config: {}", explicit_path.display());
            builder = builder.add_source(
                File::from(explicit_path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("EXPRTREE")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build().map_err(config_err)?;
        config.try_deserialize().map_err(config_err)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# exprtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/exprtree/exprtree.toml
#   Explicit: --config <file>
#   Env:      EXPRTREE_* environment variables, e.g. EXPRTREE_IDS__STRATEGY=uuid

[labels]
# Label of the root operator when starting from an empty tree
# root = "Root"

# Labels of nodes created by add-criteria / add-operator
# criteria = "New Criteria"
# operator = "New Operator"

[ids]
# "sequential" (1, 2, 3, ...) or "uuid"
# strategy = "sequential"

# Prefix prepended to generated ids
# prefix = ""

[moves]
# Moving onto an id that does not exist:
#   "first-root" appends to the first top-level operator
#   "reject" leaves the tree unchanged
# unknown_target = "first-root"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_files_when_loading_then_uses_defaults() {
        let settings = Settings::load_from(None, None).expect("load defaults");
        assert_eq!(settings.labels.criteria, "New Criteria");
        assert_eq!(settings.labels.operator, "New Operator");
        assert_eq!(settings.ids.strategy, IdStrategy::Sequential);
        assert_eq!(settings.moves.unknown_target, UnknownTargetPolicy::FirstRoot);
    }

    #[test]
    fn given_default_settings_when_serialized_then_round_trips_through_toml() {
        let text = Settings::default().to_toml().unwrap();
        assert!(text.contains("unknown_target = \"first-root\""));
        assert!(text.contains("strategy = \"sequential\""));
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn given_template_when_parsed_then_yields_defaults() {
        let parsed: Settings = toml::from_str(&Settings::template()).unwrap();
        assert_eq!(parsed, Settings::default());
    }
}
