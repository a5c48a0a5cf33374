//! Deriver configuration.
//!
//! Handles building, loading, validating, and merging the options that steer
//! field derivation. The effective configuration is always the stock defaults
//! for an [`ExecutionMode`] with caller overrides merged on top, key by key.
//!
//! ## Settings File
//!
//! A pipeline may keep its overrides in `drafts.toml`:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! frontmatterDateFieldName = "date"    # Frontmatter key holding the publish date
//! frontmatterDraftFieldName = "draft"  # Frontmatter key holding the draft flag
//! publishedFieldName = "published"     # Output field for the publication result
//! visibleFieldName = "visible"         # Output field for the visibility result
//! timezone = "UTC"                     # IANA zone for "now" and for node dates
//! validNodes = ["MarkdownRemark"]      # Node types the deriver processes
//! makeDraftVisible = false             # Default depends on the execution mode
//! ```
//!
//! ## Unknown Keys
//!
//! Unknown keys are ignored so that a shared pipeline settings table can be
//! passed through unchanged. Each one is logged at `warn` level when the
//! configuration is built ([`resolve_options`], [`load_config`]), and only at
//! `debug` on the per-node path ([`merge_options`]).
//!
//! ## Execution Mode
//!
//! The only default that is not a constant is `makeDraftVisible`: it is `true`
//! in [`ExecutionMode::Development`] and `false` in
//! [`ExecutionMode::Production`]. The mode is an explicit argument everywhere;
//! [`ExecutionMode::from_env`] is the single place that consults the process
//! environment, and it is left to the caller to invoke.

use crate::date;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the settings file read by [`load_config`].
pub const CONFIG_FILE: &str = "drafts.toml";

/// Environment variable consulted by [`ExecutionMode::from_env`].
pub const MODE_ENV_VAR: &str = "SIMPLE_DRAFT_ENV";

const KNOWN_KEYS: &[&str] = &[
    "frontmatterDateFieldName",
    "frontmatterDraftFieldName",
    "visibleFieldName",
    "publishedFieldName",
    "timezone",
    "makeDraftVisible",
    "validNodes",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Production hides drafts by default; development previews them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Production,
    Development,
}

impl ExecutionMode {
    /// Read the mode from [`MODE_ENV_VAR`].
    ///
    /// Only the literal value `production` selects production; anything else,
    /// including an unset variable, selects development.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(MODE_ENV_VAR).ok().as_deref())
    }

    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("production") => ExecutionMode::Production,
            _ => ExecutionMode::Development,
        }
    }
}

/// Effective options for the deriver.
///
/// Keys keep the camelCase names used in pipeline settings. Missing keys
/// take the [`Default`] (production) values when deserialized directly; use
/// [`resolve_options`] to merge against a specific mode instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DraftConfig {
    /// Frontmatter key holding the publish date.
    pub frontmatter_date_field_name: String,
    /// Frontmatter key holding the explicit draft boolean.
    pub frontmatter_draft_field_name: String,
    /// Output field name for the visibility result.
    pub visible_field_name: String,
    /// Output field name for the publication result.
    pub published_field_name: String,
    /// IANA timezone identifier used for "now" and for node dates.
    pub timezone: String,
    /// Force every processed node visible regardless of publication state.
    pub make_draft_visible: bool,
    /// Node type tags the deriver processes; all others are skipped.
    pub valid_nodes: Vec<String>,
}

impl DraftConfig {
    /// Stock defaults for the given mode.
    pub fn for_mode(mode: ExecutionMode) -> Self {
        Self {
            frontmatter_date_field_name: "date".to_string(),
            frontmatter_draft_field_name: "draft".to_string(),
            visible_field_name: "visible".to_string(),
            published_field_name: "published".to_string(),
            timezone: "UTC".to_string(),
            make_draft_visible: mode == ExecutionMode::Development,
            valid_nodes: vec!["MarkdownRemark".to_string()],
        }
    }

    /// Whether nodes with this type tag pass the type gate.
    pub fn accepts(&self, node_type: &str) -> bool {
        self.valid_nodes.iter().any(|t| t == node_type)
    }

    /// Validate values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("frontmatterDateFieldName", &self.frontmatter_date_field_name),
            ("frontmatterDraftFieldName", &self.frontmatter_draft_field_name),
            ("visibleFieldName", &self.visible_field_name),
            ("publishedFieldName", &self.published_field_name),
        ];
        for (key, value) in names {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if self.visible_field_name == self.published_field_name {
            return Err(ConfigError::Validation(
                "publishedFieldName and visibleFieldName must differ".into(),
            ));
        }
        if self.valid_nodes.is_empty() {
            return Err(ConfigError::Validation(
                "validNodes must not be empty".into(),
            ));
        }
        date::resolve_timezone(&self.timezone)
            .map_err(|e| ConfigError::Validation(format!("timezone: {e}")))?;
        Ok(())
    }
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self::for_mode(ExecutionMode::Production)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock defaults for `mode` as a `toml::Value::Table`.
///
/// This is the base layer that overrides are merged onto.
pub fn stock_defaults_value(mode: ExecutionMode) -> toml::Value {
    toml::Value::try_from(DraftConfig::for_mode(mode)).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Keys of `overlay` that the deriver does not recognize.
pub fn unknown_keys(overlay: &toml::Value) -> Vec<&str> {
    overlay
        .as_table()
        .map(|table| {
            table
                .keys()
                .map(String::as_str)
                .filter(|key| !KNOWN_KEYS.contains(key))
                .collect()
        })
        .unwrap_or_default()
}

/// Load the settings file from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no [`CONFIG_FILE`] exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value and deserialize, without
/// validating.
fn merge_overlay(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<DraftConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => {
            if !ov.is_table() {
                return Err(ConfigError::Validation(format!(
                    "options must be a table, got {}",
                    ov.type_str()
                )));
            }
            merge_toml(base, ov)
        }
        None => base,
    };
    let config: DraftConfig = merged.try_into()?;
    Ok(config)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<DraftConfig, ConfigError> {
    let config = merge_overlay(base, overlay)?;
    config.validate()?;
    Ok(config)
}

/// Build the effective configuration from caller-supplied options.
///
/// `raw` may be absent or an empty table; missing keys fall back to the
/// defaults for `mode`. This is the construction boundary: unknown keys are
/// logged at `warn` here, once per call.
pub fn resolve_options(
    mode: ExecutionMode,
    raw: Option<toml::Value>,
) -> Result<DraftConfig, ConfigError> {
    if let Some(raw) = &raw {
        for key in unknown_keys(raw) {
            log::warn!("ignoring unknown option `{key}`");
        }
    }
    resolve_config(stock_defaults_value(mode), raw)
}

/// Merge caller-supplied options for a single node without validating them.
///
/// Used by the per-node hook, which must apply the type gate before any
/// option error can surface. Unknown keys are only logged at `debug`, since
/// this runs once per node.
pub fn merge_options(
    mode: ExecutionMode,
    raw: Option<toml::Value>,
) -> Result<DraftConfig, ConfigError> {
    if let Some(raw) = &raw {
        for key in unknown_keys(raw) {
            log::debug!("ignoring unknown option `{key}`");
        }
    }
    merge_overlay(stock_defaults_value(mode), raw)
}

/// Load config from [`CONFIG_FILE`] in the given directory.
///
/// Merges user values on top of the defaults for `mode` and validates the
/// result.
pub fn load_config(root: &Path, mode: ExecutionMode) -> Result<DraftConfig, ConfigError> {
    let overlay = load_raw_config(root)?;
    resolve_options(mode, overlay)
}

/// Returns a fully-commented stock settings file with all keys explained.
///
/// The values equal the production defaults.
pub fn stock_config_toml() -> &'static str {
    r##"# Draft / publish settings
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the production defaults.
#
# Unknown keys are ignored (and logged), so this table can live alongside
# other pipeline settings.

# ---------------------------------------------------------------------------
# Frontmatter inputs
# ---------------------------------------------------------------------------
# Key holding the publish date. A date after "now" leaves the node
# unpublished. A missing or empty date counts as published.
frontmatterDateFieldName = "date"

# Key holding the draft flag. Only the boolean `true` marks a draft;
# the string "true" does not.
frontmatterDraftFieldName = "draft"

# ---------------------------------------------------------------------------
# Derived outputs
# ---------------------------------------------------------------------------
# Field receiving the publication result.
publishedFieldName = "published"

# Field receiving the visibility result. Must differ from publishedFieldName.
visibleFieldName = "visible"

# ---------------------------------------------------------------------------
# Evaluation
# ---------------------------------------------------------------------------
# IANA timezone used for "now" and for dates written without an offset.
timezone = "UTC"

# Node types to process. Nodes of any other type are left untouched.
validNodes = ["MarkdownRemark"]

# Show drafts and future-dated nodes anyway. Defaults to true in
# development mode and false in production.
makeDraftVisible = false
"##
}
