//! The field deriver: decides `published` and `visible` for one node.
//!
//! [`derive_fields_at`] is the pure decision: it takes the current instant as
//! an argument and returns the flags, or `None` when the node's type is not
//! processed. The remaining functions are thin adapters for pipelines that
//! attach fields through a callback.
//!
//! ## Decision Sequence
//!
//! ```text
//! type not in validNodes        → skip (no fields)
//! date absent / not a date      → published = true
//! date present                  → published = date <= now   (in `timezone`)
//! draft == true (boolean only)  → published = false
//! visible = makeDraftVisible || published
//! ```

use crate::config::{self, ConfigError, DraftConfig, ExecutionMode};
use crate::date::{self, DateError, DateValue};
use crate::types::{ContentNode, DerivedFields};
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeriveError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Frontmatter field `{field}`: {source}")]
    Date {
        field: String,
        #[source]
        source: DateError,
    },
}

/// Derive the flags for `node` as of `now`.
///
/// Returns `Ok(None)` when the node's type is not listed in
/// [`DraftConfig::valid_nodes`]. A date string that cannot be parsed, or an
/// unknown timezone when a date is present, is an error.
pub fn derive_fields_at(
    node: &ContentNode,
    config: &DraftConfig,
    now: DateTime<Utc>,
) -> Result<Option<DerivedFields>, DeriveError> {
    if !config.accepts(node.node_type()) {
        log::debug!("skipping node of type {}", node.node_type());
        return Ok(None);
    }

    let date_field = &config.frontmatter_date_field_name;
    let date_value = DateValue::classify(node.frontmatter_value(date_field));
    let date = date::publish_date(date_value, &config.timezone).map_err(|source| {
        DeriveError::Date {
            field: date_field.clone(),
            source,
        }
    })?;
    let mut published = date.is_none_or(|date| date::is_not_after(&date, now));

    // Only a real boolean marks a draft; "true" as a string does not.
    if node.frontmatter_value(&config.frontmatter_draft_field_name) == Some(&Value::Bool(true)) {
        published = false;
    }

    let visible = config.make_draft_visible || published;
    log::debug!(
        "derived {} node: published={published} visible={visible}",
        node.node_type()
    );
    Ok(Some(DerivedFields { published, visible }))
}

/// [`derive_fields_at`] evaluated against the system clock.
pub fn derive_fields(
    node: &ContentNode,
    config: &DraftConfig,
) -> Result<Option<DerivedFields>, DeriveError> {
    derive_fields_at(node, config, Utc::now())
}

/// Derive the flags and hand each one to `attach` as `(node, name, value)`.
///
/// `attach` is called zero times for skipped node types and exactly twice
/// otherwise: published first, then visible, under the configured field
/// names. On error it is not called at all.
pub fn attach_fields<F>(
    node: &ContentNode,
    config: &DraftConfig,
    now: DateTime<Utc>,
    mut attach: F,
) -> Result<(), DeriveError>
where
    F: FnMut(&ContentNode, &str, bool),
{
    if let Some(fields) = derive_fields_at(node, config, now)? {
        attach(node, &config.published_field_name, fields.published);
        attach(node, &config.visible_field_name, fields.visible);
    }
    Ok(())
}

/// Node-creation hook: merge `raw_options` over the defaults for `mode`, then
/// attach both fields as of the system clock.
///
/// The type gate runs before the merged options are validated, so a node of
/// an unprocessed type is a silent no-op even when the options are invalid.
/// Options that cannot be deserialized at all are still an error, since the
/// accepted types are then unknown.
pub fn on_create_node<F>(
    node: &ContentNode,
    raw_options: Option<toml::Value>,
    mode: ExecutionMode,
    attach: F,
) -> Result<(), DeriveError>
where
    F: FnMut(&ContentNode, &str, bool),
{
    let config = config::merge_options(mode, raw_options)?;
    if !config.accepts(node.node_type()) {
        log::debug!("skipping node of type {}", node.node_type());
        return Ok(());
    }
    config.validate()?;
    attach_fields(node, &config, Utc::now(), attach)
}
