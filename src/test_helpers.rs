//! Shared test utilities for the simple-draft test suite.
//!
//! Provides a frozen clock, node builders, and a configuration matching the
//! options most pipelines pass in.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fields = derive(&node(json!({ "date": "2022-05-03" })), &test_config());
//! assert!(!fields.published);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::Value;
use std::cell::RefCell;

use crate::config::DraftConfig;
use crate::derive::{attach_fields, derive_fields_at};
use crate::types::{ContentNode, DerivedFields};

// =========================================================================
// Clock and configuration
// =========================================================================

/// The instant every test evaluates against: 2022-05-02T00:00:00Z.
pub fn frozen_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 5, 2, 0, 0, 0).unwrap()
}

/// Production defaults, with `Mdx` accepted alongside `MarkdownRemark`.
pub fn test_config() -> DraftConfig {
    DraftConfig {
        valid_nodes: vec!["MarkdownRemark".to_string(), "Mdx".to_string()],
        make_draft_visible: false,
        ..DraftConfig::default()
    }
}

// =========================================================================
// Node builders
// =========================================================================

/// A `MarkdownRemark` node with the given frontmatter object.
pub fn node(frontmatter: Value) -> ContentNode {
    node_of_type("MarkdownRemark", frontmatter)
}

pub fn node_of_type(node_type: &str, frontmatter: Value) -> ContentNode {
    match frontmatter {
        Value::Object(map) => ContentNode::new(node_type, map),
        other => panic!("frontmatter must be a JSON object, got {other}"),
    }
}

// =========================================================================
// Derivation shortcuts
// =========================================================================

/// Derive at [`frozen_now`], asserting the node is processed and valid.
pub fn derive(node: &ContentNode, config: &DraftConfig) -> DerivedFields {
    derive_fields_at(node, config, frozen_now())
        .unwrap()
        .expect("node type should be accepted")
}

/// Every `(name, value)` pair handed to the attach callback, in call order.
pub fn collect_attached(node: &ContentNode, config: &DraftConfig) -> Vec<(String, bool)> {
    let mut calls = Vec::new();
    attach_fields(node, config, frozen_now(), |_, name, value| {
        calls.push((name.to_string(), value));
    })
    .unwrap();
    calls
}

// =========================================================================
// Log capture
// =========================================================================

thread_local! {
    static CAPTURED: RefCell<Option<Vec<(Level, String)>>> = const { RefCell::new(None) };
}

/// Records log lines emitted on the capturing thread only, so parallel tests
/// do not see each other's output.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED.with(|captured| {
            if let Some(lines) = captured.borrow_mut().as_mut() {
                lines.push((record.level(), record.args().to_string()));
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Run `f` and return its result with every `(level, message)` it logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<(Level, String)>) {
    // Another test may have installed it already.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Trace);
    CAPTURED.with(|captured| *captured.borrow_mut() = Some(Vec::new()));
    let out = f();
    let lines = CAPTURED.with(|captured| captured.borrow_mut().take().unwrap_or_default());
    (out, lines)
}
