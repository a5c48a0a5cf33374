//! # Simple Draft
//!
//! A node-creation hook for static-site content pipelines. For every parsed
//! document it derives two booleans from the frontmatter:
//!
//! - **published**: the publish date is not in the future and the document is
//!   not explicitly marked as a draft;
//! - **visible**: published, or drafts are forced visible for previewing.
//!
//! The pipeline owns everything around this decision: discovering and parsing
//! documents, storing the derived fields, and supplying settings.
//!
//! ```text
//! ContentNode + DraftConfig + now  →  derive_fields_at  →  Option<DerivedFields>
//!                                                              │
//!                                         attach_fields ───────┘  (published, visible)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Option defaults per execution mode, merging, `drafts.toml` loading, validation |
//! | [`date`] | Timezone resolution and frontmatter date interpretation |
//! | [`derive`] | The decision itself plus callback adapters for the pipeline |
//! | [`types`] | `ContentNode` (pipeline input) and `DerivedFields` (output) |
//!
//! # Design Decisions
//!
//! ## Pure Decision, Injected Clock
//!
//! [`derive::derive_fields_at`] takes the current instant as an argument and
//! returns its result instead of writing it anywhere. The same node, options
//! and instant always give the same answer, so tests freeze time by passing a
//! constant. [`derive::attach_fields`] wraps it for pipelines that record
//! fields through a callback.
//!
//! ## No Hidden Environment Reads
//!
//! Whether drafts are visible by default depends on production vs. preview.
//! That choice is an explicit [`config::ExecutionMode`] argument;
//! [`config::ExecutionMode::from_env`] exists for callers that want to read it
//! from the environment once, at configuration time.
//!
//! ## Malformed Dates Fail Fast
//!
//! A missing date means "published". A date string that cannot be parsed is
//! reported as [`derive::DeriveError::Date`] rather than guessed at, so a typo
//! in frontmatter cannot silently publish or hide a document.
//!
//! ## Timezone-Aware Comparison
//!
//! Dates without an offset are wall-clock times in the configured zone, and
//! "now" is converted into the same zone before comparing. A post dated
//! `2022-05-02` in `Asia/Tokyo` goes live at Tokyo midnight, not UTC midnight.

pub mod config;
pub mod date;
pub mod derive;
pub mod types;

pub use config::{DraftConfig, ExecutionMode};
pub use derive::{DeriveError, attach_fields, derive_fields, derive_fields_at, on_create_node};
pub use types::{ContentNode, DerivedFields};

#[cfg(test)]
pub(crate) mod test_helpers;
