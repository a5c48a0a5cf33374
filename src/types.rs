//! Records exchanged with the content pipeline.
//!
//! [`ContentNode`] deserializes from the pipeline's JSON node shape:
//!
//! ```json
//! {
//!   "internal": { "type": "MarkdownRemark" },
//!   "frontmatter": { "date": "2022-05-02", "draft": false }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pipeline bookkeeping carried on every node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInternal {
    /// Type tag assigned by the parser, e.g. `"MarkdownRemark"` or `"Mdx"`.
    #[serde(rename = "type")]
    pub node_type: String,
}

/// A parsed content document. Read-only input to the deriver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    pub internal: NodeInternal,
    /// Frontmatter keys mapped to arbitrary scalar values.
    #[serde(default)]
    pub frontmatter: Map<String, Value>,
}

impl ContentNode {
    pub fn new(node_type: impl Into<String>, frontmatter: Map<String, Value>) -> Self {
        Self {
            internal: NodeInternal {
                node_type: node_type.into(),
            },
            frontmatter,
        }
    }

    pub fn node_type(&self) -> &str {
        &self.internal.node_type
    }

    pub fn frontmatter_value(&self, key: &str) -> Option<&Value> {
        self.frontmatter.get(key)
    }
}

/// The two computed flags for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedFields {
    /// Date is not in the future and the node is not an explicit draft.
    pub published: bool,
    /// Published, or drafts are forced visible.
    pub visible: bool,
}
