//! Turning protocol payloads into log text
//!
//! - **value**: bounded serialization of a single protocol value
//! - **console**: one console event into one `LogEntry`

pub mod console;
pub mod value;

pub use console::{format_event, format_params};
pub use value::{serialize, serialize_preview};

use crate::constants::{MAX_ARRAY_ITEMS, MAX_DEPTH, MAX_STRING_LEN};
use serde::{Deserialize, Serialize};

/// Bounds applied while serializing values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Deepest preview nesting rendered before the sentinel
    pub max_depth: usize,
    /// Characters kept from a string value
    pub max_string_len: usize,
    /// Elements rendered for an array-like preview
    pub max_array_items: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_string_len: MAX_STRING_LEN,
            max_array_items: MAX_ARRAY_ITEMS,
        }
    }
}
