//! CLI commands
//!
//! Each command returns the text to print: a rendered table, or pretty JSON
//! when `--json` is set.

pub mod input;
pub mod holdings;
pub mod groups;
pub mod refresh;
pub mod catalog;

use crate::error::Result;
use serde::Serialize;

/// Pick JSON or the pre-rendered text
pub(crate) fn render<T: Serialize>(json: bool, value: &T, text: String) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(text)
    }
}
