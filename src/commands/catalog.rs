//! Instrument catalog command

use crate::catalog::CATALOG;
use crate::commands::render;
use crate::display;
use crate::error::Result;

/// Print the supported instruments
pub fn show_catalog(json: bool) -> Result<String> {
    render(json, &CATALOG, display::render_catalog(CATALOG))
}
