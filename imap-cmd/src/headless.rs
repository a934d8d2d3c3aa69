//! Drawing tool for sessions without a map: polygons come from files, so
//! activation is only logged.

use imap_session::{DrawStyle, DrawingTool};
use log::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDrawTool;

impl DrawingTool for LoggingDrawTool {
    fn activate(&mut self, style: &DrawStyle) {
        debug!("Polygon drawing enabled, stroke {} weight {}", style.color, style.weight);
    }

    fn deactivate(&mut self) {
        debug!("Polygon drawing disabled");
    }
}
