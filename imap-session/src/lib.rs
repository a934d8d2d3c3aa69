//! Session state and result orchestration for the inspection map.
//!
//! This crate provides:
//! - `selection`: ordered toggle sets of selected main and auxiliary queries
//! - `area`: the area selection state machine and the drawing-tool port
//! - `aggregate`: sequence-guarded fan-out fetch cycles and their snapshots
//! - `layers`: marker, heatmap and summary values derived from a snapshot
//! - `session`: the owned `Session` tying them together

pub mod aggregate;
pub mod area;
pub mod layers;
mod published;
pub mod selection;
pub mod session;

pub use aggregate::{Aggregate, CycleReport, ResultAggregator};
pub use area::{AreaSelector, DrawStyle, DrawingTool, Transition};
pub use layers::{
    auxiliary_layers, main_markers, partition, AuxiliaryLayers, HeatSample, HeatmapOptions,
    MarkerSpec, Summary, SummaryRow, HEATMAP_OPTIONS,
};
pub use selection::SelectionSet;
pub use session::{AreaUpdate, Refresh, Session};
