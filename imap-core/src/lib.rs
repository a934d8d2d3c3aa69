//! Core types for the inspection map.
//!
//! This crate provides:
//! - `query` / `feature`: the query catalogue and GeoJSON query results
//! - `area` / `region`: area descriptors, validated polygons, named regions
//! - `color`: marker color derivation and the marker style table
//! - `installation`: per-installation detail records and area metrics

pub mod area;
pub mod color;
pub mod error;
pub mod feature;
pub mod installation;
pub mod query;
pub mod region;

pub use area::{AreaDescriptor, AreaFilter, AreaKind, PolygonGeometry};
pub use color::{derive_marker_color, marker_style, MarkerShape, MarkerStyle, Rgb};
pub use error::{Error, Result};
pub use feature::{GeoFeature, QueryResult, ResultMetadata};
pub use query::{AuxQueryId, AuxiliaryQuery, MainQuery, MainQueryId, QueryKey, ReturnType, TargetType};
pub use region::{Bounds, MapFrame, NamedRegion, RegionOutline, DEFAULT_FRAME};
