//! Named regions (municipalities), their outlines, and map framing.

use crate::error::{Error, Result};
use geojson::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A selectable named region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRegion {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "populacao", default)]
    pub population: Option<i64>,
}

/// Outline geometry of a named region, for drawing its boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOutline {
    pub name: String,
    pub geometry: Geometry,
}

#[derive(Deserialize)]
struct RegionFeature {
    #[serde(default)]
    geometry: serde_json::Value,
    #[serde(default)]
    properties: HashMap<String, serde_json::Value>,
}

impl RegionOutline {
    /// Decode the backend's region `Feature`. An unknown region comes back
    /// as an empty geometry with `properties.error`.
    pub fn from_feature_json(name: &str, body: &str) -> Result<Self> {
        let feature: RegionFeature = serde_json::from_str(body)?;
        let is_empty = feature
            .geometry
            .as_object()
            .map_or(true, |object| object.is_empty());
        if feature.properties.contains_key("error") || is_empty {
            return Err(Error::RegionNotFound(name.to_string()));
        }
        let geometry: Geometry = serde_json::from_value(feature.geometry)?;
        Ok(RegionOutline {
            name: name.to_string(),
            geometry,
        })
    }
}

/// Bounding box, `minLng,minLat,maxLng,maxLat` on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lng..=self.max_lng).contains(&lng)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lng, self.min_lat, self.max_lng, self.max_lat
        )
    }
}

impl FromStr for Bounds {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|_| Error::InvalidBounds(s.to_string()))?;
        match parts.as_slice() {
            [min_lng, min_lat, max_lng, max_lat] if min_lng <= max_lng && min_lat <= max_lat => {
                Ok(Bounds {
                    min_lng: *min_lng,
                    min_lat: *min_lat,
                    max_lng: *max_lng,
                    max_lat: *max_lat,
                })
            }
            _ => Err(Error::InvalidBounds(s.to_string())),
        }
    }
}

/// Initial view and pan limits of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFrame {
    /// `(lat, lng)`
    pub center: (f64, f64),
    pub bounds: Bounds,
    pub zoom: u8,
    pub min_zoom: u8,
}

/// Rio Grande do Norte, the area the installations cover.
pub const DEFAULT_FRAME: MapFrame = MapFrame {
    center: (-5.79, -36.65),
    bounds: Bounds {
        min_lng: -38.6,
        min_lat: -6.9,
        max_lng: -34.9,
        max_lat: -4.8,
    },
    zoom: 7,
    min_zoom: 6,
};
