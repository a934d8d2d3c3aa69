//! Turning `--region` / `--polygon` into an area.

use crate::AreaArgs;
use anyhow::{anyhow, bail, Context};
use geojson::{GeoJson, Geometry};
use imap_core::{AreaFilter, PolygonGeometry};
use std::path::Path;

#[derive(Debug, Clone)]
pub enum AreaChoice {
    Region(String),
    Polygon(Geometry),
}

impl AreaChoice {
    pub fn from_args(args: &AreaArgs) -> anyhow::Result<Self> {
        match (&args.region, &args.polygon) {
            (Some(name), None) => Ok(AreaChoice::Region(name.clone())),
            (None, Some(path)) => Ok(AreaChoice::Polygon(read_polygon_file(path)?)),
            _ => bail!("give exactly one of --region or --polygon"),
        }
    }

    pub fn into_filter(self) -> anyhow::Result<AreaFilter> {
        Ok(match self {
            AreaChoice::Region(name) => AreaFilter::NamedRegion(name),
            AreaChoice::Polygon(geometry) => AreaFilter::Polygon(PolygonGeometry::try_from(geometry)?),
        })
    }
}

fn read_polygon_file(path: &Path) -> anyhow::Result<Geometry> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    first_geometry(&body).with_context(|| format!("parsing {}", path.display()))
}

/// The geometry itself, a Feature's geometry, or the first geometry of a
/// FeatureCollection.
pub fn first_geometry(body: &str) -> anyhow::Result<Geometry> {
    let geojson: GeoJson = body.parse()?;
    let geometry = match geojson {
        GeoJson::Geometry(geometry) => Some(geometry),
        GeoJson::Feature(feature) => feature.geometry,
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .find_map(|feature| feature.geometry),
    };
    geometry.ok_or_else(|| anyhow!("no geometry found"))
}
