//! CSV export of rendered layers, one row per marker or heat sample.

use imap_session::{HeatSample, MarkerSpec};
use serde::Serialize;
use std::io;
use std::path::Path;

#[derive(Debug, Serialize)]
struct LayerRow<'a> {
    layer: &'static str,
    key: Option<&'a str>,
    lat: f64,
    lng: f64,
    color: Option<String>,
    size: Option<u32>,
    opacity: Option<f32>,
    shape: Option<&'static str>,
    intensity: Option<f64>,
}

impl<'a> From<&'a MarkerSpec> for LayerRow<'a> {
    fn from(marker: &'a MarkerSpec) -> Self {
        LayerRow {
            layer: "marker",
            key: Some(marker.key.as_str()),
            lat: marker.position.0,
            lng: marker.position.1,
            color: Some(marker.color.to_string()),
            size: Some(marker.style.size),
            opacity: Some(marker.style.opacity),
            shape: Some(match marker.style.shape {
                imap_core::MarkerShape::Circle => "circle",
                imap_core::MarkerShape::Square => "square",
            }),
            intensity: None,
        }
    }
}

impl From<&HeatSample> for LayerRow<'_> {
    fn from(sample: &HeatSample) -> Self {
        LayerRow {
            layer: "heatmap",
            key: None,
            lat: sample.lat,
            lng: sample.lng,
            color: None,
            size: None,
            opacity: None,
            shape: None,
            intensity: Some(sample.intensity),
        }
    }
}

/// Write markers then heat samples, with a header row.
pub fn write_layers<W: io::Write>(
    writer: W,
    markers: &[MarkerSpec],
    heat: &[HeatSample],
) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for marker in markers {
        csv_writer.serialize(LayerRow::from(marker))?;
        rows += 1;
    }
    for sample in heat {
        csv_writer.serialize(LayerRow::from(sample))?;
        rows += 1;
    }
    csv_writer.flush()?;
    Ok(rows)
}

pub fn write_layers_to_path(
    path: &Path,
    markers: &[MarkerSpec],
    heat: &[HeatSample],
) -> anyhow::Result<usize> {
    let file = std::fs::File::create(path)?;
    write_layers(file, markers, heat)
}
