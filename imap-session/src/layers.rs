//! Values derived from a published aggregate: marker and heatmap layers and
//! the results summary. All pure functions of one snapshot.

use crate::aggregate::Aggregate;
use imap_core::{
    derive_marker_color, marker_style, GeoFeature, MarkerStyle, QueryKey, ReturnType, Rgb,
};
use serde::Serialize;

/// Features of an aggregate split by the return type of their result.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub markers: Vec<&'a GeoFeature>,
    pub heatmap: Vec<&'a GeoFeature>,
}

/// Split every feature by its result's return type. A result contributes
/// all of its features to one side.
pub fn partition<K: QueryKey>(aggregate: &Aggregate<K>) -> Partition<'_> {
    let mut split = Partition::default();
    for (_, result) in aggregate.iter() {
        let side = match result.return_type() {
            ReturnType::Heatmap => &mut split.heatmap,
            ReturnType::Marker => &mut split.markers,
        };
        side.extend(result.features.iter());
    }
    split
}

/// Everything needed to draw one installation marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    /// `"{query_id}-{installation_id}"`
    pub key: String,
    /// `(lat, lng)`
    pub position: (f64, f64),
    pub color: Rgb,
    pub style: MarkerStyle,
}

impl MarkerSpec {
    pub fn from_feature(feature: &GeoFeature, is_auxiliary: bool) -> Self {
        let properties = &feature.properties;
        let base = Rgb::parse_or_fallback(properties.query_color.as_deref());
        MarkerSpec {
            key: feature.marker_key(),
            position: (feature.lat(), feature.lng()),
            color: derive_marker_color(base, properties.target_type),
            style: marker_style(properties.target_type, is_auxiliary),
        }
    }
}

/// One weighted point of the heatmap layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatSample {
    pub lat: f64,
    pub lng: f64,
    pub intensity: f64,
}

impl From<&GeoFeature> for HeatSample {
    fn from(feature: &GeoFeature) -> Self {
        HeatSample {
            lat: feature.lat(),
            lng: feature.lng(),
            intensity: feature.heat_intensity(),
        }
    }
}

/// Rendering parameters of the heatmap layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapOptions {
    pub radius: u32,
    pub blur: u32,
    pub max_zoom: u8,
    /// Intensity rendered at full gradient
    pub max: f64,
    pub min_opacity: f64,
    /// `(stop, color)` pairs, stops ascending in `0.0..=1.0`
    pub gradient: &'static [(f64, Rgb)],
}

pub const HEATMAP_OPTIONS: HeatmapOptions = HeatmapOptions {
    radius: 35,
    blur: 45,
    max_zoom: 17,
    max: 0.6,
    min_opacity: 0.3,
    gradient: &[
        (0.0, Rgb(0x6B00B3)),
        (0.2, Rgb(0x9D00FF)),
        (0.4, Rgb(0xFF00FF)),
        (0.6, Rgb(0xFF6600)),
        (0.8, Rgb(0xFF3300)),
        (1.0, Rgb(0xCC0000)),
    ],
};

/// Markers and heat samples for the auxiliary aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuxiliaryLayers {
    pub markers: Vec<MarkerSpec>,
    pub heat: Vec<HeatSample>,
}

/// Main results always render as markers.
pub fn main_markers<K: QueryKey>(aggregate: &Aggregate<K>) -> Vec<MarkerSpec> {
    aggregate
        .iter()
        .flat_map(|(_, result)| result.features.iter())
        .map(|feature| MarkerSpec::from_feature(feature, false))
        .collect()
}

pub fn auxiliary_layers<K: QueryKey>(aggregate: &Aggregate<K>) -> AuxiliaryLayers {
    let split = partition(aggregate);
    AuxiliaryLayers {
        markers: split
            .markers
            .into_iter()
            .map(|feature| MarkerSpec::from_feature(feature, true))
            .collect(),
        heat: split.heatmap.into_iter().map(HeatSample::from).collect(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow<K> {
    pub id: K,
    pub name: String,
    pub color: Rgb,
    pub count: usize,
}

/// Per-query feature counts, rows in aggregate order.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary<K> {
    pub total: usize,
    pub rows: Vec<SummaryRow<K>>,
}

impl<K: QueryKey> Summary<K> {
    pub fn of(aggregate: &Aggregate<K>) -> Self {
        let rows: Vec<SummaryRow<K>> = aggregate
            .iter()
            .map(|(id, result)| SummaryRow {
                id,
                name: result
                    .metadata
                    .display_name
                    .clone()
                    .unwrap_or_else(|| id.to_string()),
                color: Rgb::parse_or_fallback(result.metadata.display_color.as_deref()),
                count: result.len(),
            })
            .collect();
        Summary {
            total: rows.iter().map(|row| row.count).sum(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imap_core::color::{AUXILIARY_STYLE, MAIN_FORTE_STYLE, MAIN_REGULAR_STYLE};
    use imap_core::{AuxQueryId, MainQueryId, QueryResult};

    fn result(query_id: i64, tag: &str, targets: &[&str]) -> QueryResult {
        let features: Vec<serde_json::Value> = targets
            .iter()
            .enumerate()
            .map(|(i, target)| {
                serde_json::json!({
                    "geometry": {"coordinates": [-35.0 - i as f64, -5.0]},
                    "properties": {
                        "id_instalacao": format!("I{}", i),
                        "query_id": query_id,
                        "query_cor": "#3B82F6",
                        "tipo_alvo": target,
                        "intensidade": 0.9
                    }
                })
            })
            .collect();
        serde_json::from_value(serde_json::json!({
            "features": features,
            "metadata": {"query_id": query_id, "query_nome": format!("Q{}", query_id),
                         "query_cor": "#10B981", "tipo_retorno": tag}
        }))
        .unwrap()
    }

    #[test]
    fn partition_is_per_result() {
        let aggregate = Aggregate::new(
            vec![
                (AuxQueryId(1), result(1, "heatmap", &["regular", "regular", "forte"])),
                (AuxQueryId(2), result(2, "instalacao", &["regular", "forte"])),
                (AuxQueryId(3), result(3, "desconhecido", &["regular"])),
            ],
            Vec::new(),
        );
        let split = partition(&aggregate);
        assert_eq!(split.heatmap.len(), 3);
        assert_eq!(split.markers.len(), 3);
        assert_eq!(
            split.heatmap.len() + split.markers.len(),
            aggregate.feature_count()
        );

        let layers = auxiliary_layers(&aggregate);
        assert_eq!(layers.heat.len(), 3);
        assert_eq!(layers.heat[0].intensity, 0.9);
        assert!(layers.markers.iter().all(|m| m.style == AUXILIARY_STYLE));
    }

    #[test]
    fn main_markers_take_style_and_color_from_target_type() {
        let aggregate = Aggregate::new(
            vec![(MainQueryId(4), result(4, "instalacao", &["forte", "regular"]))],
            Vec::new(),
        );
        let markers = main_markers(&aggregate);
        assert_eq!(markers.len(), 2);

        assert_eq!(markers[0].key, "4-I0");
        assert_eq!(markers[0].position, (-5.0, -35.0));
        assert_eq!(markers[0].style, MAIN_FORTE_STYLE);
        assert_eq!(markers[0].color.to_string(), "#88cfff");

        assert_eq!(markers[1].style, MAIN_REGULAR_STYLE);
        assert_eq!(markers[1].color.to_string(), "#084fc3");
    }

    #[test]
    fn summary_rows_follow_aggregate_order() {
        let aggregate = Aggregate::new(
            vec![
                (MainQueryId(2), result(2, "instalacao", &["regular"; 4])),
                (MainQueryId(1), result(1, "instalacao", &["forte"; 2])),
            ],
            vec![MainQueryId(9)],
        );
        let summary = Summary::of(&aggregate);
        assert_eq!(summary.total, 6);
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].id, MainQueryId(2));
        assert_eq!(summary.rows[0].name, "Q2");
        assert_eq!(summary.rows[0].count, 4);
        assert_eq!(summary.rows[1].color, Rgb(0x10B981));
    }

    #[test]
    fn unnamed_result_falls_back_to_the_plain_id() {
        let unnamed: QueryResult =
            serde_json::from_value(serde_json::json!({ "features": [] })).unwrap();
        let aggregate = Aggregate::new(vec![(AuxQueryId(5), unnamed)], Vec::new());
        let summary = Summary::of(&aggregate);
        assert_eq!(summary.rows[0].name, "5");
        assert_eq!(summary.rows[0].color, Rgb(0x6B7280));
        assert_eq!(summary.total, 0);
    }

    #[test]
    fn heatmap_gradient_is_ordered() {
        let stops: Vec<f64> = HEATMAP_OPTIONS.gradient.iter().map(|(s, _)| *s).collect();
        assert!(stops.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(HEATMAP_OPTIONS.radius, 35);
        assert_eq!(HEATMAP_OPTIONS.blur, 45);
    }
}
