//! Query results: GeoJSON feature collections of installations.

use crate::error::Result;
use crate::query::{ReturnType, TargetType};
use serde::{Deserialize, Serialize};

/// Heat weight used when a heatmap feature carries no `intensidade`.
pub const DEFAULT_HEAT_INTENSITY: f64 = 0.5;

/// Point geometry of an installation, `[lng, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    pub coordinates: [f64; 2],
}

/// Properties attached to every installation feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub query_id: i64,
    #[serde(rename = "id_instalacao")]
    pub installation_id: String,
    #[serde(rename = "query_cor", default)]
    pub query_color: Option<String>,
    #[serde(rename = "query_nome", default)]
    pub query_name: Option<String>,
    #[serde(rename = "tipo_alvo", default)]
    pub target_type: TargetType,
    #[serde(rename = "municipio", default)]
    pub municipality: Option<String>,
    #[serde(rename = "classe_tarifaria", default)]
    pub tariff_class: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(rename = "intensidade", default)]
    pub intensity: Option<f64>,
}

/// One geo-located installation returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    pub geometry: PointGeometry,
    pub properties: FeatureProperties,
}

impl GeoFeature {
    pub fn lng(&self) -> f64 {
        self.geometry.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.geometry.coordinates[1]
    }

    /// Heat weight of this feature; only meaningful for heatmap results.
    pub fn heat_intensity(&self) -> f64 {
        self.properties.intensity.unwrap_or(DEFAULT_HEAT_INTENSITY)
    }

    /// Stable key for rendering: `"{query_id}-{installation_id}"`.
    pub fn marker_key(&self) -> String {
        format!(
            "{}-{}",
            self.properties.query_id, self.properties.installation_id
        )
    }
}

/// Metadata block of a query result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultMetadata {
    #[serde(default)]
    pub query_id: Option<i64>,
    #[serde(rename = "query_nome", default)]
    pub display_name: Option<String>,
    #[serde(rename = "query_cor", default)]
    pub display_color: Option<String>,
    #[serde(rename = "tipo_retorno", default)]
    pub return_type: ReturnType,
    #[serde(default)]
    pub area_type: Option<String>,
    #[serde(default)]
    pub total_results: Option<usize>,
    /// Set by the backend when it could not run the query at all.
    #[serde(default)]
    pub error: Option<String>,
}

/// The result of one query fetch. Immutable once stored; a re-fetch
/// replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub features: Vec<GeoFeature>,
    #[serde(default)]
    pub metadata: ResultMetadata,
}

impl QueryResult {
    /// Decode a `FeatureCollection` body as sent by the backend.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn return_type(&self) -> ReturnType {
        self.metadata.return_type
    }

    /// Backend-reported failure carried inside an otherwise successful response.
    pub fn backend_error(&self) -> Option<&str> {
        self.metadata.error.as_deref()
    }
}
