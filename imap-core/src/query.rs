//! Query catalogue types: identifiers and list entries for main and
//! auxiliary queries.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

/// Identifier of a main query (`id_query` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MainQueryId(pub i64);

/// Identifier of an auxiliary query. Independent of [`MainQueryId`]:
/// the same number may name one query of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuxQueryId(pub i64);

impl Display for MainQueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for AuxQueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything usable as a key of a selection set or an aggregate.
pub trait QueryKey: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static {}

impl QueryKey for MainQueryId {}
impl QueryKey for AuxQueryId {}

/// Classification strength of a target.
///
/// Anything the backend sends other than `forte`, including null, is
/// treated as `regular`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum TargetType {
    #[default]
    Regular,
    Forte,
}

impl From<Option<String>> for TargetType {
    fn from(value: Option<String>) -> Self {
        if value.is_some_and(|v| v.eq_ignore_ascii_case("forte")) {
            TargetType::Forte
        } else {
            TargetType::Regular
        }
    }
}

impl From<TargetType> for String {
    fn from(value: TargetType) -> Self {
        value.as_str().to_string()
    }
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Regular => "regular",
            TargetType::Forte => "forte",
        }
    }
}

/// How the features of a query result are rendered.
///
/// The backend tags heatmap results `heatmap`; every other tag (normally
/// `instalacao`) renders as discrete markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ReturnType {
    #[default]
    Marker,
    Heatmap,
}

impl From<Option<String>> for ReturnType {
    fn from(value: Option<String>) -> Self {
        if value.is_some_and(|v| v.eq_ignore_ascii_case("heatmap")) {
            ReturnType::Heatmap
        } else {
            ReturnType::Marker
        }
    }
}

impl From<ReturnType> for String {
    fn from(value: ReturnType) -> Self {
        match value {
            ReturnType::Marker => "instalacao".to_string(),
            ReturnType::Heatmap => "heatmap".to_string(),
        }
    }
}

fn default_active() -> bool {
    true
}

/// A main query as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainQuery {
    #[serde(rename = "id_query")]
    pub id: MainQueryId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    /// Base color as `#RRGGBB`
    #[serde(rename = "cor", default)]
    pub color: Option<String>,
    #[serde(rename = "tipo_alvo", default)]
    pub target_type: TargetType,
    #[serde(rename = "ativa", default = "default_active")]
    pub active: bool,
}

/// An auxiliary query as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryQuery {
    #[serde(rename = "id_query")]
    pub id: AuxQueryId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "tipo_retorno", default)]
    pub return_type: ReturnType,
    #[serde(rename = "ativa", default = "default_active")]
    pub active: bool,
}
