//! Installation detail, history and inspection status records, plus
//! per-area metrics.
//!
//! The backend serializes decimals as strings and timestamps either with or
//! without an offset; the deserializers here accept both forms.

use crate::error::Error;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default number of consumption months requested.
pub const DEFAULT_CONSUMPTION_LIMIT: u32 = 12;

/// Default number of service notes requested.
pub const DEFAULT_SERVICE_NOTE_LIMIT: u32 = 20;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn optional_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Parse `2024-01-15T10:30:00`, with optional fraction and offset.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok())
}

fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let value = String::deserialize(deserializer)?;
    parse_timestamp(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", value)))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstallationDetail {
    #[serde(rename = "id_instalacao")]
    pub installation_id: String,
    #[serde(deserialize_with = "decimal")]
    pub latitude: f64,
    #[serde(deserialize_with = "decimal")]
    pub longitude: f64,
    #[serde(rename = "municipio")]
    pub municipality: String,
    #[serde(rename = "classe_tarifaria", default)]
    pub tariff_class: Option<String>,
    #[serde(rename = "endereco", default)]
    pub address: Option<String>,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(deserialize_with = "timestamp")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConsumptionRecord {
    #[serde(rename = "data_referencia")]
    pub reference_date: NaiveDate,
    #[serde(rename = "consumo", deserialize_with = "decimal")]
    pub consumption: f64,
    #[serde(rename = "demanda", default, deserialize_with = "optional_decimal")]
    pub demand: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FraudRecord {
    #[serde(rename = "data_fraude")]
    pub date: NaiveDate,
    #[serde(rename = "tipo_fraude", default)]
    pub kind: Option<String>,
    #[serde(rename = "valor_recuperado", default, deserialize_with = "optional_decimal")]
    pub recovered_value: Option<f64>,
    #[serde(rename = "observacoes", default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceNote {
    #[serde(rename = "numero_nota")]
    pub number: String,
    #[serde(rename = "data_nota")]
    pub date: NaiveDate,
    #[serde(rename = "tipo_servico", default)]
    pub service_type: Option<String>,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Analyst decision on an installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionStatus {
    #[serde(rename = "selecionado")]
    Selected,
    #[serde(rename = "nao_selecionado")]
    NotSelected,
    #[serde(rename = "verificar")]
    ToVerify,
}

impl InspectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionStatus::Selected => "selecionado",
            InspectionStatus::NotSelected => "nao_selecionado",
            InspectionStatus::ToVerify => "verificar",
        }
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InspectionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "selecionado" => Ok(InspectionStatus::Selected),
            "nao_selecionado" => Ok(InspectionStatus::NotSelected),
            "verificar" => Ok(InspectionStatus::ToVerify),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// Body of a status update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub status: InspectionStatus,
    #[serde(rename = "usuario")]
    pub user: String,
    #[serde(rename = "observacoes")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusRecord {
    #[serde(rename = "id_instalacao")]
    pub installation_id: String,
    pub status: String,
    #[serde(rename = "usuario")]
    pub user: String,
    #[serde(rename = "data_atualizacao", deserialize_with = "timestamp")]
    pub updated_at: NaiveDateTime,
    #[serde(rename = "observacoes", default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TariffShare {
    #[serde(rename = "classe_tarifaria")]
    pub tariff_class: String,
    pub count: u64,
}

/// Aggregated figures for a named region or drawn polygon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AreaMetrics {
    #[serde(rename = "perimetro_km", default)]
    pub perimeter_km: Option<f64>,
    #[serde(rename = "total_instalacoes")]
    pub installations: u64,
    #[serde(rename = "total_fraudes_5anos")]
    pub frauds_last_five_years: u64,
    #[serde(rename = "distribuicao_tarifa", default)]
    pub tariff_distribution: Vec<TariffShare>,
}
