//! Fetch ports. The session only ever talks to the backend through these
//! traits, so tests and headless drivers can substitute their own.

use crate::error::Result;
use async_trait::async_trait;
use imap_core::installation::{
    AreaMetrics, ConsumptionRecord, FraudRecord, InstallationDetail, ServiceNote, StatusRecord,
    StatusUpdate,
};
use imap_core::{
    AreaFilter, AuxQueryId, AuxiliaryQuery, Bounds, MainQuery, MainQueryId, NamedRegion,
    QueryResult, RegionOutline,
};

/// Query catalogue, query results and named regions.
#[async_trait]
pub trait QueryApi: Send + Sync {
    async fn list_main_queries(&self) -> Result<Vec<MainQuery>>;

    /// Results of one main query, optionally restricted to `bounds`.
    async fn fetch_main_query_result(
        &self,
        id: MainQueryId,
        bounds: Option<Bounds>,
    ) -> Result<QueryResult>;

    async fn list_auxiliary_queries(&self) -> Result<Vec<AuxiliaryQuery>>;

    /// Results of one auxiliary query scoped to `area`.
    async fn fetch_auxiliary_query_result(
        &self,
        id: AuxQueryId,
        area: &AreaFilter,
    ) -> Result<QueryResult>;

    async fn list_named_regions(&self) -> Result<Vec<NamedRegion>>;

    async fn fetch_named_region_geometry(&self, name: &str) -> Result<RegionOutline>;
}

/// Per-installation records and per-area metrics.
#[async_trait]
pub trait InstallationApi: Send + Sync {
    async fn installation_detail(&self, installation_id: &str) -> Result<InstallationDetail>;

    /// Most recent `limit` months, oldest first.
    async fn consumption_history(
        &self,
        installation_id: &str,
        limit: u32,
    ) -> Result<Vec<ConsumptionRecord>>;

    async fn fraud_history(&self, installation_id: &str) -> Result<Vec<FraudRecord>>;

    async fn service_notes(&self, installation_id: &str, limit: u32) -> Result<Vec<ServiceNote>>;

    /// Current status, or `None` when no analyst has set one yet.
    async fn installation_status(&self, installation_id: &str) -> Result<Option<StatusRecord>>;

    async fn update_installation_status(
        &self,
        installation_id: &str,
        update: &StatusUpdate,
    ) -> Result<StatusRecord>;

    async fn area_metrics(&self, area: &AreaFilter) -> Result<AreaMetrics>;
}
