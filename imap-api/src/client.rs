//! REST implementation of the fetch ports.

use crate::api::{InstallationApi, QueryApi};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use imap_core::installation::{
    AreaMetrics, ConsumptionRecord, FraudRecord, InstallationDetail, ServiceNote, StatusRecord,
    StatusUpdate,
};
use imap_core::{
    AreaFilter, AuxQueryId, AuxiliaryQuery, Bounds, MainQuery, MainQueryId, NamedRegion,
    QueryResult, RegionOutline,
};
use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

/// Decode a query result body. A `metadata.error` set by the backend is a
/// failure of that query, not an empty result.
pub(crate) fn decode_result(query: &str, body: &str) -> Result<QueryResult> {
    let result = QueryResult::from_json(body)?;
    match result.backend_error() {
        Some(message) => Err(ApiError::Backend {
            query: query.to_string(),
            message: message.to_string(),
        }),
        None => Ok(result),
    }
}

/// HTTP client for the inspection backend.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpQueryApi {
    client: Client,
    base: Url,
}

impl HttpQueryApi {
    /// Builds a client for `config.base_url`.
    ///
    /// # Errors
    ///
    /// `ApiError::InvalidUrl` if the base URL does not parse or cannot carry
    /// path segments, `ApiError::HttpRequest` if the TLS backend fails to
    /// initialise.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url.clone()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                url: response.url().to_string(),
            });
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send(request).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        self.read_json(self.client.get(url)).await
    }

    async fn get_result(&self, query: String, request: RequestBuilder) -> Result<QueryResult> {
        let body = self.send(request).await?.text().await?;
        let result = decode_result(&query, &body)?;
        debug!("Query {} returned {} features", query, result.len());
        Ok(result)
    }

    fn auxiliary_request(&self, id: AuxQueryId, area: &AreaFilter) -> Result<RequestBuilder> {
        let path = id.0.to_string();
        let url = self.endpoint(&["queries", "auxiliary", &path, "results"])?;
        debug!("GET {} area_type={}", url, area.area_type());
        Ok(self.client.get(url).query(&[
            ("area_type", area.area_type().to_string()),
            ("area_value", area.area_value()?),
        ]))
    }
}

#[async_trait]
impl QueryApi for HttpQueryApi {
    async fn list_main_queries(&self) -> Result<Vec<MainQuery>> {
        let queries: Vec<MainQuery> = self.get_json(self.endpoint(&["queries", "main"])?).await?;
        info!("Loaded {} main queries", queries.len());
        Ok(queries)
    }

    async fn fetch_main_query_result(
        &self,
        id: MainQueryId,
        bounds: Option<Bounds>,
    ) -> Result<QueryResult> {
        let path = id.0.to_string();
        let url = self.endpoint(&["queries", "main", &path, "results"])?;
        debug!("GET {} bounds={:?}", url, bounds);
        let mut request = self.client.get(url);
        if let Some(bounds) = bounds {
            request = request.query(&[("bounds", bounds.to_string())]);
        }
        self.get_result(format!("main {}", id), request).await
    }

    async fn list_auxiliary_queries(&self) -> Result<Vec<AuxiliaryQuery>> {
        let queries: Vec<AuxiliaryQuery> =
            self.get_json(self.endpoint(&["queries", "auxiliary"])?).await?;
        info!("Loaded {} auxiliary queries", queries.len());
        Ok(queries)
    }

    async fn fetch_auxiliary_query_result(
        &self,
        id: AuxQueryId,
        area: &AreaFilter,
    ) -> Result<QueryResult> {
        let request = self.auxiliary_request(id, area)?;
        self.get_result(format!("auxiliary {}", id), request).await
    }

    async fn list_named_regions(&self) -> Result<Vec<NamedRegion>> {
        let regions: Vec<NamedRegion> = self
            .get_json(self.endpoint(&["areas", "municipalities"])?)
            .await?;
        info!("Loaded {} named regions", regions.len());
        Ok(regions)
    }

    async fn fetch_named_region_geometry(&self, name: &str) -> Result<RegionOutline> {
        let url = self.endpoint(&["areas", "municipalities", name, "geometry"])?;
        debug!("GET {}", url);
        let body = self.send(self.client.get(url)).await?.text().await?;
        Ok(RegionOutline::from_feature_json(name, &body)?)
    }
}

#[async_trait]
impl InstallationApi for HttpQueryApi {
    async fn installation_detail(&self, installation_id: &str) -> Result<InstallationDetail> {
        self.get_json(self.endpoint(&["installations", installation_id])?)
            .await
    }

    async fn consumption_history(
        &self,
        installation_id: &str,
        limit: u32,
    ) -> Result<Vec<ConsumptionRecord>> {
        let url = self.endpoint(&["installations", installation_id, "consumption"])?;
        debug!("GET {} limit={}", url, limit);
        self.read_json(self.client.get(url).query(&[("limit", limit)]))
            .await
    }

    async fn fraud_history(&self, installation_id: &str) -> Result<Vec<FraudRecord>> {
        self.get_json(self.endpoint(&["installations", installation_id, "frauds"])?)
            .await
    }

    async fn service_notes(&self, installation_id: &str, limit: u32) -> Result<Vec<ServiceNote>> {
        let url = self.endpoint(&["installations", installation_id, "service-notes"])?;
        debug!("GET {} limit={}", url, limit);
        self.read_json(self.client.get(url).query(&[("limit", limit)]))
            .await
    }

    async fn installation_status(&self, installation_id: &str) -> Result<Option<StatusRecord>> {
        let url = self.endpoint(&["installations", installation_id, "status"])?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status(),
                url: response.url().to_string(),
            });
        }
        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn update_installation_status(
        &self,
        installation_id: &str,
        update: &StatusUpdate,
    ) -> Result<StatusRecord> {
        let url = self.endpoint(&["installations", installation_id, "status"])?;
        info!("PUT {} status={:?}", url, update.status);
        self.read_json(self.client.put(url).json(update)).await
    }

    async fn area_metrics(&self, area: &AreaFilter) -> Result<AreaMetrics> {
        let url = self.endpoint(&["areas", "metrics"])?;
        debug!("POST {} tipo={}", url, area.area_type());
        let body = serde_json::json!({
            "tipo": area.area_type(),
            "valor": area.to_json_value(),
        });
        self.read_json(self.client.post(url).json(&body)).await
    }
}
