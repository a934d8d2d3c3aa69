//! `main` and `auxiliary`: run one fetch cycle through a headless session
//! and print what the map would show.

use crate::area::AreaChoice;
use crate::export::write_layers_to_path;
use crate::headless::LoggingDrawTool;
use crate::AreaArgs;
use anyhow::bail;
use imap_api::{ApiError, ClientConfig, HttpQueryApi, QueryApi};
use imap_core::{AreaKind, AuxQueryId, Bounds, MainQueryId, QueryKey, RegionOutline};
use imap_session::{Aggregate, CycleReport, Session, Summary};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

fn headless_session(config: &ClientConfig) -> anyhow::Result<(Session, Arc<dyn QueryApi>)> {
    let api: Arc<dyn QueryApi> = Arc::new(HttpQueryApi::new(config)?);
    Ok((Session::new(Arc::clone(&api), Box::new(LoggingDrawTool)), api))
}

/// Only an unknown region stops the run; the outline is not needed for the
/// auxiliary fetches themselves.
fn check_region(name: &str, outline: imap_api::Result<RegionOutline>) -> anyhow::Result<()> {
    match outline {
        Ok(_) => Ok(()),
        Err(ApiError::Core(imap_core::Error::RegionNotFound(_))) => {
            bail!("region {} not found", name)
        }
        Err(e) => {
            warn!("Could not load outline of {}: {}", name, e);
            Ok(())
        }
    }
}

fn print_summary<K: QueryKey>(aggregate: &Aggregate<K>, report: &CycleReport<K>) {
    let summary = Summary::of(aggregate);
    println!("{} installations", summary.total);
    for row in &summary.rows {
        println!("  {:>8}  {}  {:<40} {}", row.id.to_string(), row.color, row.name, row.count);
    }
    for key in &report.failed {
        println!("  {:>8}  failed", key.to_string());
    }
}

pub async fn run_main(
    config: &ClientConfig,
    queries: &[i64],
    bounds: Option<Bounds>,
    csv: Option<&Path>,
) -> anyhow::Result<()> {
    let (mut session, _) = headless_session(config)?;

    // Only the last cycle has to run; each toggle supersedes the one before.
    let mut pending = session.set_bounds(bounds);
    for id in queries.iter().copied().map(MainQueryId) {
        if !session.main_selection().contains(&id) {
            pending = session.toggle_main_query(id);
        }
    }
    let report = pending.await;

    let results = session.main_results();
    print_summary(&results, &report);

    if let Some(path) = csv {
        let rows = write_layers_to_path(path, &session.main_markers(), &[])?;
        info!("Wrote {} rows to {}", rows, path.display());
    }
    Ok(())
}

pub async fn run_auxiliary(
    config: &ClientConfig,
    queries: &[i64],
    area: &AreaArgs,
    csv: Option<&Path>,
) -> anyhow::Result<()> {
    let (mut session, api) = headless_session(config)?;

    match AreaChoice::from_args(area)? {
        AreaChoice::Region(name) => {
            check_region(&name, api.fetch_named_region_geometry(&name).await)?;
            session.choose_area_mode(AreaKind::NamedRegion).await;
            session.select_named_region(Some(name)).await;
        }
        AreaChoice::Polygon(geometry) => {
            session.choose_area_mode(AreaKind::Polygon).await;
            session.on_polygon_created(geometry)?.await;
        }
    }

    let mut pending = None;
    for id in queries.iter().copied().map(AuxQueryId) {
        if !session.auxiliary_selection().contains(&id) {
            pending = Some(session.toggle_auxiliary_query(id));
        }
    }
    let Some(pending) = pending else {
        bail!("no auxiliary query given");
    };
    let report = pending.await;

    let results = session.auxiliary_results();
    print_summary(&results, &report);
    let layers = session.auxiliary_layers();
    println!(
        "{} markers, {} heatmap samples",
        layers.markers.len(),
        layers.heat.len()
    );

    if let Some(path) = csv {
        let rows = write_layers_to_path(path, &layers.markers, &layers.heat)?;
        info!("Wrote {} rows to {}", rows, path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_an_unknown_region_stops_the_run() {
        let missing = Err(imap_core::Error::RegionNotFound("Atlantida".into()).into());
        let err = check_region("Atlantida", missing).unwrap_err();
        assert_eq!(err.to_string(), "region Atlantida not found");

        let unreachable = Err(ApiError::InvalidUrl("http://[::1".into()));
        assert!(check_region("Natal", unreachable).is_ok());

        let backend = Err(ApiError::Backend {
            query: "outline".into(),
            message: "timeout".into(),
        });
        assert!(check_region("Natal", backend).is_ok());
    }
}
