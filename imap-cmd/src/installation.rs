//! `installation` and `metrics`.

use crate::area::AreaChoice;
use crate::AreaArgs;
use imap_api::{ClientConfig, HttpQueryApi, InstallationApi};
use imap_core::installation::StatusUpdate;
use log::info;

pub async fn run_installation(
    config: &ClientConfig,
    id: &str,
    consumption_limit: u32,
    notes_limit: u32,
    status_update: Option<StatusUpdate>,
) -> anyhow::Result<()> {
    let api = HttpQueryApi::new(config)?;

    if let Some(update) = status_update {
        let record = api.update_installation_status(id, &update).await?;
        info!("Status of {} set to {} by {}", id, record.status, record.user);
    }

    let (detail, consumption, frauds, notes, status) = tokio::try_join!(
        api.installation_detail(id),
        api.consumption_history(id, consumption_limit),
        api.fraud_history(id),
        api.service_notes(id, notes_limit),
        api.installation_status(id),
    )?;

    println!("{}  {}", detail.installation_id, detail.municipality);
    println!("  position   {:.5}, {:.5}", detail.latitude, detail.longitude);
    if let Some(tariff) = &detail.tariff_class {
        println!("  tariff     {}", tariff);
    }
    if let Some(address) = &detail.address {
        println!("  address    {}", address);
    }
    match &status {
        Some(status) => println!(
            "  status     {} ({}, {})",
            status.status, status.user, status.updated_at
        ),
        None => println!("  status     none"),
    }

    println!("Consumption ({} months)", consumption.len());
    for record in &consumption {
        match record.demand {
            Some(demand) => println!("  {}  {:>10.2}  {:>8.2}", record.reference_date, record.consumption, demand),
            None => println!("  {}  {:>10.2}", record.reference_date, record.consumption),
        }
    }

    println!("Frauds ({})", frauds.len());
    for fraud in &frauds {
        println!(
            "  {}  {}",
            fraud.date,
            fraud.kind.as_deref().unwrap_or("-")
        );
    }

    println!("Service notes ({})", notes.len());
    for note in &notes {
        println!(
            "  {}  {}  {}",
            note.date,
            note.number,
            note.service_type.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub async fn run_metrics(config: &ClientConfig, area: &AreaArgs) -> anyhow::Result<()> {
    let api = HttpQueryApi::new(config)?;
    let filter = AreaChoice::from_args(area)?.into_filter()?;
    let metrics = api.area_metrics(&filter).await?;

    match metrics.perimeter_km {
        Some(km) => println!("perimeter      {:.1} km", km),
        None => println!("perimeter      unknown"),
    }
    println!("installations  {}", metrics.installations);
    println!("frauds (5y)    {}", metrics.frauds_last_five_years);
    for share in &metrics.tariff_distribution {
        println!("  {:<20} {}", share.tariff_class, share.count);
    }
    Ok(())
}
