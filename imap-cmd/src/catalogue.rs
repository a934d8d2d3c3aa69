//! `queries` and `regions`: list what can be selected.

use imap_api::{ClientConfig, HttpQueryApi, QueryApi};
use imap_core::Rgb;

pub async fn run_queries(config: &ClientConfig) -> anyhow::Result<()> {
    let api = HttpQueryApi::new(config)?;
    let (main, auxiliary) = tokio::try_join!(api.list_main_queries(), api.list_auxiliary_queries())?;

    println!("Main queries");
    for query in main.iter().filter(|q| q.active) {
        println!(
            "  {:>4}  {}  {:<8} {}",
            query.id.0,
            Rgb::parse_or_fallback(query.color.as_deref()),
            query.target_type.as_str(),
            query.name
        );
    }

    println!("Auxiliary queries");
    for query in auxiliary.iter().filter(|q| q.active) {
        let kind = match query.return_type {
            imap_core::ReturnType::Heatmap => "heatmap",
            imap_core::ReturnType::Marker => "markers",
        };
        println!("  {:>4}  {:<8} {}", query.id.0, kind, query.name);
    }
    Ok(())
}

pub async fn run_regions(config: &ClientConfig) -> anyhow::Result<()> {
    let api = HttpQueryApi::new(config)?;
    for region in api.list_named_regions().await? {
        match region.population {
            Some(population) => println!("{:>6}  {} ({})", region.id, region.name, population),
            None => println!("{:>6}  {}", region.id, region.name),
        }
    }
    Ok(())
}
