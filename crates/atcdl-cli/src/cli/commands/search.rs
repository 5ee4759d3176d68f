//! `atcdl search <ICAO>`: list stations and their frequencies.

use anyhow::{Context, Result};
use atcdl_core::config::AtcConfig;
use atcdl_core::lookup::{LiveAtcLookup, StationLookup, StationRecord};

pub async fn run_search(cfg: &AtcConfig, icao: &str, json: bool) -> Result<()> {
    let lookup = LiveAtcLookup::from_config(cfg);
    let query = icao.trim().to_uppercase();
    let q = query.clone();
    let stations: Vec<StationRecord> = tokio::task::spawn_blocking(move || {
        lookup.search(&q).map(|found| found.collect::<Vec<_>>())
    })
    .await?
    .with_context(|| format!("searching stations for {}", query))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stations)?);
        return Ok(());
    }
    if stations.is_empty() {
        println!("No stations found for {}.", query);
        return Ok(());
    }
    for s in &stations {
        println!(
            "{:<4} [{}] - {}",
            if s.up { "UP" } else { "DOWN" },
            s.identifier,
            s.title
        );
        for f in &s.frequencies {
            println!("       {}: {}", f.title, f.frequency);
        }
    }
    println!("Found {} station(s)", stations.len());
    Ok(())
}
