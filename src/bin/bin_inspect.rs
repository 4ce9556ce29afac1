use std::path::PathBuf;

use anyhow::{Context, Result};
use binwatch::api::model::ClassificationQuery;
use binwatch::api::ApiClient;
use binwatch::config;
use binwatch::model::{BinCategory, BinSnapshot};
use chrono::NaiveDate;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Fetch the dashboard once and print the normalized bins")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Only show this bin (wet, reject, recyclable, hazardous)
    #[arg(long)]
    category: Option<BinCategory>,

    /// Also print collection history
    #[arg(long)]
    history: bool,

    /// Also print camera classifications
    #[arg(long)]
    classifications: bool,

    /// Classification filter on the detected waste type
    #[arg(long, requires = "classifications")]
    waste_type: Option<String>,

    /// Classifications on or after this date (YYYY-MM-DD)
    #[arg(long, requires = "classifications")]
    since: Option<NaiveDate>,

    /// Classifications on or before this date (YYYY-MM-DD)
    #[arg(long, requires = "classifications")]
    until: Option<NaiveDate>,

    /// Also print the raw sorting log
    #[arg(long)]
    waste_logs: bool,
}

fn print_bin(bin: &BinSnapshot) {
    println!(
        "  {:<11} {:<14} fill {:>5.1}%  capacity {:>6.1}  today {:>5.0}  yesterday {:>5.0}",
        bin.category().as_str(),
        bin.display_name(),
        bin.fill_level_percent(),
        bin.total_capacity(),
        bin.today_count(),
        bin.yesterday_count(),
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    let client = ApiClient::new(cfg.base_url()?)?;

    if let Some(auth) = &cfg.auth {
        client
            .login(&auth.email, &auth.password)
            .await
            .context("login failed")?;
    }

    let snapshot = client
        .fetch_dashboard()
        .await
        .context("failed to fetch dashboard")?;
    println!("Fetched at: {}", snapshot.fetched_at());
    println!("Total: {}", snapshot.total());
    println!("Bins:");
    match args.category {
        Some(cat) => print_bin(snapshot.bin(cat)),
        None => snapshot.bins().iter().for_each(print_bin),
    }

    if args.history {
        let rows = client
            .fetch_history(args.category)
            .await
            .context("failed to fetch history")?;
        println!("History:");
        for row in rows {
            println!(
                "  {} {:<11} collected {:>6.1}  classified {}",
                row.date, row.bin_type, row.total_collected, row.classification_count
            );
        }
    }

    if args.classifications {
        let query = ClassificationQuery {
            waste_type: args.waste_type,
            start_date: args.since,
            end_date: args.until,
        };
        let rows = client
            .fetch_classifications(&query)
            .await
            .context("failed to fetch classifications")?;
        println!("Classifications:");
        for row in rows {
            println!(
                "  #{:<5} {:<10} confidence {:>5.2}  device {}  {}",
                row.id,
                row.waste_type,
                row.confidence.unwrap_or(0.0),
                row.esp32_device_id.as_deref().unwrap_or("-"),
                row.created_at.as_deref().unwrap_or("-"),
            );
        }
    }

    if args.waste_logs {
        let rows = client
            .fetch_waste_logs()
            .await
            .context("failed to fetch waste logs")?;
        println!("Waste log:");
        for row in rows {
            println!(
                "  {} {:<10} -> {:<9} confidence {:>5.2}",
                row.timestamp.as_deref().unwrap_or("-"),
                row.waste_type,
                row.bin_type,
                row.confidence.unwrap_or(0.0),
            );
        }
    }
    Ok(())
}
