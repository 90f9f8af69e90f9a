//! Définition et implémentation des commandes CLI
//!
//! - `summary`, `trend`, `ranked`, `nearby`: vues sur les feux chargés
//! - `export`: table des feux en CSV / JSON / GeoJSON
//! - `cities`, `report`: configuration et rapport de chargement

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::Subcommand;
use tracing::{info, warn};

use firedata::status::display_status;
use firedata::{worst_status, GeoLocation, SeasonBenchmarks, StatusFilter, StatusKey};
use firemap::export::{collect_rows, export_rows, export_stats, ExportFormat, StatsDocument};
use firemap::{load_dataset, Config, Dataset, LoadStatus};

#[derive(Subcommand)]
pub enum Commands {
    /// Overview: counts per status, today / yesterday, season benchmarks
    Summary {
        /// Also write the statistics as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Weekly series of new, extinguished and active fires
    Trend,

    /// Fires grouped by status (worst first)
    Ranked {
        /// Only these statuses (repeatable, e.g. --status "out of control")
        #[arg(long)]
        status: Vec<String>,
    },

    /// Active fires near a city or a coordinate
    Nearby {
        /// City name from the configuration
        #[arg(long, conflicts_with_all = ["lat", "lng"])]
        city: Option<String>,

        /// Latitude (degrees)
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude (degrees)
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,

        /// Search radius in meters (défaut : config)
        #[arg(long)]
        radius: Option<f64>,
    },

    /// Export the fire table
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Also write the statistics as JSON
        #[arg(long)]
        stats: Option<PathBuf>,
    },

    /// List configured reference cities
    Cities,

    /// Show the source loading report
    Report {
        /// Also save the report as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Instant de référence: `--now` ou l'horloge
pub fn parse_now(value: Option<&str>) -> Result<DateTime<Utc>> {
    match value {
        Some(text) => Ok(DateTime::parse_from_rfc3339(text.trim())
            .context(format!("Invalid --now value (expected RFC 3339): {}", text))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

/// Exécute une commande
pub fn run(command: Commands, config: &Config, now: DateTime<Utc>) -> Result<()> {
    if let Commands::Cities = command {
        return cmd_cities(config);
    }

    let dataset = load_dataset(config, now)?;
    if dataset.report.status != LoadStatus::Success {
        warn!(summary = %dataset.report.summary(), "Some sources could not be loaded");
    }

    let now_ms = now.timestamp_millis();
    match command {
        Commands::Summary { json } => cmd_summary(&dataset, config, now_ms, json.as_deref()),
        Commands::Trend => cmd_trend(&dataset, now_ms),
        Commands::Ranked { status } => cmd_ranked(&dataset, &status),
        Commands::Nearby {
            city,
            lat,
            lng,
            radius,
        } => cmd_nearby(&dataset, config, city.as_deref(), lat.zip(lng), radius),
        Commands::Export {
            output,
            format,
            stats,
        } => cmd_export(&dataset, config, now_ms, &output, format, stats.as_deref()),
        Commands::Report { output } => cmd_report(&dataset, output.as_deref()),
        Commands::Cities => cmd_cities(config),
    }
}

fn format_day(epoch_ms: Option<i64>, tz: Tz) -> String {
    epoch_ms
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.with_timezone(&tz).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Exécute la commande summary
pub fn cmd_summary(
    dataset: &Dataset,
    config: &Config,
    now_ms: i64,
    json: Option<&Path>,
) -> Result<()> {
    let stats = dataset.context.summarize(now_ms);

    println!("=== Fires ({}) ===", config.timezone);
    println!(
        "Total: {} ({} active, {} extinguished)",
        stats.total_count, stats.active_count, stats.extinguished_count
    );
    println!("Burned area: {:.1} ha", stats.total_area_hectares);
    println!(
        "Detected: {} today, {} yesterday",
        stats.detected_today, stats.detected_yesterday
    );
    println!(
        "Extinguished: {} today, {} yesterday",
        stats.extinguished_today, stats.extinguished_yesterday
    );

    println!("\nPer status:");
    for (key, count) in &stats.counts_by_status {
        println!(
            "  {:<16} {:>5}  {}",
            key.label(),
            count,
            config.palette.color(*key)
        );
    }

    let shares = stats.active_shares();
    if !shares.is_empty() {
        println!("\nActive shares:");
        for share in &shares {
            println!(
                "  {:<16} {:>5}  {:>6.1}° - {:>6.1}°",
                share.key.label(),
                share.count,
                share.start_deg,
                share.end_deg
            );
        }
    }

    if let Some(bench) = &dataset.benchmarks {
        print_benchmarks(bench);
    }

    if let Some(path) = json {
        let document = StatsDocument::new(&stats, &config.timezone, dataset.benchmarks.as_ref());
        export_stats(&document, path)?;
        info!(output = %path.display(), "Statistics written");
    }

    Ok(())
}

fn print_benchmarks(bench: &SeasonBenchmarks) {
    fn show(value: Option<f64>) -> String {
        value
            .map(|v| format!("{:.0}", v))
            .unwrap_or_else(|| "-".to_string())
    }

    println!("\nSeason:");
    println!(
        "  This year:     {:>6} fires {:>10} ha",
        show(bench.this_year_count),
        show(bench.this_year_area_hectares)
    );
    println!(
        "  Last year:     {:>6} fires {:>10} ha",
        show(bench.last_year_count),
        show(bench.last_year_area_hectares)
    );
    println!(
        "  10-year avg:   {:>6} fires {:>10} ha",
        show(bench.avg_10y_fires),
        show(bench.avg_10y_area_hectares)
    );
}

/// Exécute la commande trend
pub fn cmd_trend(dataset: &Dataset, now_ms: i64) -> Result<()> {
    let series = dataset.context.weekly_trend(now_ms);
    if series.is_empty() {
        println!("No dated fires");
        return Ok(());
    }

    println!("{:<12} {:>6} {:>6} {:>7}", "Week", "New", "Out", "Active");
    for i in 0..series.len() {
        println!(
            "{:<12} {:>6} {:>6} {:>7}",
            format_day(Some(series.week_starts[i]), chrono_tz::UTC),
            series.new_counts[i],
            series.out_counts[i],
            series.active_counts[i]
        );
    }
    Ok(())
}

fn status_filter(names: &[String]) -> Result<StatusFilter> {
    if names.is_empty() {
        return Ok(StatusFilter::all());
    }
    let mut filter = StatusFilter::none();
    for name in names {
        let key = StatusKey::from_text(name);
        if key == StatusKey::Other && name.trim().to_lowercase() != StatusKey::Other.as_str() {
            anyhow::bail!("Unknown status: {}", name);
        }
        filter.enable(key);
    }
    Ok(filter)
}

/// Exécute la commande ranked
pub fn cmd_ranked(dataset: &Dataset, statuses: &[String]) -> Result<()> {
    let filter = status_filter(statuses)?;
    let tz = dataset.context.time_zone();

    for (key, records) in dataset.context.ranked_by_status() {
        if !filter.is_enabled(key) || records.is_empty() {
            continue;
        }
        println!("\n=== {} ({}) ===", key.label(), records.len());
        for record in records {
            let date = if record.is_extinguished() {
                record.extinguished_at_ms
            } else {
                record.detected_at_ms
            };
            println!(
                "  {:<40} {:>10.1} ha  {}",
                record.name,
                record.area_hectares,
                format_day(date, tz)
            );
        }
    }
    Ok(())
}

/// Exécute la commande nearby
pub fn cmd_nearby(
    dataset: &Dataset,
    config: &Config,
    city: Option<&str>,
    coordinate: Option<(f64, f64)>,
    radius: Option<f64>,
) -> Result<()> {
    let (label, reference) = match (city, coordinate) {
        (Some(name), _) => {
            let city = config
                .find_city(name)
                .with_context(|| format!("Unknown city: {}", name))?;
            (city.name.clone(), city.location())
        }
        (None, Some((lat, lng))) => (format!("{:.4}, {:.4}", lat, lng), GeoLocation::new(lat, lng)),
        (None, None) => anyhow::bail!("Provide --city or --lat and --lng"),
    };

    let radius = radius.unwrap_or(dataset.context.radius_m());
    let nearby = dataset.context.nearby_within(reference, radius);

    println!(
        "=== Active fires within {:.0} km of {} ({}) ===",
        radius / 1000.0,
        label,
        nearby.len()
    );
    for fire in &nearby {
        println!(
            "  {:>7.1} km  {:<40} {}",
            fire.distance_meters / 1000.0,
            fire.record.name,
            display_status(fire.record)
        );
    }

    if let Some(worst) = worst_status(nearby.iter().map(|fire| fire.record.status_key)) {
        println!("Worst status: {} ({})", worst.label(), config.palette.color(worst));
    }
    Ok(())
}

/// Exécute la commande export
pub fn cmd_export(
    dataset: &Dataset,
    config: &Config,
    now_ms: i64,
    output: &Path,
    format: ExportFormat,
    stats: Option<&Path>,
) -> Result<()> {
    let rows = collect_rows(dataset.context.store());
    export_rows(&rows, format, output)?;
    println!("{} fires written to {}", rows.len(), output.display());

    if let Some(path) = stats {
        let summary = dataset.context.summarize(now_ms);
        let document = StatsDocument::new(&summary, &config.timezone, dataset.benchmarks.as_ref());
        export_stats(&document, path)?;
        println!("Statistics written to {}", path.display());
    }
    Ok(())
}

/// Exécute la commande cities
pub fn cmd_cities(config: &Config) -> Result<()> {
    println!("{:<28} {:>9} {:>10} {:>10}", "City", "Lat", "Lng", "Population");
    for city in &config.cities {
        println!(
            "{:<28} {:>9.4} {:>10.4} {:>10}",
            city.name, city.lat, city.lng, city.population
        );
    }
    Ok(())
}

/// Exécute la commande report
pub fn cmd_report(dataset: &Dataset, output: Option<&Path>) -> Result<()> {
    dataset.report.display();
    if let Some(path) = output {
        dataset.report.save_to_file(path)?;
        println!("Report saved to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_now() {
        let now = parse_now(Some("2024-07-15T12:00:00-04:00")).unwrap();
        assert_eq!(now.to_rfc3339(), "2024-07-15T16:00:00+00:00");
        assert!(parse_now(Some("yesterday")).is_err());
        assert!(parse_now(None).is_ok());
    }

    #[test]
    fn test_status_filter() {
        let filter = status_filter(&["Out of Control".to_string()]).unwrap();
        assert!(filter.is_enabled(StatusKey::OutOfControl));
        assert!(!filter.is_enabled(StatusKey::Contained));

        assert!(status_filter(&[]).unwrap().is_enabled(StatusKey::Extinguished));
        assert!(status_filter(&["on fire".to_string()]).is_err());
    }

    #[test]
    fn test_format_day() {
        // 2024-07-15T02:00Z est encore le 14 à Moncton
        let ms = 1_721_008_800_000;
        assert_eq!(format_day(Some(ms), chrono_tz::America::Moncton), "2024-07-14");
        assert_eq!(format_day(Some(ms), chrono_tz::UTC), "2024-07-15");
        assert_eq!(format_day(None, chrono_tz::UTC), "-");
    }
}
