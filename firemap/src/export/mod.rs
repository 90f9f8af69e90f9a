//! Modules d'export (CSV, JSON, GeoJSON)

pub mod geojson;
pub mod rows;

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use firedata::{SeasonBenchmarks, StatusShare, SummaryStats};

pub use rows::{collect_rows, FireRow};

/// Format de la table des feux
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Geojson,
}

/// Exporte les lignes dans le format demandé
pub fn export_rows(rows: &[FireRow], format: ExportFormat, output_path: &Path) -> Result<()> {
    match format {
        ExportFormat::Csv => rows::export_csv(rows, output_path),
        ExportFormat::Json => rows::export_json(rows, output_path),
        ExportFormat::Geojson => self::geojson::export_to_geojson(rows, output_path),
    }
}

/// Document de statistiques exporté
#[derive(Debug, Serialize)]
pub struct StatsDocument<'a> {
    /// Instant de calcul (RFC 3339)
    pub generated_at: String,
    pub timezone: String,
    #[serde(flatten)]
    pub stats: &'a SummaryStats,
    pub active_shares: Vec<StatusShare>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmarks: Option<&'a SeasonBenchmarks>,
}

impl<'a> StatsDocument<'a> {
    pub fn new(
        stats: &'a SummaryStats,
        timezone: &str,
        benchmarks: Option<&'a SeasonBenchmarks>,
    ) -> Self {
        Self {
            generated_at: rows::iso_timestamp(stats.generated_at_ms).unwrap_or_default(),
            timezone: timezone.to_string(),
            stats,
            active_shares: stats.active_shares(),
            benchmarks,
        }
    }
}

/// Exporte les statistiques en JSON
pub fn export_stats(document: &StatsDocument<'_>, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(output_path, json)
        .context(format!("Failed to write file: {}", output_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use firedata::{FireStore, StatusKey};

    #[test]
    fn test_stats_document() {
        let stats = firedata::summarize(&FireStore::new(), chrono_tz::UTC, 0);
        let bench = SeasonBenchmarks {
            this_year_count: Some(4.0),
            ..Default::default()
        };
        let doc = StatsDocument::new(&stats, "UTC", Some(&bench));
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["generated_at"], "1970-01-01T00:00:00.000Z");
        assert_eq!(json["total_count"], 0);
        assert_eq!(json["counts_by_status"][StatusKey::OutOfControl.as_str()], 0);
        assert_eq!(json["benchmarks"]["this_year_count"], 4.0);
        assert!(json["active_shares"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ExportFormat::from_str("geojson", true).unwrap(), ExportFormat::Geojson);
        assert_eq!(ExportFormat::default(), ExportFormat::Csv);
    }
}
