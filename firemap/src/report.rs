//! Rapport de chargement des sources
//!
//! Collecte, pour une exécution, ce qui a été lu, ignoré et modifié dans
//! le store. Une source manquante ou illisible n'interrompt pas le
//! chargement des autres.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use firedata::ReloadReport;

/// Statut global du chargement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadStatus {
    /// Toutes les sources chargées
    Success,
    /// Au moins une source chargée, au moins une en échec
    PartialSuccess,
    /// Aucune source chargée
    Failed,
}

/// Niveau de sévérité des erreurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorLevel {
    /// Erreur fatale: chargement abandonné
    Fatal,
    /// Erreur: source ignorée
    Error,
}

/// Erreur de chargement avec contexte
#[derive(Debug, Clone, Serialize)]
pub struct LoadError {
    pub level: ErrorLevel,
    /// Nom de la source (optionnel)
    pub source: Option<String>,
    pub message: String,
    /// Détails supplémentaires (optionnel)
    pub details: Option<String>,
}

/// Warning de chargement
#[derive(Debug, Clone, Serialize)]
pub struct LoadWarning {
    pub source: String,
    pub message: String,
}

/// Statistiques par source
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceStats {
    pub accepted: usize,
    pub skipped: usize,
    pub malformed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
}

impl SourceStats {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

/// Rapport complet de chargement
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Instant de référence (RFC 3339)
    pub generated_at: String,
    pub duration_secs: f64,
    pub status: LoadStatus,

    pub sources_processed: usize,
    pub sources_failed: usize,
    pub features_accepted: usize,
    /// Features non ponctuelles
    pub features_skipped: usize,
    /// Entrées qui ne sont pas des features valides
    pub features_malformed: usize,
    pub records_inserted: usize,
    pub records_updated: usize,
    pub records_unchanged: usize,
    pub records_removed: usize,

    pub by_source: BTreeMap<String, SourceStats>,

    pub errors: Vec<LoadError>,
    pub warnings: Vec<LoadWarning>,
}

impl Default for LoadReport {
    fn default() -> Self {
        Self {
            generated_at: String::new(),
            duration_secs: 0.0,
            status: LoadStatus::Success,
            sources_processed: 0,
            sources_failed: 0,
            features_accepted: 0,
            features_skipped: 0,
            features_malformed: 0,
            records_inserted: 0,
            records_updated: 0,
            records_unchanged: 0,
            records_removed: 0,
            by_source: BTreeMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl LoadReport {
    pub fn new(generated_at: &str) -> Self {
        Self {
            generated_at: generated_at.to_string(),
            ..Default::default()
        }
    }

    /// Enregistre le rechargement d'une partition depuis une source
    pub fn record_reload(&mut self, source: &str, reload: &ReloadReport, malformed: usize) {
        self.sources_processed += 1;
        self.features_accepted += reload.accepted;
        self.features_skipped += reload.skipped;
        self.features_malformed += malformed;
        self.records_inserted += reload.inserted;
        self.records_updated += reload.updated;
        self.records_unchanged += reload.unchanged;
        self.records_removed += reload.removed;

        let stats = self.by_source.entry(source.to_string()).or_default();
        stats.accepted += reload.accepted;
        stats.skipped += reload.skipped;
        stats.malformed += malformed;
        stats.inserted += reload.inserted;
        stats.updated += reload.updated;
        stats.unchanged += reload.unchanged;
        stats.removed += reload.removed;

        if malformed > 0 {
            self.record_warning(source, &format!("{} malformed feature(s) ignored", malformed));
        }
        if reload.duplicates > 0 {
            self.record_warning(
                source,
                &format!("{} duplicate id(s), last one kept", reload.duplicates),
            );
        }
    }

    /// Enregistre une source chargée hors store (ex: repères de saison)
    pub fn record_source_success(&mut self) {
        self.sources_processed += 1;
    }

    /// Enregistre une source en échec
    pub fn record_source_failure(&mut self, source: &str, message: &str) {
        self.sources_processed += 1;
        self.sources_failed += 1;
        self.errors.push(LoadError {
            level: ErrorLevel::Error,
            source: Some(source.to_string()),
            message: message.to_string(),
            details: None,
        });
    }

    pub fn record_error(&mut self, error: LoadError) {
        self.errors.push(error);
    }

    pub fn record_warning(&mut self, source: &str, message: &str) {
        self.warnings.push(LoadWarning {
            source: source.to_string(),
            message: message.to_string(),
        });
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        let has_fatal = self.errors.iter().any(|e| e.level == ErrorLevel::Fatal);
        let loaded = self.sources_processed - self.sources_failed;

        self.status = if has_fatal || (self.sources_processed > 0 && loaded == 0) {
            LoadStatus::Failed
        } else if self.sources_failed > 0 {
            LoadStatus::PartialSuccess
        } else {
            LoadStatus::Success
        };
    }

    /// Nombre total d'enregistrements issus du chargement
    pub fn total_records(&self) -> usize {
        self.records_inserted + self.records_updated + self.records_unchanged
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("LOAD REPORT - {}", self.generated_at);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!(
            "Sources: {} processed, {} failed",
            self.sources_processed, self.sources_failed
        );
        println!(
            "Features: {} accepted, {} skipped, {} malformed",
            self.features_accepted, self.features_skipped, self.features_malformed
        );
        println!(
            "Records: {} inserted, {} updated, {} unchanged, {} removed",
            self.records_inserted, self.records_updated, self.records_unchanged, self.records_removed
        );

        if !self.by_source.is_empty() {
            println!("\n--- BY SOURCE ---");
            for (name, stats) in &self.by_source {
                println!(
                    "  {}: {} accepted, {} skipped, {} inserted, {} updated, {} unchanged",
                    name, stats.accepted, stats.skipped, stats.inserted, stats.updated, stats.unchanged
                );
            }
        }

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in self.warnings.iter().take(10) {
                println!("  [{}] {}", w.source, w.message);
            }
            if self.warnings.len() > 10 {
                println!("  ... and {} more", self.warnings.len() - 10);
            }
        }

        if !self.errors.is_empty() {
            println!("\n--- ERRORS ({}) ---", self.errors.len());
            for e in &self.errors {
                let location = e
                    .source
                    .as_ref()
                    .map(|s| format!("[{}]", s))
                    .unwrap_or_default();
                println!("  {:?} {} {}", e.level, location, e.message);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact
    pub fn summary(&self) -> String {
        format!(
            "{}: {} sources, {} records ({} inserted, {} updated, {} unchanged), {} errors",
            self.generated_at,
            self.sources_processed,
            self.total_records(),
            self.records_inserted,
            self.records_updated,
            self.records_unchanged,
            self.errors.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firedata::Partition;

    fn reload(inserted: usize, unchanged: usize, skipped: usize) -> ReloadReport {
        ReloadReport {
            partition: Partition::Active,
            accepted: inserted + unchanged,
            skipped,
            duplicates: 0,
            inserted,
            updated: 0,
            unchanged,
            removed: 0,
            displaced: 0,
        }
    }

    #[test]
    fn test_load_report_default() {
        let report = LoadReport::default();
        assert_eq!(report.status, LoadStatus::Success);
        assert_eq!(report.sources_processed, 0);
        assert_eq!(report.total_records(), 0);
    }

    #[test]
    fn test_record_reload() {
        let mut report = LoadReport::new("2024-07-15T16:00:00Z");
        report.record_reload("active_fires", &reload(3, 1, 2), 1);

        assert_eq!(report.sources_processed, 1);
        assert_eq!(report.features_accepted, 4);
        assert_eq!(report.features_skipped, 2);
        assert_eq!(report.features_malformed, 1);
        assert_eq!(report.by_source["active_fires"].total(), 4);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_finalize_partial_success() {
        let mut report = LoadReport::new("now");
        report.record_reload("active_fires", &reload(1, 0, 0), 0);
        report.record_source_failure("out_fires", "Source not found");
        report.finalize();
        assert_eq!(report.status, LoadStatus::PartialSuccess);
    }

    #[test]
    fn test_finalize_failed() {
        let mut report = LoadReport::new("now");
        report.record_source_failure("active_fires", "Source not found");
        report.record_source_failure("out_fires", "Source not found");
        report.finalize();
        assert_eq!(report.status, LoadStatus::Failed);
    }

    #[test]
    fn test_finalize_fatal() {
        let mut report = LoadReport::new("now");
        report.record_reload("active_fires", &reload(1, 0, 0), 0);
        report.record_error(LoadError {
            level: ErrorLevel::Fatal,
            source: None,
            message: "Invalid configuration".to_string(),
            details: None,
        });
        report.finalize();
        assert_eq!(report.status, LoadStatus::Failed);
    }

    #[test]
    fn test_summary() {
        let mut report = LoadReport::new("2024-07-15");
        report.record_reload("active_fires", &reload(100, 25, 0), 0);
        let summary = report.summary();
        assert!(summary.contains("2024-07-15"));
        assert!(summary.contains("100 inserted"));
    }

    #[test]
    fn test_save_to_file() {
        let path = std::env::temp_dir().join(format!("firemap-report-{}.json", std::process::id()));
        let report = LoadReport::new("2024-07-15");
        report.save_to_file(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["status"], "Success");
        std::fs::remove_file(&path).unwrap();
    }
}
