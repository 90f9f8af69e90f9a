//! Store en mémoire des enregistrements canoniques
//!
//! Source de vérité unique pour toutes les vues dérivées. Deux partitions
//! (feux actifs / feux éteints) se rechargent indépendamment. Un
//! rechargement prépare d'abord le nouveau contenu complet puis remplace la
//! partition en une seule étape.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, trace};

use crate::fingerprint::{fingerprint_to_hex, record_fingerprint};
use crate::record::normalize_feature;
use crate::types::{CanonicalFireRecord, Partition, RawFeature};

/// Résultat du rechargement pour un enregistrement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Identifiant absent de la partition avant rechargement
    Inserted,
    /// Identifiant existant, contenu modifié
    Updated,
    /// Identifiant existant, contenu identique
    Unchanged,
}

/// Rapport d'ingestion d'un batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Features converties en enregistrements
    pub accepted: usize,
    /// Features ignorées (géométrie non ponctuelle ou invalide)
    pub skipped: usize,
    /// Enregistrements écrasés (même identifiant)
    pub replaced: usize,
}

/// Rapport de rechargement d'une partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadReport {
    pub partition: Partition,
    /// Features converties en enregistrements
    pub accepted: usize,
    /// Features ignorées (géométrie non ponctuelle ou invalide)
    pub skipped: usize,
    /// Doublons d'identifiant dans le batch (le dernier gagne)
    pub duplicates: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Identifiants disparus de la partition
    pub removed: usize,
    /// Identifiants repris à l'autre partition
    pub displaced: usize,
}

impl ReloadReport {
    fn new(partition: Partition) -> Self {
        Self {
            partition,
            accepted: 0,
            skipped: 0,
            duplicates: 0,
            inserted: 0,
            updated: 0,
            unchanged: 0,
            removed: 0,
            displaced: 0,
        }
    }

    pub fn record(&mut self, outcome: ReloadOutcome) {
        match outcome {
            ReloadOutcome::Inserted => self.inserted += 1,
            ReloadOutcome::Updated => self.updated += 1,
            ReloadOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn total_processed(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }

    /// Vrai si le rechargement n'a rien changé
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.removed == 0 && self.displaced == 0
    }
}

/// Table des enregistrements, indexée par identifiant
#[derive(Debug, Clone, Default)]
pub struct FireStore {
    records: HashMap<String, CanonicalFireRecord>,
}

impl FireStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalise les features ponctuelles et les insère (ou remplace) par identifiant
    ///
    /// Les features non ponctuelles sont ignorées une par une, sans
    /// interrompre le batch. Doublons: le dernier gagne.
    pub fn ingest(
        &mut self,
        partition: Partition,
        features: &[RawFeature],
        status_override: Option<&str>,
    ) -> IngestReport {
        let mut report = IngestReport::default();

        for (index, feature) in features.iter().enumerate() {
            let Some(record) = normalize_feature(feature, partition, status_override) else {
                debug!(index, partition = partition.as_str(), geometry = ?feature.geometry, "Skipping non-point feature");
                report.skipped += 1;
                continue;
            };

            report.accepted += 1;
            if let Some(previous) = self.records.insert(record.id.clone(), record) {
                debug!(id = %previous.id, "Record replaced by a later feature");
                report.replaced += 1;
            }
        }

        report
    }

    /// Remplace intégralement le contenu d'une partition
    ///
    /// L'autre partition n'est pas touchée, sauf pour un identifiant présent
    /// dans le nouveau batch: il est repris par cette partition.
    pub fn clear_and_reload(
        &mut self,
        partition: Partition,
        features: &[RawFeature],
        status_override: Option<&str>,
    ) -> ReloadReport {
        let mut report = ReloadReport::new(partition);

        // 1. Préparer le nouveau contenu complet
        let mut staged: HashMap<String, CanonicalFireRecord> = HashMap::with_capacity(features.len());
        for (index, feature) in features.iter().enumerate() {
            match normalize_feature(feature, partition, status_override) {
                Some(record) => {
                    report.accepted += 1;
                    if staged.insert(record.id.clone(), record).is_some() {
                        report.duplicates += 1;
                    }
                }
                None => {
                    debug!(index, partition = partition.as_str(), geometry = ?feature.geometry, "Skipping non-point feature");
                    report.skipped += 1;
                }
            }
        }

        // 2. Empreintes de la partition actuelle
        let previous: HashMap<String, [u8; 32]> = self
            .records
            .values()
            .filter(|r| r.partition == partition)
            .map(|r| (r.id.clone(), record_fingerprint(r)))
            .collect();

        // 3. Comparer
        for (id, record) in &staged {
            let outcome = match previous.get(id) {
                Some(hash) => {
                    let current = record_fingerprint(record);
                    if *hash == current {
                        ReloadOutcome::Unchanged
                    } else {
                        trace!(id = %id, fingerprint = %fingerprint_to_hex(&current), "Record updated");
                        ReloadOutcome::Updated
                    }
                }
                None => {
                    if self.records.get(id).is_some_and(|r| r.partition != partition) {
                        debug!(id = %id, from = ?partition, "Record taken over from the other partition");
                        report.displaced += 1;
                    }
                    ReloadOutcome::Inserted
                }
            };
            report.record(outcome);
        }
        let staged_ids: HashSet<&String> = staged.keys().collect();
        report.removed = previous.keys().filter(|id| !staged_ids.contains(id)).count();

        // 4. Remplacer en une étape
        self.records.retain(|_, r| r.partition != partition);
        self.records.extend(staged);

        info!(
            partition = partition.as_str(),
            accepted = report.accepted,
            skipped = report.skipped,
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            removed = report.removed,
            "Partition reloaded"
        );

        report
    }

    /// Vide une partition
    pub fn clear_partition(&mut self, partition: Partition) -> usize {
        let before = self.records.len();
        self.records.retain(|_, r| r.partition != partition);
        before - self.records.len()
    }

    pub fn get(&self, id: &str) -> Option<&CanonicalFireRecord> {
        self.records.get(id)
    }

    /// Tous les enregistrements, dans un ordre sans signification
    pub fn all(&self) -> impl Iterator<Item = &CanonicalFireRecord> {
        self.records.values()
    }

    /// Enregistrements d'une partition
    pub fn partition(&self, partition: Partition) -> impl Iterator<Item = &CanonicalFireRecord> {
        self.records.values().filter(move |r| r.partition == partition)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copie triée par identifiant, pour comparaison ou export
    pub fn snapshot(&self) -> Vec<CanonicalFireRecord> {
        let mut records: Vec<CanonicalFireRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}
