//! Statistiques dérivées du store
//!
//! Toutes les fonctions sont pures: elles ne dépendent que du contenu
//! courant du store et de l'instant `now_ms` fourni par l'appelant.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::status::{StatusKey, ACTIVE_KEYS};
use crate::store::FireStore;
use crate::temporal::{build_weekly_series, is_today, is_yesterday, WeeklySeries};
use crate::types::CanonicalFireRecord;

/// Vue d'ensemble du jeu de données
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Instant de calcul (epoch ms)
    pub generated_at_ms: i64,
    pub total_count: usize,
    /// Tous les statuts sauf `extinguished` (y compris `other`)
    pub active_count: usize,
    pub extinguished_count: usize,
    /// Nombre d'enregistrements par statut (toutes les clés sont présentes)
    pub counts_by_status: BTreeMap<StatusKey, usize>,
    pub total_area_hectares: f64,
    pub detected_today: usize,
    pub detected_yesterday: usize,
    pub extinguished_today: usize,
    pub extinguished_yesterday: usize,
}

/// Part d'un statut actif dans le total (données de camembert)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusShare {
    pub key: StatusKey,
    pub count: usize,
    pub start_deg: f64,
    pub end_deg: f64,
}

impl SummaryStats {
    pub fn count(&self, key: StatusKey) -> usize {
        self.counts_by_status.get(&key).copied().unwrap_or(0)
    }

    /// Parts des cinq statuts actifs, dans l'ordre d'affichage
    ///
    /// Les statuts sans feu sont omis. Vide si aucun feu actif.
    pub fn active_shares(&self) -> Vec<StatusShare> {
        let total: usize = ACTIVE_KEYS.iter().map(|k| self.count(*k)).sum();
        if total == 0 {
            return Vec::new();
        }

        let mut acc = 0usize;
        let mut shares = Vec::new();
        for key in ACTIVE_KEYS {
            let count = self.count(key);
            if count == 0 {
                continue;
            }
            let start_deg = acc as f64 / total as f64 * 360.0;
            acc += count;
            let end_deg = acc as f64 / total as f64 * 360.0;
            shares.push(StatusShare {
                key,
                count,
                start_deg,
                end_deg,
            });
        }
        shares
    }
}

/// Calcule la vue d'ensemble dans le fuseau `tz`
pub fn summarize(store: &FireStore, tz: Tz, now_ms: i64) -> SummaryStats {
    let mut counts_by_status: BTreeMap<StatusKey, usize> =
        StatusKey::iter().map(|key| (key, 0)).collect();

    let mut stats = SummaryStats {
        generated_at_ms: now_ms,
        total_count: 0,
        active_count: 0,
        extinguished_count: 0,
        counts_by_status: BTreeMap::new(),
        total_area_hectares: 0.0,
        detected_today: 0,
        detected_yesterday: 0,
        extinguished_today: 0,
        extinguished_yesterday: 0,
    };

    for record in store.all() {
        stats.total_count += 1;
        stats.total_area_hectares += record.area_hectares;
        *counts_by_status.entry(record.status_key).or_insert(0) += 1;

        if let Some(detected) = record.detected_at_ms {
            if is_today(detected, now_ms, tz) {
                stats.detected_today += 1;
            } else if is_yesterday(detected, now_ms, tz) {
                stats.detected_yesterday += 1;
            }
        }

        if record.is_extinguished() {
            stats.extinguished_count += 1;
            if let Some(out) = record.extinguished_at_ms {
                if is_today(out, now_ms, tz) {
                    stats.extinguished_today += 1;
                } else if is_yesterday(out, now_ms, tz) {
                    stats.extinguished_yesterday += 1;
                }
            }
        } else {
            stats.active_count += 1;
        }
    }

    stats.counts_by_status = counts_by_status;
    stats
}

/// Série hebdomadaire: détections de tous les feux, extinctions des feux éteints
pub fn weekly_trend(store: &FireStore, now_ms: i64) -> WeeklySeries {
    let detections: Vec<i64> = store.all().filter_map(|r| r.detected_at_ms).collect();
    let extinguishes: Vec<i64> = store
        .all()
        .filter(|r| r.is_extinguished())
        .filter_map(|r| r.extinguished_at_ms)
        .collect();
    build_weekly_series(&detections, &extinguishes, now_ms)
}

/// Feux groupés par statut
///
/// Feux éteints: extinction la plus récente d'abord, sans date en dernier.
/// Autres statuts: plus grande surface d'abord. Égalités départagées par
/// identifiant pour un ordre stable.
pub fn ranked_by_status(store: &FireStore) -> BTreeMap<StatusKey, Vec<&CanonicalFireRecord>> {
    let mut groups: BTreeMap<StatusKey, Vec<&CanonicalFireRecord>> = BTreeMap::new();
    for record in store.all() {
        groups.entry(record.status_key).or_default().push(record);
    }

    for (key, records) in groups.iter_mut() {
        if *key == StatusKey::Extinguished {
            records.sort_by(|a, b| {
                compare_recent_first(a.extinguished_at_ms, b.extinguished_at_ms)
                    .then_with(|| a.id.cmp(&b.id))
            });
        } else {
            records.sort_by(|a, b| {
                b.area_hectares
                    .total_cmp(&a.area_hectares)
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
    }

    groups
}

fn compare_recent_first(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Partition, Properties, PropertyValue, RawFeature};
    use chrono::{TimeZone, Utc};

    const MONCTON: Tz = chrono_tz::America::Moncton;

    fn now() -> i64 {
        Utc.with_ymd_and_hms(2024, 7, 15, 16, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn fire(id: &str, fields: &[(&str, PropertyValue)]) -> RawFeature {
        let mut props: Properties = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        props.insert("FIRE_ID".into(), PropertyValue::from(id));
        RawFeature::point(-66.0, 46.5, props)
    }

    fn scenario_store() -> FireStore {
        let mut store = FireStore::new();
        store.clear_and_reload(
            Partition::Active,
            &[
                fire(
                    "A",
                    &[
                        ("FIRE_STAT_DESC_E", "Out of Control".into()),
                        ("FIRE_SIZE", PropertyValue::from(120.5)),
                    ],
                ),
                fire(
                    "B",
                    &[
                        ("FIRE_STAT_DESC_E", "Contained".into()),
                        ("FIRE_SIZE", PropertyValue::from(5.0)),
                        ("TIME_DETECTED", "20240715".into()),
                    ],
                ),
            ],
            None,
        );
        store.clear_and_reload(
            Partition::Extinguished,
            &[fire("C", &[("FIRE_OUT_DATE", "20240714".into())])],
            Some("Extinguished"),
        );
        store
    }

    #[test]
    fn test_summarize_scenario() {
        let stats = summarize(&scenario_store(), MONCTON, now());
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.active_count, 2);
        assert_eq!(stats.extinguished_count, 1);
        assert_eq!(stats.total_area_hectares, 125.5);
        assert_eq!(stats.count(StatusKey::OutOfControl), 1);
        assert_eq!(stats.count(StatusKey::Contained), 1);
        assert_eq!(stats.count(StatusKey::Extinguished), 1);
        assert_eq!(stats.count(StatusKey::Other), 0);
        assert_eq!(stats.counts_by_status.len(), 7);
        assert_eq!(stats.generated_at_ms, now());
    }

    #[test]
    fn test_summarize_today_and_yesterday() {
        let stats = summarize(&scenario_store(), MONCTON, now());
        // 2024-07-15 00:00 UTC = 14 juillet 21:00 ADT: hier à Moncton
        assert_eq!(stats.detected_today, 0);
        assert_eq!(stats.detected_yesterday, 1);

        // En UTC, la même date tombe aujourd'hui
        let utc_stats = summarize(&scenario_store(), chrono_tz::UTC, now());
        assert_eq!(utc_stats.detected_today, 1);
        assert_eq!(utc_stats.extinguished_yesterday, 1);
    }

    #[test]
    fn test_summarize_empty_store() {
        let stats = summarize(&FireStore::new(), MONCTON, now());
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.total_area_hectares, 0.0);
        assert!(stats.active_shares().is_empty());
    }

    #[test]
    fn test_active_shares() {
        let stats = summarize(&scenario_store(), MONCTON, now());
        let shares = stats.active_shares();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].key, StatusKey::OutOfControl);
        assert_eq!(shares[0].start_deg, 0.0);
        assert_eq!(shares[0].end_deg, 180.0);
        assert_eq!(shares[1].key, StatusKey::Contained);
        assert_eq!(shares[1].end_deg, 360.0);
    }

    #[test]
    fn test_weekly_trend_counts_detections_and_outs() {
        let series = weekly_trend(&scenario_store(), now());
        assert_eq!(series.len(), 2);
        assert_eq!(series.new_counts, vec![0, 1]);
        assert_eq!(series.out_counts, vec![1, 0]);
        assert_eq!(series.active_counts, vec![0, 1]);
    }

    #[test]
    fn test_ranked_by_status() {
        let mut store = FireStore::new();
        store.ingest(
            Partition::Active,
            &[
                fire("S", &[("FIRE_STAT_DESC_E", "Contained".into()), ("FIRE_SIZE", PropertyValue::from(2.0))]),
                fire("L", &[("FIRE_STAT_DESC_E", "Contained".into()), ("FIRE_SIZE", PropertyValue::from(40.0))]),
            ],
            None,
        );
        store.ingest(
            Partition::Extinguished,
            &[
                fire("OLD", &[("FIRE_OUT_DATE", "20240601".into())]),
                fire("NODATE", &[]),
                fire("NEW", &[("FIRE_OUT_DATE", "20240710".into())]),
            ],
            Some("Extinguished"),
        );

        let ranked = ranked_by_status(&store);
        let contained: Vec<&str> = ranked[&StatusKey::Contained]
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        let out: Vec<&str> = ranked[&StatusKey::Extinguished]
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(contained, vec!["L", "S"]);
        assert_eq!(out, vec!["NEW", "OLD", "NODATE"]);
        assert!(!ranked.contains_key(&StatusKey::OutOfControl));
    }
}
