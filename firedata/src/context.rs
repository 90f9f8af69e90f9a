//! Contexte explicite: store, fuseau de référence et rayon de proximité
//!
//! Remplace tout état global. L'orchestration (chargement, affichage)
//! possède un `FireContext` et le passe là où il est nécessaire.

use std::collections::BTreeMap;

use chrono_tz::Tz;

use crate::aggregate::{self, SummaryStats};
use crate::error::FireError;
use crate::proximity::{self, NearbyFire, DEFAULT_RADIUS_M};
use crate::status::StatusKey;
use crate::store::{FireStore, ReloadReport};
use crate::temporal::{parse_time_zone, WeeklySeries};
use crate::types::{CanonicalFireRecord, GeoLocation, Partition, RawFeature};

/// Statut imposé aux features de la source des feux éteints
pub const EXTINGUISHED_OVERRIDE: &str = "Extinguished";

#[derive(Debug, Clone)]
pub struct FireContext {
    store: FireStore,
    tz: Tz,
    radius_m: f64,
}

impl FireContext {
    pub fn new(tz: Tz) -> Self {
        Self {
            store: FireStore::new(),
            tz,
            radius_m: DEFAULT_RADIUS_M,
        }
    }

    /// Crée un contexte depuis un identifiant IANA
    pub fn for_zone(zone: &str) -> Result<Self, FireError> {
        Ok(Self::new(parse_time_zone(zone)?))
    }

    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn store(&self) -> &FireStore {
        &self.store
    }

    /// Recharge la partition des feux actifs (statut lu sur chaque feature)
    pub fn reload_active(&mut self, features: &[RawFeature]) -> ReloadReport {
        self.store.clear_and_reload(Partition::Active, features, None)
    }

    /// Recharge la partition des feux éteints (statut imposé)
    pub fn reload_extinguished(&mut self, features: &[RawFeature]) -> ReloadReport {
        self.store
            .clear_and_reload(Partition::Extinguished, features, Some(EXTINGUISHED_OVERRIDE))
    }

    pub fn summarize(&self, now_ms: i64) -> SummaryStats {
        aggregate::summarize(&self.store, self.tz, now_ms)
    }

    pub fn weekly_trend(&self, now_ms: i64) -> WeeklySeries {
        aggregate::weekly_trend(&self.store, now_ms)
    }

    pub fn ranked_by_status(&self) -> BTreeMap<StatusKey, Vec<&CanonicalFireRecord>> {
        aggregate::ranked_by_status(&self.store)
    }

    /// Feux actifs dans le rayon du contexte
    pub fn nearby(&self, reference: GeoLocation) -> Vec<NearbyFire<'_>> {
        proximity::nearby_active(reference, &self.store, self.radius_m)
    }

    pub fn nearby_within(&self, reference: GeoLocation, radius_m: f64) -> Vec<NearbyFire<'_>> {
        proximity::nearby_active(reference, &self.store, radius_m)
    }
}
