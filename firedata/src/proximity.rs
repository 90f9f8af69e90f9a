//! Recherche des feux actifs autour d'un point

use geo::HaversineDistance;
use serde::Serialize;

use crate::status::StatusKey;
use crate::store::FireStore;
use crate::types::{CanonicalFireRecord, GeoLocation};

/// Rayon de recherche par défaut (mètres)
pub const DEFAULT_RADIUS_M: f64 = 30_000.0;

/// Feu trouvé à proximité d'un point de référence
#[derive(Debug, Clone, Serialize)]
pub struct NearbyFire<'a> {
    pub record: &'a CanonicalFireRecord,
    pub distance_meters: f64,
}

/// Distance orthodromique (haversine) entre deux positions, en mètres
pub fn great_circle_distance(a: GeoLocation, b: GeoLocation) -> f64 {
    a.to_point().haversine_distance(&b.to_point())
}

/// Feux non éteints à `radius_m` mètres au plus de `reference`, du plus proche au plus lointain
pub fn nearby_active(
    reference: GeoLocation,
    store: &FireStore,
    radius_m: f64,
) -> Vec<NearbyFire<'_>> {
    let mut found: Vec<NearbyFire<'_>> = store
        .all()
        .filter(|record| record.status_key != StatusKey::Extinguished)
        .filter_map(|record| {
            let distance_meters = great_circle_distance(reference, record.location);
            (distance_meters <= radius_m).then_some(NearbyFire {
                record,
                distance_meters,
            })
        })
        .collect();

    found.sort_by(|a, b| {
        a.distance_meters
            .total_cmp(&b.distance_meters)
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
    found
}
