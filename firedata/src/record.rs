//! Construction des enregistrements canoniques depuis les features brutes

use chrono::Utc;
use tracing::trace;

use crate::extract::{
    area_hectares, containment_pct, extract_text, first_date, retrieved_info,
    DETECTED_ALIASES, EXTINGUISHED_ALIASES, ID_ALIASES, NAME_ALIASES, STATUS_ALIASES,
    STATUS_DATE_ALIASES,
};
use crate::status::StatusKey;
use crate::types::{CanonicalFireRecord, Partition, RawFeature};

/// Nom affiché quand ni nom ni numéro de feu n'existent
pub const PLACEHOLDER_NAME: &str = "Unnamed Fire";

/// Génère un identifiant aléatoire + horodatage
///
/// Ces identifiants ne sont pas stables d'un chargement à l'autre.
pub fn synthetic_id() -> String {
    let nonce: u64 = rand::random();
    format!("synthetic-{:016x}-{:x}", nonce, Utc::now().timestamp_millis())
}

/// Normalise une feature en enregistrement canonique
///
/// Retourne `None` pour toute géométrie autre qu'un point aux coordonnées
/// finies. `status_override` remplace le texte de statut de la feature
/// (source entièrement composée de feux éteints, par exemple).
pub fn normalize_feature(
    feature: &RawFeature,
    partition: Partition,
    status_override: Option<&str>,
) -> Option<CanonicalFireRecord> {
    let location = feature.location()?;
    let props = &feature.properties;

    let raw_status_text = status_override
        .map(str::to_string)
        .or_else(|| extract_text(props, STATUS_ALIASES))
        .filter(|text| !text.trim().is_empty());
    let status_key = StatusKey::from_text(raw_status_text.as_deref().unwrap_or(""));

    let (id, id_is_synthetic) = match extract_text(props, ID_ALIASES) {
        Some(id) => (id, false),
        None => {
            let id = synthetic_id();
            trace!(id = %id, "Feature without identifier, synthetic id generated");
            (id, true)
        }
    };

    let name = extract_text(props, NAME_ALIASES).unwrap_or_else(|| PLACEHOLDER_NAME.to_string());

    let extinguished = status_key == StatusKey::Extinguished;
    let extinguished_at_ms = if extinguished {
        first_date(props, EXTINGUISHED_ALIASES)
    } else {
        None
    };
    let status_updated_at_ms = if extinguished {
        None
    } else {
        first_date(props, STATUS_DATE_ALIASES)
    };

    Some(CanonicalFireRecord {
        id,
        id_is_synthetic,
        name,
        status_key,
        raw_status_text,
        severity_rank: status_key.severity_rank(),
        area_hectares: area_hectares(props),
        containment_pct: containment_pct(props),
        detected_at_ms: first_date(props, DETECTED_ALIASES),
        extinguished_at_ms,
        status_updated_at_ms,
        retrieved: retrieved_info(props),
        location,
        partition,
        raw_properties: props.clone(),
    })
}
