//! Types d'erreurs pour le crate firedata
//!
//! Les fonctions de normalisation et d'agrégation ne retournent jamais
//! d'erreur: seules les frontières (lecture d'une source, parsing du texte
//! GeoJSON, résolution d'un fuseau horaire) sont faillibles.

use thiserror::Error;

/// Erreurs pouvant survenir aux frontières du crate
#[derive(Debug, Error)]
pub enum FireError {
    /// Erreur d'I/O lors de la lecture d'une source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Texte GeoJSON illisible ou qui n'est pas une FeatureCollection
    #[error("Invalid GeoJSON in {source_name}: {reason}")]
    InvalidGeoJson { source_name: String, reason: String },

    /// Identifiant IANA de fuseau horaire inconnu
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    /// Erreur de (dé)sérialisation JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FireError {
    /// Crée une erreur GeoJSON avec contexte
    pub fn invalid_geojson(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeoJson {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}
