//! Types de données pour le crate firedata

use std::collections::BTreeMap;
use std::fmt;

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::status::StatusKey;

/// Valeur d'un attribut de feature source (non typée en amont)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Attributs d'une feature (nom de champ -> valeur)
pub type Properties = BTreeMap<String, PropertyValue>;

impl PropertyValue {
    /// `null` et la chaîne vide sont considérés comme absents
    pub fn is_absent(&self) -> bool {
        match self {
            PropertyValue::Null => true,
            PropertyValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Représentation texte de la valeur (None pour `null`)
    pub fn as_text(&self) -> Option<String> {
        match self {
            PropertyValue::Null => None,
            PropertyValue::Bool(b) => Some(b.to_string()),
            PropertyValue::Number(n) => Some(n.to_string()),
            PropertyValue::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("null"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value as f64)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PropertyValue::Null,
            serde_json::Value::Bool(b) => PropertyValue::Bool(b),
            // Entiers au-delà de 2^53: gardés en texte pour ne pas perdre de chiffres
            serde_json::Value::Number(n) if !n.is_f64() && !is_exact_in_f64(&n) => {
                PropertyValue::Text(n.to_string())
            }
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(PropertyValue::Number)
                .unwrap_or(PropertyValue::Null),
            serde_json::Value::String(s) => PropertyValue::Text(s),
            // Tableaux et objets imbriqués: conservés sous forme de texte JSON
            other => PropertyValue::Text(other.to_string()),
        }
    }
}

impl From<&PropertyValue> for serde_json::Value {
    fn from(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Null => serde_json::Value::Null,
            PropertyValue::Bool(b) => serde_json::Value::Bool(*b),
            PropertyValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropertyValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Plus grand entier dont toutes les valeurs inférieures sont exactes en f64
const MAX_EXACT_INTEGER: u64 = 1 << 53;

fn is_exact_in_f64(n: &serde_json::Number) -> bool {
    match (n.as_u64(), n.as_i64()) {
        (Some(u), _) => u <= MAX_EXACT_INTEGER,
        (None, Some(i)) => i.unsigned_abs() <= MAX_EXACT_INTEGER,
        (None, None) => true,
    }
}

/// Géométrie d'une feature source, réduite à ce dont le store a besoin
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// Point (longitude, latitude) en degrés WGS84
    Point { lng: f64, lat: f64 },
    /// Toute autre géométrie (ignorée par le store)
    Other(String),
    /// Pas de géométrie
    Missing,
}

/// Feature brute telle que livrée par un chargeur externe
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    pub geometry: FeatureGeometry,
    pub properties: Properties,
}

impl RawFeature {
    /// Crée une feature ponctuelle
    pub fn point(lng: f64, lat: f64, properties: Properties) -> Self {
        Self {
            geometry: FeatureGeometry::Point { lng, lat },
            properties,
        }
    }

    /// Retourne la position si la géométrie est un point aux coordonnées finies
    pub fn location(&self) -> Option<GeoLocation> {
        match self.geometry {
            FeatureGeometry::Point { lng, lat } if lng.is_finite() && lat.is_finite() => {
                Some(GeoLocation { lat, lng })
            }
            _ => None,
        }
    }
}

/// Position géographique en degrés
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
}

impl GeoLocation {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Point `geo` (x = longitude, y = latitude)
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

/// Partition du store selon la source d'origine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// Chargement des feux actifs
    Active,
    /// Chargement des feux éteints
    Extinguished,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Active => "active",
            Partition::Extinguished => "extinguished",
        }
    }
}

/// Information "récupéré depuis la source" d'un enregistrement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RetrievedInfo {
    /// Horodatage de récupération (epoch ms)
    At(i64),
    /// Simple drapeau oui/non
    Flag(bool),
    /// Valeur non interprétable, conservée telle quelle
    Raw(String),
    #[default]
    Absent,
}

/// Enregistrement canonique d'un feu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFireRecord {
    /// Identifiant stable (ou synthétique, voir `id_is_synthetic`)
    pub id: String,

    /// Vrai si aucun identifiant source n'existait: l'id change à chaque rechargement
    pub id_is_synthetic: bool,

    /// Nom d'affichage
    pub name: String,

    /// Statut canonique
    pub status_key: StatusKey,

    /// Texte de statut d'origine (None si absent ou vide)
    pub raw_status_text: Option<String>,

    /// Rang de sévérité du statut
    pub severity_rank: i8,

    /// Surface en hectares (0 si introuvable)
    pub area_hectares: f64,

    /// Pourcentage de confinement, dans [0, 100]
    pub containment_pct: Option<f64>,

    /// Date de détection (epoch ms)
    pub detected_at_ms: Option<i64>,

    /// Date d'extinction (epoch ms), uniquement pour les feux éteints
    pub extinguished_at_ms: Option<i64>,

    /// Dernière mise à jour du statut (epoch ms), uniquement pour les feux non éteints
    pub status_updated_at_ms: Option<i64>,

    /// Information de récupération depuis la source
    pub retrieved: RetrievedInfo,

    pub location: GeoLocation,

    /// Partition d'origine
    pub partition: Partition,

    /// Attributs d'origine, conservés pour l'export et l'affichage détaillé
    pub raw_properties: Properties,
}

impl CanonicalFireRecord {
    pub fn is_extinguished(&self) -> bool {
        self.status_key == StatusKey::Extinguished
    }
}
