//! Adaptateur GeoJSON → features brutes
//!
//! Chaque entrée de `features` est décodée indépendamment: une entrée
//! illisible est comptée puis ignorée sans interrompre le reste.

use std::path::Path;

use geojson::{Feature, JsonObject, Value};
use tracing::debug;

use crate::error::FireError;
use crate::types::{FeatureGeometry, Properties, PropertyValue, RawFeature};

/// Résultat du décodage d'une collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCollection {
    pub features: Vec<RawFeature>,
    /// Entrées qui ne sont pas des features GeoJSON valides
    pub malformed: usize,
}

/// Décode un texte GeoJSON (FeatureCollection ou Feature isolée)
pub fn parse_feature_collection(source_name: &str, text: &str) -> Result<ParsedCollection, FireError> {
    let root: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| FireError::invalid_geojson(source_name, e.to_string()))?;

    let entries = match root {
        serde_json::Value::Object(mut object) => match object.remove("features") {
            Some(serde_json::Value::Array(entries)) => entries,
            Some(_) => {
                return Err(FireError::invalid_geojson(source_name, "`features` is not an array"))
            }
            None if object.get("type").and_then(|t| t.as_str()) == Some("Feature") => {
                vec![serde_json::Value::Object(object)]
            }
            None => {
                return Err(FireError::invalid_geojson(
                    source_name,
                    "expected a FeatureCollection",
                ))
            }
        },
        _ => {
            return Err(FireError::invalid_geojson(
                source_name,
                "root is not a JSON object",
            ))
        }
    };

    let mut parsed = ParsedCollection::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match Feature::from_json_value(entry) {
            Ok(feature) => parsed.features.push(raw_feature(&feature)),
            Err(e) => {
                debug!(source = source_name, index, error = %e, "Skipping malformed feature");
                parsed.malformed += 1;
            }
        }
    }

    Ok(parsed)
}

/// Lit et décode un fichier GeoJSON
pub fn read_feature_collection(path: &Path) -> Result<ParsedCollection, FireError> {
    let text = std::fs::read_to_string(path)?;
    parse_feature_collection(&path.display().to_string(), &text)
}

/// Convertit une feature `geojson` en feature brute
pub fn raw_feature(feature: &Feature) -> RawFeature {
    let geometry = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(coords)) if coords.len() >= 2 => FeatureGeometry::Point {
            lng: coords[0],
            lat: coords[1],
        },
        Some(value) => FeatureGeometry::Other(geometry_type_name(value).to_string()),
        None => FeatureGeometry::Missing,
    };

    RawFeature {
        geometry,
        properties: feature
            .properties
            .as_ref()
            .map(properties_from_json)
            .unwrap_or_default(),
    }
}

/// Convertit un objet JSON en attributs
pub fn properties_from_json(object: &JsonObject) -> Properties {
    object
        .iter()
        .map(|(key, value)| (key.clone(), PropertyValue::from(value.clone())))
        .collect()
}

fn geometry_type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
