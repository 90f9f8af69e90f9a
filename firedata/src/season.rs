//! Repères de saison (moyennes décennales, année précédente, année en cours)
//!
//! La source est une table d'une seule ligne, livrée soit au format
//! ArcGIS (`features[0].attributes`) soit en GeoJSON
//! (`features[0].properties`).

use serde::{Deserialize, Serialize};

use crate::error::FireError;
use crate::extract::{parse_date_loose, parse_number_loose};
use crate::types::{Properties, PropertyValue};

/// Indicateurs de saison, chacun optionnel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonBenchmarks {
    /// Surface brûlée moyenne à date sur 10 ans (ha)
    pub avg_10y_area_hectares: Option<f64>,
    /// Nombre de feux moyen à date sur 10 ans
    pub avg_10y_fires: Option<f64>,
    pub last_year_count: Option<f64>,
    pub last_year_area_hectares: Option<f64>,
    pub this_year_count: Option<f64>,
    pub this_year_area_hectares: Option<f64>,
    /// Date de récupération de la table (epoch ms)
    pub fetched_at_ms: Option<i64>,
}

fn number(props: &Properties, key: &str) -> Option<f64> {
    props.get(key).and_then(parse_number_loose)
}

impl SeasonBenchmarks {
    /// Lit les indicateurs depuis les attributs de la ligne
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            avg_10y_area_hectares: number(props, "AVG_10Y_BURN"),
            avg_10y_fires: number(props, "AVG_10Y_FIRES"),
            last_year_count: number(props, "LAST_YEARS_COUNT"),
            last_year_area_hectares: number(props, "LAST_YEARS_BURN"),
            this_year_count: number(props, "THIS_YEARS_COUNT"),
            this_year_area_hectares: number(props, "THIS_YEARS_BURN"),
            fetched_at_ms: props.get("FETCHED_FROM_ERD").and_then(parse_date_loose),
        }
    }

    /// Parse le document complet; `None` s'il ne contient aucune ligne
    pub fn from_json_str(source_name: &str, text: &str) -> Result<Option<Self>, FireError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| FireError::invalid_geojson(source_name, e.to_string()))?;

        let Some(first) = value
            .get("features")
            .and_then(|f| f.as_array())
            .and_then(|features| features.first())
        else {
            return Ok(None);
        };

        let attributes = first
            .get("attributes")
            .or_else(|| first.get("properties"))
            .and_then(|a| a.as_object());

        Ok(attributes.map(|map| {
            let props: Properties = map
                .iter()
                .map(|(k, v)| (k.clone(), PropertyValue::from(v.clone())))
                .collect();
            Self::from_properties(&props)
        }))
    }

    /// Vrai si aucun indicateur n'a pu être lu
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_arcgis_attributes() {
        let json = r#"{
            "features": [{
                "attributes": {
                    "AVG_10Y_BURN": 312.4,
                    "AVG_10Y_FIRES": "158",
                    "LAST_YEARS_COUNT": 201,
                    "LAST_YEARS_BURN": 540.2,
                    "THIS_YEARS_COUNT": 97,
                    "THIS_YEARS_BURN": 88.5,
                    "FETCHED_FROM_ERD": 1720000000000
                }
            }]
        }"#;
        let bench = SeasonBenchmarks::from_json_str("sums_table", json)
            .unwrap()
            .unwrap();
        assert_eq!(bench.avg_10y_area_hectares, Some(312.4));
        assert_eq!(bench.avg_10y_fires, Some(158.0));
        assert_eq!(bench.this_year_count, Some(97.0));
        assert_eq!(bench.fetched_at_ms, Some(1_720_000_000_000));
        assert!(!bench.is_empty());
    }

    #[test]
    fn test_from_geojson_properties() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":null,"properties":{"THIS_YEARS_BURN":"12.5 ha"}}
        ]}"#;
        let bench = SeasonBenchmarks::from_json_str("sums_table", json)
            .unwrap()
            .unwrap();
        assert_eq!(bench.this_year_area_hectares, Some(12.5));
        assert_eq!(bench.last_year_count, None);
    }

    #[test]
    fn test_no_rows() {
        let empty = SeasonBenchmarks::from_json_str("sums_table", r#"{"features":[]}"#).unwrap();
        assert!(empty.is_none());
    }

    #[test]
    fn test_invalid_json() {
        assert!(SeasonBenchmarks::from_json_str("sums_table", "{nope").is_err());
    }
}
