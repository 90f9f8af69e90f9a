//! Table plate des feux (une ligne par enregistrement)
//!
//! Colonnes fixes d'abord, puis tous les attributs d'origine.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use firedata::extract::{
    extract_first, extract_text, parse_number_loose, AREA_ALIASES, FIRE_ID_ALIASES,
    FIRE_NUMBER_ALIASES,
};
use firedata::status::display_status;
use firedata::{CanonicalFireRecord, FireStore};

/// Noms des colonnes fixes, dans l'ordre
pub const FIXED_COLUMNS: [&str; 10] = [
    "FireNumberShort",
    "FireName",
    "FireID",
    "Status",
    "Size_ha",
    "Contained_pct",
    "Detected_at",
    "Extinguished_at",
    "X",
    "Y",
];

/// Ligne exportée
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireRow {
    /// Identifiant de l'enregistrement (identifiant de la feature GeoJSON)
    #[serde(skip)]
    pub record_id: String,
    #[serde(rename = "FireNumberShort")]
    pub fire_number_short: Option<String>,
    #[serde(rename = "FireName")]
    pub fire_name: String,
    #[serde(rename = "FireID")]
    pub fire_id: Option<String>,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Size_ha")]
    pub size_ha: Option<f64>,
    #[serde(rename = "Contained_pct")]
    pub contained_pct: Option<f64>,
    #[serde(rename = "Detected_at")]
    pub detected_at: Option<String>,
    #[serde(rename = "Extinguished_at")]
    pub extinguished_at: Option<String>,
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    /// Attributs d'origine (hors noms de colonnes fixes)
    #[serde(flatten)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// Horodatage ISO 8601 UTC à la milliseconde
pub fn iso_timestamp(epoch_ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl FireRow {
    pub fn from_record(record: &CanonicalFireRecord) -> Self {
        let props = &record.raw_properties;
        let properties = props
            .iter()
            .filter(|(key, _)| !FIXED_COLUMNS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
            .collect();

        Self {
            record_id: record.id.clone(),
            fire_number_short: extract_text(props, FIRE_NUMBER_ALIASES),
            fire_name: record.name.clone(),
            fire_id: extract_text(props, FIRE_ID_ALIASES),
            status: display_status(record),
            size_ha: extract_first(props, AREA_ALIASES).and_then(|(_, v)| parse_number_loose(v)),
            contained_pct: record.containment_pct,
            detected_at: record.detected_at_ms.and_then(iso_timestamp),
            extinguished_at: if record.is_extinguished() {
                record.extinguished_at_ms.and_then(iso_timestamp)
            } else {
                None
            },
            x: record.location.lng,
            y: record.location.lat,
            properties,
        }
    }

    /// Valeurs des colonnes fixes, en texte (vide pour les valeurs absentes)
    fn fixed_values(&self) -> Vec<String> {
        fn opt<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map(ToString::to_string).unwrap_or_default()
        }
        vec![
            opt(&self.fire_number_short),
            self.fire_name.clone(),
            opt(&self.fire_id),
            self.status.clone(),
            opt(&self.size_ha),
            opt(&self.contained_pct),
            opt(&self.detected_at),
            opt(&self.extinguished_at),
            self.x.to_string(),
            self.y.to_string(),
        ]
    }
}

/// Toutes les lignes du store, triées par identifiant
pub fn collect_rows(store: &FireStore) -> Vec<FireRow> {
    store.snapshot().iter().map(FireRow::from_record).collect()
}

fn cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Écrit les lignes en CSV (en-tête = colonnes fixes + union des attributs)
pub fn write_csv<W: Write>(writer: W, rows: &[FireRow]) -> Result<()> {
    let extra: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.properties.keys().map(String::as_str))
        .collect();

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(FIXED_COLUMNS.iter().copied().chain(extra.iter().copied()))?;

    for row in rows {
        let mut record = row.fixed_values();
        record.extend(
            extra
                .iter()
                .map(|key| row.properties.get(*key).map(cell).unwrap_or_default()),
        );
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// Exporte les lignes en CSV
pub fn export_csv(rows: &[FireRow], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    write_csv(BufWriter::new(file), rows)
}

/// Exporte les lignes en tableau JSON
pub fn export_json(rows: &[FireRow], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use firedata::types::Properties;
    use firedata::{Partition, PropertyValue, RawFeature};

    fn store() -> FireStore {
        let mut active = Properties::new();
        active.insert("GlobalID".into(), PropertyValue::from("{G-1}"));
        active.insert("FIRE_ID".into(), PropertyValue::from("MIR-041"));
        active.insert("FIRE_NUMBER_SHORT".into(), PropertyValue::from("041"));
        active.insert("FIRE_NAME".into(), PropertyValue::from("Bear Lake"));
        active.insert("FIRE_STAT_DESC_E".into(), PropertyValue::from("Smouldering"));
        active.insert("FIRE_SIZE".into(), PropertyValue::from(12.5));
        active.insert("TIME_DETECTED".into(), PropertyValue::from("20240715"));
        active.insert("FIRE_OUT_DATE".into(), PropertyValue::from("20240716"));
        active.insert("X".into(), PropertyValue::from(999.0));

        let mut out = Properties::new();
        out.insert("OBJECTID".into(), PropertyValue::from(7_i64));
        out.insert("FIRE_OUT_DATE".into(), PropertyValue::from("20240714"));
        out.insert("NOTE".into(), PropertyValue::from("crew, released"));

        let mut store = FireStore::new();
        store.ingest(Partition::Active, &[RawFeature::point(-66.5, 46.5, active)], None);
        store.ingest(
            Partition::Extinguished,
            &[RawFeature::point(-65.0, 47.0, out)],
            Some("Extinguished"),
        );
        store
    }

    #[test]
    fn test_rows_columns() {
        let rows = collect_rows(&store());
        assert_eq!(rows.len(), 2);

        // Tri par identifiant: "7" < "{G-1}"
        let out = &rows[0];
        assert_eq!(out.fire_id.as_deref(), Some("7"));
        assert_eq!(out.status, "Extinguished");
        assert_eq!(out.extinguished_at.as_deref(), Some("2024-07-14T00:00:00.000Z"));
        assert_eq!(out.size_ha, None);

        let active = &rows[1];
        assert_eq!(active.fire_number_short.as_deref(), Some("041"));
        assert_eq!(active.fire_id.as_deref(), Some("MIR-041"));
        assert_eq!(active.status, "Smouldering");
        assert_eq!(active.size_ha, Some(12.5));
        assert_eq!(active.detected_at.as_deref(), Some("2024-07-15T00:00:00.000Z"));
        // Date d'extinction ignorée pour un feu non éteint
        assert_eq!(active.extinguished_at, None);
        assert_eq!(active.x, -66.5);
        assert_eq!(active.y, 46.5);
        // Un attribut homonyme d'une colonne fixe est écarté
        assert!(!active.properties.contains_key("X"));
        assert!(active.properties.contains_key("FIRE_SIZE"));
    }

    #[test]
    fn test_json_keeps_fixed_columns_first() {
        let rows = collect_rows(&store());
        let json = serde_json::to_string(&rows[1]).unwrap();
        assert!(json.starts_with(r#"{"FireNumberShort":"041","FireName":"Bear Lake""#));
        assert!(!json.contains("{G-1}"));
        assert!(json.contains(r#""FIRE_SIZE":12.5"#));
    }

    #[test]
    fn test_csv_output() {
        let rows = collect_rows(&store());
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("FireNumberShort,FireName,FireID,Status,Size_ha"));
        assert!(header.contains("NOTE"));
        assert!(header.contains("TIME_DETECTED"));
        assert!(text.contains("\"crew, released\""));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn test_iso_timestamp() {
        assert_eq!(iso_timestamp(0).as_deref(), Some("1970-01-01T00:00:00.000Z"));
    }
}
