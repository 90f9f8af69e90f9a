//! Empreinte d'un enregistrement pour la détection de changements
//!
//! L'empreinte couvre tous les champs canoniques et les attributs bruts.
//! Les flottants sont arrondis à 6 décimales pour rester stables.

use blake3::Hasher;

use crate::types::{CanonicalFireRecord, PropertyValue, RetrievedInfo};

/// Calcule l'empreinte blake3 d'un enregistrement
pub fn record_fingerprint(record: &CanonicalFireRecord) -> [u8; 32] {
    let mut hasher = Hasher::new();

    hash_str(&mut hasher, b"ID", &record.id);
    hash_str(&mut hasher, b"NAME", &record.name);
    hash_str(&mut hasher, b"STATUS", record.status_key.as_str());
    hash_opt_str(&mut hasher, b"RAWSTATUS", record.raw_status_text.as_deref());
    hash_str(&mut hasher, b"PARTITION", record.partition.as_str());

    hasher.update(b"AREA");
    hash_f64(&mut hasher, record.area_hectares);
    hasher.update(b"CONTAIN");
    match record.containment_pct {
        Some(pct) => hash_f64(&mut hasher, pct),
        None => {
            hasher.update(b"-");
        }
    }

    hash_opt_i64(&mut hasher, b"DETECTED", record.detected_at_ms);
    hash_opt_i64(&mut hasher, b"OUT", record.extinguished_at_ms);
    hash_opt_i64(&mut hasher, b"UPDATED", record.status_updated_at_ms);

    hasher.update(b"RETRIEVED");
    match &record.retrieved {
        RetrievedInfo::At(ms) => {
            hasher.update(b"AT");
            hasher.update(&ms.to_le_bytes());
        }
        RetrievedInfo::Flag(b) => {
            hasher.update(if *b { b"YES".as_slice() } else { b"NO".as_slice() });
        }
        RetrievedInfo::Raw(text) => hash_str(&mut hasher, b"RAW", text),
        RetrievedInfo::Absent => {
            hasher.update(b"-");
        }
    }

    hasher.update(b"LOC");
    hash_f64(&mut hasher, record.location.lng);
    hash_f64(&mut hasher, record.location.lat);

    // BTreeMap: ordre des clés déterministe
    hasher.update(b"PROPS");
    for (key, value) in &record.raw_properties {
        hash_str(&mut hasher, b"K", key);
        hash_value(&mut hasher, value);
    }

    *hasher.finalize().as_bytes()
}

/// Convertit une empreinte en hexadécimal
pub fn fingerprint_to_hex(hash: &[u8; 32]) -> String {
    hex::encode(hash)
}

fn hash_value(hasher: &mut Hasher, value: &PropertyValue) {
    match value {
        PropertyValue::Null => {
            hasher.update(b"N");
        }
        PropertyValue::Bool(b) => {
            hasher.update(if *b { b"T" } else { b"F" });
        }
        PropertyValue::Number(n) => {
            hasher.update(b"#");
            hash_f64(hasher, *n);
        }
        PropertyValue::Text(s) => hash_str(hasher, b"S", s),
    }
}

/// Préfixe + longueur + contenu, pour éviter les collisions par concaténation
fn hash_str(hasher: &mut Hasher, tag: &[u8], value: &str) {
    hasher.update(tag);
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn hash_opt_str(hasher: &mut Hasher, tag: &[u8], value: Option<&str>) {
    match value {
        Some(v) => hash_str(hasher, tag, v),
        None => {
            hasher.update(tag);
            hasher.update(b"-");
        }
    }
}

fn hash_opt_i64(hasher: &mut Hasher, tag: &[u8], value: Option<i64>) {
    hasher.update(tag);
    match value {
        Some(v) => {
            hasher.update(&v.to_le_bytes());
        }
        None => {
            hasher.update(b"-");
        }
    }
}

fn hash_f64(hasher: &mut Hasher, value: f64) {
    let rounded = (value * 1_000_000.0).round() as i64;
    hasher.update(&rounded.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::normalize_feature;
    use crate::types::{Partition, Properties, RawFeature};

    fn record(area: f64) -> CanonicalFireRecord {
        let mut props = Properties::new();
        props.insert("FIRE_ID".into(), PropertyValue::from("F-1"));
        props.insert("FIRE_SIZE".into(), PropertyValue::from(area));
        normalize_feature(&RawFeature::point(-66.0, 46.0, props), Partition::Active, None).unwrap()
    }

    #[test]
    fn test_same_record_same_fingerprint() {
        assert_eq!(record_fingerprint(&record(5.0)), record_fingerprint(&record(5.0)));
    }

    #[test]
    fn test_changed_record_different_fingerprint() {
        assert_ne!(record_fingerprint(&record(5.0)), record_fingerprint(&record(6.0)));
    }

    #[test]
    fn test_fingerprint_hex() {
        let hex = fingerprint_to_hex(&record_fingerprint(&record(1.0)));
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
