//! Extraction de champs depuis des attributs non typés
//!
//! Les sources amont nomment le même champ sémantique de plusieurs façons
//! (alias, casse variable) et mélangent les formats de dates et de nombres.
//! Les listes d'alias sont ordonnées de la plus fiable à la moins fiable.

use std::sync::LazyLock;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::types::{Properties, PropertyValue, RetrievedInfo};

/// Identifiant stable de la feature
pub const ID_ALIASES: &[&str] = &["GlobalID", "OBJECTID", "FIRE_ID"];

/// Nom d'affichage (le numéro de feu sert de repli)
pub const NAME_ALIASES: &[&str] = &["FIRE_NAME", "FIRE_ID"];

/// Identifiant métier utilisé à l'export
pub const FIRE_ID_ALIASES: &[&str] = &["FIRE_ID", "GlobalID", "OBJECTID"];

/// Numéro court du feu
pub const FIRE_NUMBER_ALIASES: &[&str] = &["FIRE_NUMBER_SHORT"];

/// Texte de statut
pub const STATUS_ALIASES: &[&str] = &["FIRE_STAT_DESC_E", "FIRE_STATUS", "STATUS"];

/// Surface en hectares
pub const AREA_ALIASES: &[&str] = &["FIRE_SIZE", "SIZE_HA", "AREA", "HECTARES"];

/// Pourcentage de confinement
pub const CONTAINMENT_ALIASES: &[&str] = &[
    "PCT_CONTAINED",
    "PERCENT_CONTAINED",
    "CONTAINMENT_PCT",
    "CONTAINED_PCT",
    "PCTCONTAINED",
    "CONTAINMENT",
    "CONTAINMENT_PERCENT",
];

/// Date de détection
pub const DETECTED_ALIASES: &[&str] = &[
    "TIME_DETECTED",
    "DATE_DETECTED",
    "DETECTED",
    "FIRE_START_DATE",
    "START_DATE",
];

/// Date d'extinction
pub const EXTINGUISHED_ALIASES: &[&str] = &[
    "FIRE_OUT_DATE",
    "OUT_DATE",
    "DATE_OUT",
    "DATE_EXTINGUISHED",
    "OUT_TIME",
    "EXTINGUISHED",
    "FIRE_STAT_DATE",
];

/// Date de dernière mise à jour du statut
pub const STATUS_DATE_ALIASES: &[&str] = &["FIRE_STAT_DATE"];

/// Horodatage ou drapeau de récupération depuis la source
pub const RETRIEVED_ALIASES: &[&str] = &[
    "FETCHED_FROM_ERD",
    "FETCHED_FROM_GNB",
    "GNB_FETCHED",
    "GNB_RETRIEVED_AT",
    "RETRIEVED_FROM_GNB",
    "FETCHED_AT",
    "FETCH_TIMESTAMP",
    "SOURCE_FETCHED_AT",
    "ERD_FETCHED_AT",
];

/// Seuil de magnitude séparant les secondes des millisecondes epoch
const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

static EMBEDDED_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(\.\d+)?").expect("static regex"));

/// Recherche une valeur par nom de champ, d'abord à l'identique puis sans
/// tenir compte de la casse
fn lookup<'a>(props: &'a Properties, alias: &str) -> Option<(&'a str, &'a PropertyValue)> {
    if let Some((key, value)) = props.get_key_value(alias) {
        return Some((key.as_str(), value));
    }
    props
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(alias))
        .map(|(key, value)| (key.as_str(), value))
}

/// Retourne le premier alias présent et non vide, avec sa valeur
///
/// `null` et la chaîne vide comptent comme absents. L'ordre des alias est
/// significatif.
pub fn extract_first<'a>(
    props: &'a Properties,
    aliases: &[&str],
) -> Option<(&'a str, &'a PropertyValue)> {
    aliases
        .iter()
        .filter_map(|alias| lookup(props, alias))
        .find(|(_, value)| !value.is_absent())
}

/// Retourne le texte du premier alias présent
pub fn extract_text(props: &Properties, aliases: &[&str]) -> Option<String> {
    extract_first(props, aliases).and_then(|(_, value)| value.as_text())
}

/// Parse un nombre "tolérant"
///
/// - un nombre fini est retourné tel quel
/// - une chaîne numérique est parsée
/// - sinon la première sous-chaîne décimale signée est extraite ("12.5 ha" → 12.5)
pub fn parse_number_loose(value: &PropertyValue) -> Option<f64> {
    match value {
        PropertyValue::Number(n) if n.is_finite() => Some(*n),
        PropertyValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return Some(n);
                }
            }
            EMBEDDED_NUMBER
                .find(trimmed)
                .and_then(|m| m.as_str().parse::<f64>().ok())
        }
        _ => None,
    }
}

/// Parse une date "tolérante" en epoch millisecondes (UTC)
///
/// Ordre de priorité:
/// 1. `YYYYMMDD` sur 8 chiffres (mois 1-12, jour 1-31) → minuit UTC
/// 2. formats de date usuels (RFC 3339, RFC 2822, `YYYY-MM-DD[ HH:MM[:SS]]`)
/// 3. nombre epoch: secondes si < 1e12, millisecondes sinon
///
/// Un instant hors de la plage représentable par `chrono` donne `None`.
///
/// Un jour hors du mois (ex: 20240231) déborde sur le mois suivant.
pub fn parse_date_loose(value: &PropertyValue) -> Option<i64> {
    let text = match value {
        PropertyValue::Number(n) if n.is_finite() => n.to_string(),
        PropertyValue::Text(s) => s.trim().to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }

    if let Some(ms) = parse_yyyymmdd(&text) {
        return Some(ms);
    }

    if let Some(ms) = parse_standard_date(&text) {
        return Some(ms);
    }

    let n = text.parse::<f64>().ok()?;
    if !n.is_finite() || n <= 0.0 {
        return None;
    }
    let ms = if n < EPOCH_MILLIS_THRESHOLD { n * 1000.0 } else { n };
    // `as` sature: les valeurs hors plage sont rejetées juste après
    let ms = ms.round() as i64;
    DateTime::<Utc>::from_timestamp_millis(ms).map(|_| ms)
}

/// `YYYYMMDD` → minuit UTC, jour débordant reporté sur le mois suivant
fn parse_yyyymmdd(text: &str) -> Option<i64> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = text[0..4].parse().ok()?;
    let month: u32 = text[4..6].parse().ok()?;
    let day: u32 = text[6..8].parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(u64::from(day - 1)))?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

/// Formats de dates usuels; les dates sans fuseau sont interprétées en UTC
fn parse_standard_date(text: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.timestamp_millis());
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
        }
    }

    None
}

/// Borne un pourcentage dans [0, 100] (NaN → 0)
pub fn clamp_percent(n: f64) -> f64 {
    if n.is_nan() {
        return 0.0;
    }
    n.clamp(0.0, 100.0)
}

/// Première date parsable parmi les alias
///
/// Contrairement à [`extract_first`], un alias présent mais illisible
/// ne bloque pas les suivants.
pub fn first_date(props: &Properties, aliases: &[&str]) -> Option<i64> {
    aliases
        .iter()
        .filter_map(|alias| lookup(props, alias))
        .find_map(|(_, value)| parse_date_loose(value))
}

/// Surface en hectares, 0 si introuvable
pub fn area_hectares(props: &Properties) -> f64 {
    extract_first(props, AREA_ALIASES)
        .and_then(|(_, value)| parse_number_loose(value))
        .unwrap_or(0.0)
}

/// Pourcentage de confinement borné dans [0, 100]
pub fn containment_pct(props: &Properties) -> Option<f64> {
    extract_first(props, CONTAINMENT_ALIASES)
        .and_then(|(_, value)| parse_number_loose(value))
        .map(clamp_percent)
}

/// Résout l'information de récupération: date, drapeau oui/non, ou texte brut
pub fn retrieved_info(props: &Properties) -> RetrievedInfo {
    let Some((_, value)) = extract_first(props, RETRIEVED_ALIASES) else {
        return RetrievedInfo::Absent;
    };

    if let PropertyValue::Bool(b) = value {
        return RetrievedInfo::Flag(*b);
    }
    if let Some(ms) = parse_date_loose(value) {
        return RetrievedInfo::At(ms);
    }

    let text = value.as_text().unwrap_or_default();
    match text.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => RetrievedInfo::Flag(true),
        "false" | "no" | "n" | "0" => RetrievedInfo::Flag(false),
        _ => RetrievedInfo::Raw(text),
    }
}
