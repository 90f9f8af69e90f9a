//! Classification des statuts de feu
//!
//! Le texte libre de statut est normalisé (trim + minuscules) puis associé à
//! une clé canonique, une couleur d'affichage et un rang de sévérité.
//! Un statut inconnu ou absent tombe dans `other`, avec la même sévérité
//! (-1) et la même couleur de repli qu'un feu éteint: seul
//! `raw_status_text` sur l'enregistrement permet de les distinguer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::types::CanonicalFireRecord;

/// Couleur de repli (statut inconnu et feux éteints)
pub const FALLBACK_COLOR: &str = "#0000FF";

/// Clé de statut canonique
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    IntoStaticStr,
)]
pub enum StatusKey {
    #[serde(rename = "out of control")]
    #[strum(serialize = "out of control")]
    OutOfControl,
    #[serde(rename = "being monitored")]
    #[strum(serialize = "being monitored")]
    BeingMonitored,
    #[serde(rename = "contained")]
    #[strum(serialize = "contained")]
    Contained,
    #[serde(rename = "under control")]
    #[strum(serialize = "under control")]
    UnderControl,
    #[serde(rename = "being patrolled")]
    #[strum(serialize = "being patrolled")]
    BeingPatrolled,
    #[serde(rename = "extinguished")]
    #[strum(serialize = "extinguished")]
    Extinguished,
    #[serde(rename = "other")]
    #[strum(serialize = "other")]
    Other,
}

/// Statuts actifs, dans l'ordre d'affichage
pub const ACTIVE_KEYS: [StatusKey; 5] = [
    StatusKey::OutOfControl,
    StatusKey::BeingMonitored,
    StatusKey::Contained,
    StatusKey::UnderControl,
    StatusKey::BeingPatrolled,
];

impl StatusKey {
    /// Normalise un texte libre (casse et espaces ignorés)
    pub fn from_text(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "out of control" => StatusKey::OutOfControl,
            "being monitored" => StatusKey::BeingMonitored,
            "contained" => StatusKey::Contained,
            "under control" => StatusKey::UnderControl,
            "being patrolled" => StatusKey::BeingPatrolled,
            "extinguished" => StatusKey::Extinguished,
            _ => StatusKey::Other,
        }
    }

    /// Clé canonique en minuscules
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn severity_rank(&self) -> i8 {
        match self {
            StatusKey::OutOfControl => 4,
            StatusKey::BeingMonitored => 3,
            StatusKey::Contained => 2,
            StatusKey::UnderControl => 1,
            StatusKey::BeingPatrolled => 0,
            StatusKey::Extinguished | StatusKey::Other => -1,
        }
    }

    /// Libellé d'affichage ("out of control" → "Out Of Control")
    pub fn label(&self) -> String {
        title_case(self.as_str())
    }

    pub fn is_active(&self) -> bool {
        *self != StatusKey::Extinguished
    }
}

/// Met en majuscule la première lettre de chaque mot
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Libellé d'un enregistrement: texte d'origine normalisé pour un statut
/// non reconnu, libellé canonique sinon
pub fn display_status(record: &CanonicalFireRecord) -> String {
    match (&record.status_key, &record.raw_status_text) {
        (StatusKey::Other, Some(raw)) => title_case(&raw.trim().to_lowercase()),
        (key, _) => key.label(),
    }
}

/// Résultat de la classification d'un statut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusInfo<'a> {
    pub key: StatusKey,
    pub color: &'a str,
    pub severity_rank: i8,
}

/// Couleurs d'affichage par statut
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPalette {
    pub out_of_control: String,
    pub being_monitored: String,
    pub contained: String,
    pub under_control: String,
    pub being_patrolled: String,
    pub extinguished: String,
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_fallback() -> String {
    FALLBACK_COLOR.to_string()
}

impl Default for StatusPalette {
    fn default() -> Self {
        Self {
            out_of_control: "#E53935".into(),
            being_monitored: "#FB8C00".into(),
            contained: "#FDD835".into(),
            under_control: "#43A047".into(),
            being_patrolled: "#8E24AA".into(),
            extinguished: FALLBACK_COLOR.into(),
            fallback: FALLBACK_COLOR.into(),
        }
    }
}

impl StatusPalette {
    pub fn color(&self, key: StatusKey) -> &str {
        match key {
            StatusKey::OutOfControl => &self.out_of_control,
            StatusKey::BeingMonitored => &self.being_monitored,
            StatusKey::Contained => &self.contained,
            StatusKey::UnderControl => &self.under_control,
            StatusKey::BeingPatrolled => &self.being_patrolled,
            StatusKey::Extinguished => &self.extinguished,
            StatusKey::Other => &self.fallback,
        }
    }

    /// Classifie un texte de statut avec cette palette
    pub fn classify(&self, status_text: &str) -> StatusInfo<'_> {
        let key = StatusKey::from_text(status_text);
        StatusInfo {
            key,
            color: self.color(key),
            severity_rank: key.severity_rank(),
        }
    }
}

static DEFAULT_PALETTE: std::sync::LazyLock<StatusPalette> =
    std::sync::LazyLock::new(StatusPalette::default);

/// Classifie un texte de statut avec la palette par défaut
pub fn classify(status_text: &str) -> StatusInfo<'static> {
    DEFAULT_PALETTE.classify(status_text)
}

/// Statut le plus grave d'un groupe (ex: couleur d'un cluster)
///
/// En cas d'égalité, le premier rencontré l'emporte.
pub fn worst_status<I>(keys: I) -> Option<StatusKey>
where
    I: IntoIterator<Item = StatusKey>,
{
    let mut worst: Option<StatusKey> = None;
    for key in keys {
        match worst {
            Some(current) if current.severity_rank() >= key.severity_rank() => {}
            _ => worst = Some(key),
        }
    }
    worst
}

/// Filtre d'affichage par statut
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    enabled: BTreeSet<StatusKey>,
}

impl Default for StatusFilter {
    /// Tous les statuts actifs (et `other`), pas les feux éteints
    fn default() -> Self {
        let mut filter = Self {
            enabled: BTreeSet::new(),
        };
        filter.enable_all_active();
        filter
    }
}

impl StatusFilter {
    /// Filtre n'acceptant aucun statut
    pub fn none() -> Self {
        Self {
            enabled: BTreeSet::new(),
        }
    }

    /// Filtre acceptant tous les statuts
    pub fn all() -> Self {
        Self {
            enabled: StatusKey::iter().collect(),
        }
    }

    pub fn is_enabled(&self, key: StatusKey) -> bool {
        self.enabled.contains(&key)
    }

    pub fn enable(&mut self, key: StatusKey) {
        self.enabled.insert(key);
    }

    pub fn disable(&mut self, key: StatusKey) {
        self.enabled.remove(&key);
    }

    /// N'active que ce statut
    pub fn only(&mut self, key: StatusKey) {
        self.enabled.clear();
        self.enabled.insert(key);
    }

    /// Active tous les statuts actifs sans toucher à `extinguished`
    pub fn enable_all_active(&mut self) {
        self.enabled.extend(ACTIVE_KEYS);
        self.enabled.insert(StatusKey::Other);
    }

    pub fn enabled(&self) -> impl Iterator<Item = StatusKey> + '_ {
        self.enabled.iter().copied()
    }

    /// Enregistrements dont le statut est actif dans le filtre
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a CanonicalFireRecord>
    where
        I: IntoIterator<Item = &'a CanonicalFireRecord>,
    {
        records
            .into_iter()
            .filter(|record| self.is_enabled(record.status_key))
            .collect()
    }
}
