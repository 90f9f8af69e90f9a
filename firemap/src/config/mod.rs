//! Configuration de l'application

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use firedata::{parse_time_zone, GeoLocation, StatusPalette, DEFAULT_RADIUS_M};

/// Preset utilisé quand aucun `--config` n'est fourni
pub const DEFAULT_PRESET: &str = "new-brunswick";

/// Configuration principale
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Fuseau de référence pour "aujourd'hui / hier" (identifiant IANA)
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Rayon de la recherche de proximité (mètres)
    #[serde(default = "default_radius")]
    pub nearby_radius_m: f64,

    /// Répertoire des sources (défaut: répertoire courant)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Noms de base des sources
    #[serde(default)]
    pub sources: SourceNames,

    /// Couleurs par statut
    #[serde(default)]
    pub palette: StatusPalette,

    /// Points de référence nommés
    #[serde(default)]
    pub cities: Vec<City>,
}

/// Noms de base des fichiers sources (sans extension)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceNames {
    pub active: String,
    pub extinguished: String,
    pub benchmarks: String,
}

impl Default for SourceNames {
    fn default() -> Self {
        Self {
            active: "active_fires".into(),
            extinguished: "out_fires".into(),
            benchmarks: "sums_table".into(),
        }
    }
}

/// Ville ou village servant de point de référence
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub population: u64,
}

impl City {
    pub fn location(&self) -> GeoLocation {
        GeoLocation::new(self.lat, self.lng)
    }
}

fn default_timezone() -> String {
    "America/Moncton".to_string()
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS_M
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            nearby_radius_m: default_radius(),
            data_dir: None,
            sources: SourceNames::default(),
            palette: StatusPalette::default(),
            cities: Vec::new(),
        }
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "new-brunswick" | "nb" => Self::load_embedded(include_str!("presets/new_brunswick.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: new-brunswick", preset),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Preset embarqué si le nom est connu, sinon chemin de fichier
    pub fn resolve(name_or_path: &str) -> Result<Self> {
        let path = Path::new(name_or_path);
        if path.extension().is_some() || path.exists() {
            Self::load(path)
        } else {
            Self::from_preset(name_or_path)
        }
    }

    /// Applique les variables d'environnement `FIREMAP_*`
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applique des surcharges lues par `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tz) = lookup("FIREMAP_TIMEZONE") {
            self.timezone = tz;
        }
        if let Some(dir) = lookup("FIREMAP_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(radius) = lookup("FIREMAP_RADIUS_M") {
            self.nearby_radius_m = radius
                .trim()
                .parse()
                .context(format!("Invalid FIREMAP_RADIUS_M: {}", radius))?;
        }
        Ok(self)
    }

    /// Fuseau de référence validé
    pub fn time_zone(&self) -> Result<Tz> {
        parse_time_zone(&self.timezone).context("Invalid timezone in configuration")
    }

    /// Répertoire des sources
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Recherche une ville par nom (casse ignorée)
    pub fn find_city(&self, name: &str) -> Option<&City> {
        let wanted = name.trim().to_lowercase();
        self.cities.iter().find(|c| c.name.to_lowercase() == wanted)
    }
}
