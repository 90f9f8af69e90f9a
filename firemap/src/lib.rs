//! # firemap
//!
//! Tableau de bord des feux de forêt du Nouveau-Brunswick en ligne de commande.
//!
//! ## Features
//!
//! - Chargement des sources GeoJSON (feux actifs, feux éteints, repères de saison)
//! - Synthèse par statut, tendance hebdomadaire, feux proches d'une ville
//! - Export CSV, JSON ou GeoJSON
//!
//! ## Usage CLI
//!
//! ```bash
//! firemap --data ./data summary
//! firemap --data ./data nearby --city Fredericton --radius 50000
//! firemap --data ./data export --output fires.csv --stats stats.json
//! ```

pub mod config;
pub mod export;
pub mod loader;
pub mod report;
pub mod sources;

pub use config::{City, Config};
pub use loader::{load_dataset, Dataset};
pub use report::{LoadReport, LoadStatus};
