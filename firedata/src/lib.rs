//! # firedata
//!
//! Normalisation et analyse de jeux de données de feux de forêt ponctuels.
//!
//! ## Features
//!
//! - Résolution des champs par listes d'alias (casse ignorée en repli)
//! - Dates et nombres au format libre (`YYYYMMDD`, ISO 8601, epoch s/ms)
//! - Classification des statuts (clé canonique, couleur, sévérité)
//! - Store à deux partitions (feux actifs / feux éteints) rechargeables
//!   indépendamment, avec diff par empreinte `blake3`
//! - Jours civils dans un fuseau de référence, séries hebdomadaires
//! - Recherche de proximité par distance orthodromique (`geo`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use firedata::{parse_feature_collection, FireContext};
//!
//! let mut ctx = FireContext::for_zone("America/Moncton")?;
//! let active = parse_feature_collection("active_fires", &text)?;
//! ctx.reload_active(&active.features);
//!
//! let stats = ctx.summarize(now_ms);
//! println!("{} feux actifs", stats.active_count);
//! ```

pub mod aggregate;
pub mod collection;
pub mod context;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod proximity;
pub mod record;
pub mod season;
pub mod status;
pub mod store;
pub mod temporal;
pub mod types;

pub use aggregate::{ranked_by_status, summarize, weekly_trend, StatusShare, SummaryStats};
pub use collection::{parse_feature_collection, read_feature_collection, ParsedCollection};
pub use context::FireContext;
pub use error::FireError;
pub use proximity::{nearby_active, NearbyFire, DEFAULT_RADIUS_M};
pub use season::SeasonBenchmarks;
pub use status::{classify, worst_status, StatusFilter, StatusKey, StatusPalette};
pub use store::{FireStore, IngestReport, ReloadReport};
pub use temporal::{build_weekly_series, parse_time_zone, WeeklySeries};
pub use types::{CanonicalFireRecord, GeoLocation, Partition, PropertyValue, RawFeature};
