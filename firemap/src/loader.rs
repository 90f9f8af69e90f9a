//! Chargement des sources dans un contexte

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};

use firedata::{read_feature_collection, FireContext, Partition, SeasonBenchmarks};

use crate::config::Config;
use crate::report::LoadReport;
use crate::sources::locate_source;

/// Données chargées pour une exécution
#[derive(Debug)]
pub struct Dataset {
    pub context: FireContext,
    pub benchmarks: Option<SeasonBenchmarks>,
    pub report: LoadReport,
}

/// Charge les deux partitions et les repères de saison
///
/// Une source absente ou illisible est consignée dans le rapport; seule une
/// configuration invalide fait échouer le chargement.
pub fn load_dataset(config: &Config, now: DateTime<Utc>) -> Result<Dataset> {
    let start = Instant::now();
    let tz = config.time_zone()?;
    let data_dir = config.data_dir();

    let mut context = FireContext::new(tz).with_radius(config.nearby_radius_m);
    let mut report = LoadReport::new(&now.to_rfc3339_opts(SecondsFormat::Secs, true));

    for (partition, base) in [
        (Partition::Active, config.sources.active.as_str()),
        (Partition::Extinguished, config.sources.extinguished.as_str()),
    ] {
        if let Err(e) = load_partition(&mut context, &mut report, &data_dir, partition, base) {
            warn!(source = base, error = %format!("{:#}", e), "Source not loaded");
            report.record_source_failure(base, &format!("{:#}", e));
        }
    }

    let benchmarks = match load_benchmarks(&data_dir, &config.sources.benchmarks) {
        Ok(bench) => {
            report.record_source_success();
            bench
        }
        Err(e) => {
            warn!(source = %config.sources.benchmarks, error = %format!("{:#}", e), "Benchmarks not loaded");
            report.record_warning(&config.sources.benchmarks, &format!("{:#}", e));
            None
        }
    };

    report.set_duration(start.elapsed());
    report.finalize();

    info!(
        records = context.store().len(),
        status = ?report.status,
        "Sources loaded"
    );

    Ok(Dataset {
        context,
        benchmarks,
        report,
    })
}

fn load_partition(
    context: &mut FireContext,
    report: &mut LoadReport,
    data_dir: &Path,
    partition: Partition,
    base: &str,
) -> Result<()> {
    let path = locate_source(data_dir, base)?;
    let parsed = read_feature_collection(&path)
        .context(format!("Failed to read source: {}", path.display()))?;

    let reload = match partition {
        Partition::Active => context.reload_active(&parsed.features),
        Partition::Extinguished => context.reload_extinguished(&parsed.features),
    };
    report.record_reload(base, &reload, parsed.malformed);
    Ok(())
}

fn load_benchmarks(data_dir: &Path, base: &str) -> Result<Option<SeasonBenchmarks>> {
    let path = locate_source(data_dir, base)?;
    let text = std::fs::read_to_string(&path)
        .context(format!("Failed to read source: {}", path.display()))?;
    Ok(SeasonBenchmarks::from_json_str(base, &text)?)
}
