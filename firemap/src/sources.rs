//! Localisation des fichiers sources dans le répertoire de données

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Aucun candidat trouvé pour une source
#[derive(Debug, Error)]
#[error("Source '{base}' not found (tried: {})", join_paths(.tried))]
pub struct SourceNotFound {
    pub base: String,
    pub tried: Vec<PathBuf>,
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Chemins candidats pour un nom de base, par ordre de priorité
pub fn candidates(data_dir: &Path, base: &str) -> Vec<PathBuf> {
    vec![
        data_dir.join(format!("{base}.json")),
        data_dir.join(format!("{base}.geojson")),
        data_dir.join("data").join(format!("{base}.json")),
        data_dir.join("data").join(format!("{base}.geojson")),
    ]
}

/// Premier candidat existant
pub fn locate_source(data_dir: &Path, base: &str) -> Result<PathBuf, SourceNotFound> {
    let tried = candidates(data_dir, base);
    for path in &tried {
        if path.is_file() {
            debug!(source = base, path = %path.display(), "Source located");
            return Ok(path.clone());
        }
    }
    Err(SourceNotFound {
        base: base.to_string(),
        tried,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("firemap-sources-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("data")).unwrap();
        dir
    }

    #[test]
    fn test_candidate_order() {
        let paths = candidates(Path::new("/srv"), "active_fires");
        assert_eq!(paths[0], PathBuf::from("/srv/active_fires.json"));
        assert_eq!(paths[1], PathBuf::from("/srv/active_fires.geojson"));
        assert_eq!(paths[2], PathBuf::from("/srv/data/active_fires.json"));
        assert_eq!(paths[3], PathBuf::from("/srv/data/active_fires.geojson"));
    }

    #[test]
    fn test_first_hit_wins() {
        let dir = temp_dir("first-hit");
        std::fs::write(dir.join("data/out_fires.json"), "{}").unwrap();
        std::fs::write(dir.join("out_fires.geojson"), "{}").unwrap();

        let found = locate_source(&dir, "out_fires").unwrap();
        assert_eq!(found, dir.join("out_fires.geojson"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_not_found_lists_candidates() {
        let dir = temp_dir("missing");
        let err = locate_source(&dir, "sums_table").unwrap_err();
        assert_eq!(err.tried.len(), 4);
        assert!(err.to_string().contains("sums_table.geojson"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
