//! Export vers GeoJSON (streaming, une feature à la fois)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{feature::Id, Feature, Geometry, JsonObject, Value};

use super::rows::FireRow;

/// Exporte les lignes en FeatureCollection de points WGS84
pub fn export_to_geojson(rows: &[FireRow], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    write_collection(&mut writer, rows)?;
    writer.flush()?;
    Ok(())
}

/// Écrit la FeatureCollection complète
pub fn write_collection<W: Write>(writer: &mut W, rows: &[FireRow]) -> Result<()> {
    write!(writer, r#"{{"type":"FeatureCollection","features":["#)?;
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, row)?;
    }
    write!(writer, "]}}")?;
    Ok(())
}

/// Construit la feature d'une ligne
pub fn to_feature(row: &FireRow) -> Result<Feature> {
    let properties: JsonObject = match serde_json::to_value(row)? {
        serde_json::Value::Object(map) => map,
        other => anyhow::bail!("Row did not serialize to an object: {}", other),
    };

    Ok(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![row.x, row.y]))),
        id: Some(Id::String(row.record_id.clone())),
        properties: Some(properties),
        foreign_members: None,
    })
}

fn write_feature<W: Write>(writer: &mut W, row: &FireRow) -> Result<()> {
    let feature = to_feature(row)?;
    serde_json::to_writer(writer, &feature)?;
    Ok(())
}
