use crate::error::DataError;
use crate::map::{LineString, MapRenderer};
use geojson::{GeoJson, Geometry, Value};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load every `*.geojson` / `*.json` file in `dir` as basemap lines.
/// Returns the number of lines added.
pub fn load_basemap_dir(renderer: &mut MapRenderer, dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        warn!("basemap directory {} not readable", dir.display());
        return 0;
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("geojson") | Some("json")
            )
        })
        .collect();
    paths.sort();

    // Decode in parallel, insert in path order so rendering is stable
    let decoded: Vec<(PathBuf, Result<Vec<LineString>, DataError>)> = paths
        .into_par_iter()
        .map(|path| {
            let lines = load_lines(&path);
            (path, lines)
        })
        .collect();

    let mut added = 0;
    for (path, result) in decoded {
        match result {
            Ok(lines) => {
                info!("basemap {}: {} lines", path.display(), lines.len());
                added += lines.len();
                for line in lines {
                    renderer.add_basemap_line(line);
                }
            }
            Err(e) => warn!("skipping basemap: {e}"),
        }
    }
    added
}

/// Read one GeoJSON file and extract its line features
pub fn load_lines(path: &Path) -> Result<Vec<LineString>, DataError> {
    let mut bytes = fs::read(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let geojson: GeoJson =
        simd_json::serde::from_slice(&mut bytes).map_err(|e| DataError::GeoJson {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let mut lines = Vec::new();
    process_geojson_lines(&geojson, |line| lines.push(line));
    Ok(lines)
}

/// Walk a GeoJSON document and hand every line-like ring to `add_line`
pub fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut add_line);
        }
    }
}

fn to_line(coords: &[Vec<f64>]) -> LineString {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect()
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(to_line(coords));
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_line(to_line(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}
