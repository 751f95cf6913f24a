//! Opening many files as one federated dataset
//!
//! Orchestrates the per-file metadata reads, registry population, structure
//! merging, and frequency inference. The whole operation is atomic at the
//! API level: any I/O, metadata, or compatibility failure aborts the open
//! and no partially populated dataset escapes.

use std::path::{Path, PathBuf};

use crate::dataset::{AttrValue, FederatedDataset};
use crate::errors::{FederateError, Result};
use crate::frequency::infer_frequency;
use crate::reader::read_file_metadata;
use crate::registry::FileRegistry;

/// Open an explicit ordered list of files as one federated dataset.
///
/// Files are read and registered in the given order, which becomes the
/// registration order used by range queries and grouping. The merged concat
/// dimension size is the sum of the per-file extents (this assumes files
/// are contiguous and non-overlapping along the concat dimension, the normal
/// layout for split time series). All other structure comes from the first
/// file. After registration, the sampling frequency is inferred from the
/// combined coordinate values of all files and stored as the `"frequency"`
/// attribute of the concat-dim coordinate; irregular spacing simply leaves
/// the attribute unset.
pub fn open_mfdataset<P: AsRef<Path>>(paths: &[P], concat_dim: &str) -> Result<FederatedDataset> {
    if paths.is_empty() {
        return Err(FederateError::Generic("No files provided".to_string()));
    }

    let mut registry = FileRegistry::new(concat_dim);
    let mut all_values: Vec<f64> = Vec::new();
    for path in paths {
        let scan = read_file_metadata(path.as_ref(), concat_dim)?;
        all_values.extend_from_slice(&scan.coord_values);
        registry.add(scan.source)?;
    }

    let mut ds = combine_structure(&registry, concat_dim)?;

    let (units, calendar) = {
        let coord = ds
            .coords
            .get(concat_dim)
            .ok_or_else(|| FederateError::MissingCoordAttr {
                coord: concat_dim.to_string(),
                attr: "units".to_string(),
            })?;
        let units = coord
            .attrs
            .get("units")
            .and_then(AttrValue::as_str)
            .ok_or_else(|| FederateError::MissingCoordAttr {
                coord: concat_dim.to_string(),
                attr: "units".to_string(),
            })?
            .to_string();
        let calendar = match coord.attrs.get("calendar").and_then(AttrValue::as_str) {
            Some(name) => name.parse()?,
            None => crate::calendar::Calendar::Standard,
        };
        (units, calendar)
    };

    if let Some(freq) = infer_frequency(&all_values, &units, calendar) {
        if let Some(coord) = ds.coords.get_mut(concat_dim) {
            coord.attrs.insert("frequency".to_string(), AttrValue::Str(freq));
        }
    }

    ds.enable_file_tracking(concat_dim);
    for entry in registry.iter() {
        ds.add_file_source(entry.clone())?;
    }

    Ok(ds)
}

/// Open every file matching a glob pattern, in lexicographic order.
pub fn open_mfdataset_glob(pattern: &str, concat_dim: &str) -> Result<FederatedDataset> {
    let paths = expand_glob(pattern)?;
    open_mfdataset(&paths, concat_dim)
}

fn combine_structure(registry: &FileRegistry, concat_dim: &str) -> Result<FederatedDataset> {
    let first = registry
        .iter()
        .next()
        .ok_or_else(|| FederateError::Generic("No files provided".to_string()))?;

    let total_concat: usize = registry
        .iter()
        .map(|e| e.dims.get(concat_dim).copied().unwrap_or(0))
        .sum();

    let mut ds = FederatedDataset::new();
    for (name, size) in &first.dims {
        let size = if name == concat_dim { total_concat } else { *size };
        ds.add_dim(name.clone(), size);
    }
    for (name, meta) in &first.coords {
        ds.add_coord(name.clone(), meta.dims.clone(), meta.attrs.clone());
    }
    for (name, meta) in &first.variables {
        ds.add_variable(name.clone(), meta.dims.clone(), meta.attrs.clone());
    }
    for (key, value) in &first.attrs {
        ds.assign_attr(key.clone(), value.clone());
    }
    Ok(ds)
}

/// Expand a glob pattern into a lexicographically sorted list of paths.
///
/// Only `*` wildcards in the filename component are supported (e.g.
/// `"data/temp_*.nc"`); directory components must be literal. A pattern
/// matching nothing is an error, since silently opening zero files would
/// only defer the failure to a more confusing place.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let pat = Path::new(pattern);
    let dir = match pat.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if dir.to_string_lossy().contains('*') {
        return Err(FederateError::Generic(format!(
            "Wildcards are only supported in the filename component: {}",
            pattern
        )));
    }
    let name_pattern = pat
        .file_name()
        .ok_or_else(|| FederateError::Generic(format!("Invalid glob pattern: {}", pattern)))?
        .to_string_lossy()
        .into_owned();

    let mut matches: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if wildcard_match(&name_pattern, &name) {
            matches.push(entry.path());
        }
    }
    matches.sort();

    if matches.is_empty() {
        return Err(FederateError::NoFilesMatched {
            pattern: pattern.to_string(),
        });
    }
    Ok(matches)
}

/// Match `name` against `pattern`, where `*` matches any (possibly empty)
/// substring. Iterative with single-star backtracking.
fn wildcard_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn wildcard_matching() {
        assert!(wildcard_match("*.nc", "data.nc"));
        assert!(wildcard_match("temp_*.nc", "temp_2000.nc"));
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("a*b*c", "axxbyyc"));
        assert!(!wildcard_match("*.nc", "data.txt"));
        assert!(!wildcard_match("temp_*.nc", "pressure_2000.nc"));
        assert!(!wildcard_match("a?c", "abc"));
        assert!(wildcard_match("exact.nc", "exact.nc"));
    }

    #[test]
    fn glob_expansion_sorts_lexicographically() {
        let dir = tempdir().expect("Failed to create temp dir");
        for name in ["c.nc", "a.nc", "b.nc", "skip.txt"] {
            File::create(dir.path().join(name)).expect("Failed to create file");
        }
        let pattern = dir.path().join("*.nc");
        let paths = expand_glob(&pattern.to_string_lossy()).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.nc", "b.nc", "c.nc"]);
    }

    #[test]
    fn glob_with_no_matches_is_an_error() {
        let dir = tempdir().expect("Failed to create temp dir");
        let pattern = dir.path().join("*.nc");
        let err = expand_glob(&pattern.to_string_lossy()).unwrap_err();
        assert!(matches!(err, FederateError::NoFilesMatched { .. }));
    }

    #[test]
    fn empty_path_list_is_an_error() {
        let paths: Vec<PathBuf> = Vec::new();
        assert!(open_mfdataset(&paths, "time").is_err());
    }
}
