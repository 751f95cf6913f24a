//! Source file tracking for multi-file datasets
//!
//! The [`FileRegistry`] is an insertion-ordered store of per-file structural
//! metadata. The first registered file becomes the structural baseline; every
//! later file must match it (same variable set, same per-variable dimension
//! lists, same sizes for every dimension except the concatenation dimension).
//! Range queries return files in registration order, which keeps downstream
//! grouping deterministic.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::dataset::AttrValue;
use crate::errors::{FederateError, Result};

/// Dimension list and attributes of one variable or coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableMeta {
    pub dims: Vec<String>,
    pub attrs: BTreeMap<String, AttrValue>,
}

/// Structural metadata of one source file, extracted without reading any
/// bulk data.
///
/// Immutable after registration: re-registering the same path replaces the
/// whole entry rather than mutating it in place.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Minimum and maximum of the concat-dim coordinate, as raw numeric
    /// offsets in the coordinate's own units
    pub coord_range: (f64, f64),
    /// Dimension name -> size
    pub dims: BTreeMap<String, usize>,
    /// Coordinate variables (name matches a dimension)
    pub coords: BTreeMap<String, VariableMeta>,
    /// Data variables
    pub variables: BTreeMap<String, VariableMeta>,
    /// Attributes of the concat-dim coordinate (units, calendar, ...)
    pub coord_attrs: BTreeMap<String, AttrValue>,
    /// Global file attributes
    pub attrs: BTreeMap<String, AttrValue>,
}

/// Insertion-ordered store of [`SourceFile`] entries with structural
/// compatibility enforcement.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    concat_dim: String,
    entries: Vec<SourceFile>,
}

impl FileRegistry {
    /// Create an empty registry tracking files along `concat_dim`.
    pub fn new(concat_dim: impl Into<String>) -> Self {
        FileRegistry {
            concat_dim: concat_dim.into(),
            entries: Vec::new(),
        }
    }

    /// The dimension along which tracked files are concatenated.
    pub fn concat_dim(&self) -> &str {
        &self.concat_dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register a file.
    ///
    /// The first file becomes the baseline. Later files are validated
    /// against it and rejected with a [`FederateError::CompatibilityError`]
    /// naming both files and the mismatching keys. Re-adding an already
    /// registered path replaces its entry in place, keeping its position in
    /// the registration order.
    pub fn add(&mut self, file: SourceFile) -> Result<()> {
        if let Some(baseline) = self.entries.first() {
            // Replacing the baseline itself re-baselines on the new entry
            if baseline.path != file.path {
                self.check_compatible(baseline, &file)?;
            }
        }
        if let Some(existing) = self.entries.iter_mut().find(|e| e.path == file.path) {
            *existing = file;
        } else {
            self.entries.push(file);
        }
        Ok(())
    }

    fn check_compatible(&self, baseline: &SourceFile, file: &SourceFile) -> Result<()> {
        let mut problems: Vec<String> = Vec::new();

        // Variable sets must be equal
        let missing: Vec<&String> = baseline
            .variables
            .keys()
            .filter(|v| !file.variables.contains_key(*v))
            .collect();
        let extra: Vec<&String> = file
            .variables
            .keys()
            .filter(|v| !baseline.variables.contains_key(*v))
            .collect();
        if !missing.is_empty() {
            problems.push(format!("missing variables {:?}", missing));
        }
        if !extra.is_empty() {
            problems.push(format!("extra variables {:?}", extra));
        }

        // Shared variables must agree on their dimension lists
        for (name, base_var) in &baseline.variables {
            if let Some(var) = file.variables.get(name) {
                if var.dims != base_var.dims {
                    problems.push(format!(
                        "variable '{}' has dims {:?}, expected {:?}",
                        name, var.dims, base_var.dims
                    ));
                }
            }
        }

        // All dimensions except the concat dim must have identical sizes
        for (name, base_size) in &baseline.dims {
            if name == &self.concat_dim {
                continue;
            }
            match file.dims.get(name) {
                Some(size) if size == base_size => {}
                Some(size) => problems.push(format!(
                    "dimension '{}' has size {}, expected {}",
                    name, size, base_size
                )),
                None => problems.push(format!("missing dimension '{}'", name)),
            }
        }
        for name in file.dims.keys() {
            if name != &self.concat_dim && !baseline.dims.contains_key(name) {
                problems.push(format!("extra dimension '{}'", name));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(FederateError::CompatibilityError {
                path: file.path.clone(),
                baseline: baseline.path.clone(),
                details: problems.join("; "),
            })
        }
    }

    /// Every file whose `[min, max]` coordinate range intersects `[lo, hi]`
    /// inclusively, in registration order.
    pub fn files_for_range(&self, lo: f64, hi: f64) -> Vec<&Path> {
        self.entries
            .iter()
            .filter(|e| e.coord_range.0 <= hi && e.coord_range.1 >= lo)
            .map(|e| e.path.as_path())
            .collect()
    }

    /// Metadata for one tracked file.
    pub fn info(&self, path: impl AsRef<Path>) -> Result<&SourceFile> {
        let path = path.as_ref();
        self.entries
            .iter()
            .find(|e| e.path == path)
            .ok_or_else(|| FederateError::FileNotTracked {
                path: path.to_path_buf(),
            })
    }

    /// All tracked files in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.entries.iter()
    }

    /// All tracked paths in registration order.
    pub fn paths(&self) -> Vec<&Path> {
        self.entries.iter().map(|e| e.path.as_path()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::source_file;

    #[test]
    fn registration_preserves_insertion_order() {
        let mut reg = FileRegistry::new("time");
        reg.add(source_file("b.nc", (10.0, 19.0))).unwrap();
        reg.add(source_file("a.nc", (0.0, 9.0))).unwrap();
        reg.add(source_file("c.nc", (20.0, 29.0))).unwrap();
        let paths: Vec<_> = reg.paths();
        assert_eq!(paths, vec![Path::new("b.nc"), Path::new("a.nc"), Path::new("c.nc")]);
    }

    #[test]
    fn readding_a_path_replaces_in_place() {
        let mut reg = FileRegistry::new("time");
        reg.add(source_file("a.nc", (0.0, 9.0))).unwrap();
        reg.add(source_file("b.nc", (10.0, 19.0))).unwrap();
        reg.add(source_file("a.nc", (0.0, 4.0))).unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.info("a.nc").unwrap().coord_range, (0.0, 4.0));
        assert_eq!(reg.paths()[0], Path::new("a.nc"));
    }

    #[test]
    fn incompatible_variables_are_rejected() {
        let mut reg = FileRegistry::new("time");
        reg.add(source_file("base.nc", (0.0, 9.0))).unwrap();

        let mut bad = source_file("bad.nc", (10.0, 19.0));
        bad.variables.remove("temperature");
        bad.variables.insert(
            "pressure".to_string(),
            VariableMeta {
                dims: vec!["time".to_string(), "lat".to_string()],
                attrs: BTreeMap::new(),
            },
        );

        let err = reg.add(bad).unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("bad.nc"));
        assert!(msg.contains("base.nc"));
        assert!(msg.contains("temperature"));
        assert!(msg.contains("pressure"));
        // Failed add leaves the registry untouched
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn incompatible_dimension_size_is_rejected() {
        let mut reg = FileRegistry::new("time");
        reg.add(source_file("base.nc", (0.0, 9.0))).unwrap();

        let mut bad = source_file("bad.nc", (10.0, 19.0));
        bad.dims.insert("lat".to_string(), 6);
        let err = reg.add(bad).unwrap_err();
        assert!(format!("{}", err).contains("'lat'"));

        // The concat dimension may differ freely
        let mut ok = source_file("ok.nc", (10.0, 19.0));
        ok.dims.insert("time".to_string(), 99);
        reg.add(ok).unwrap();
    }

    #[test]
    fn range_queries_are_inclusive_and_ordered() {
        let mut reg = FileRegistry::new("time");
        reg.add(source_file("a.nc", (0.0, 9.0))).unwrap();
        reg.add(source_file("b.nc", (10.0, 19.0))).unwrap();
        reg.add(source_file("c.nc", (20.0, 29.0))).unwrap();

        assert_eq!(reg.files_for_range(5.0, 15.0), vec![Path::new("a.nc"), Path::new("b.nc")]);
        // Inclusive at both endpoints
        assert_eq!(reg.files_for_range(9.0, 9.0), vec![Path::new("a.nc")]);
        assert_eq!(reg.files_for_range(9.0, 10.0), vec![Path::new("a.nc"), Path::new("b.nc")]);
        assert_eq!(reg.files_for_range(30.0, 40.0), Vec::<&Path>::new());
        assert_eq!(
            reg.files_for_range(-100.0, 100.0),
            vec![Path::new("a.nc"), Path::new("b.nc"), Path::new("c.nc")]
        );
    }

    #[test]
    fn info_for_untracked_path_errors() {
        let reg = FileRegistry::new("time");
        let err = reg.info("nowhere.nc").unwrap_err();
        assert!(matches!(err, FederateError::FileNotTracked { .. }));
    }
}
