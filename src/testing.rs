//! Shared fixtures for unit tests.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::dataset::AttrValue;
use crate::registry::{SourceFile, VariableMeta};

/// A minimal source file with a `time` concat dim, a `lat` dim of 5, and one
/// `temperature` variable.
pub(crate) fn source_file(path: &str, range: (f64, f64)) -> SourceFile {
    source_file_with_units(path, range, "days since 2000-01-01", "standard")
}

pub(crate) fn source_file_with_units(
    path: &str,
    range: (f64, f64),
    units: &str,
    calendar: &str,
) -> SourceFile {
    let mut dims = BTreeMap::new();
    dims.insert("time".to_string(), (range.1 - range.0) as usize + 1);
    dims.insert("lat".to_string(), 5);

    let mut coord_attrs = BTreeMap::new();
    coord_attrs.insert("units".to_string(), AttrValue::from(units));
    coord_attrs.insert("calendar".to_string(), AttrValue::from(calendar));

    let mut coords = BTreeMap::new();
    coords.insert(
        "time".to_string(),
        VariableMeta {
            dims: vec!["time".to_string()],
            attrs: coord_attrs.clone(),
        },
    );

    let mut variables = BTreeMap::new();
    variables.insert(
        "temperature".to_string(),
        VariableMeta {
            dims: vec!["time".to_string(), "lat".to_string()],
            attrs: BTreeMap::new(),
        },
    );

    SourceFile {
        path: PathBuf::from(path),
        coord_range: range,
        dims,
        coords,
        variables,
        coord_attrs,
        attrs: BTreeMap::new(),
    }
}
