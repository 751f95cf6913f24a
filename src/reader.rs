//! Metadata-only reading of single NetCDF files
//!
//! Extracts the structural metadata the federation engine needs (dimension
//! sizes, variable dimension lists, attributes, and the concat-dim
//! coordinate's range) without reading any bulk data. The one exception is
//! the 1-D concat-dim coordinate itself, whose values are needed for the
//! coordinate range and for frequency inference.

use std::collections::BTreeMap;
use std::path::Path;

use crate::calendar::CfTimeUnits;
use crate::dataset::AttrValue;
use crate::errors::{FederateError, Result};
use crate::registry::{SourceFile, VariableMeta};

/// Structural metadata of one file plus the raw concat-dim coordinate
/// values used for frequency inference.
#[derive(Debug, Clone)]
pub struct FileScan {
    pub source: SourceFile,
    pub coord_values: Vec<f64>,
}

/// Read the structural metadata of a single NetCDF file.
///
/// Fails with an open error if the file is missing or unreadable, and a
/// metadata error naming the file if `concat_dim` is absent, has no
/// coordinate variable, the coordinate is empty, or its `units` attribute
/// is missing or not a parseable CF time-units string.
pub fn read_file_metadata(path: &Path, concat_dim: &str) -> Result<FileScan> {
    let file = netcdf::open(path).map_err(|source| FederateError::OpenError {
        path: path.to_path_buf(),
        source,
    })?;

    let metadata_err = |reason: String| FederateError::MetadataError {
        path: path.to_path_buf(),
        reason,
    };

    let mut dims: BTreeMap<String, usize> = BTreeMap::new();
    for dim in file.dimensions() {
        dims.insert(dim.name().to_string(), dim.len());
    }
    if !dims.contains_key(concat_dim) {
        return Err(metadata_err(format!(
            "concatenation dimension '{}' not found",
            concat_dim
        )));
    }

    // Variables whose name matches a dimension are coordinates; the rest
    // are data variables
    let mut coords: BTreeMap<String, VariableMeta> = BTreeMap::new();
    let mut variables: BTreeMap<String, VariableMeta> = BTreeMap::new();
    for var in file.variables() {
        let name = var.name().to_string();
        let var_dims: Vec<String> = var.dimensions().iter().map(|d| d.name().to_string()).collect();
        let mut attrs = BTreeMap::new();
        for attr in var.attributes() {
            if let Ok(value) = attr.value() {
                attrs.insert(attr.name().to_string(), AttrValue::from(value));
            }
        }
        let meta = VariableMeta { dims: var_dims, attrs };
        if dims.contains_key(&name) {
            coords.insert(name, meta);
        } else {
            variables.insert(name, meta);
        }
    }

    let coord_attrs = coords
        .get(concat_dim)
        .map(|c| c.attrs.clone())
        .ok_or_else(|| metadata_err(format!("no coordinate variable for '{}'", concat_dim)))?;

    let units = coord_attrs
        .get("units")
        .and_then(AttrValue::as_str)
        .ok_or_else(|| metadata_err(format!("coordinate '{}' has no units attribute", concat_dim)))?;
    CfTimeUnits::parse(units).map_err(|e| metadata_err(format!("{}", e)))?;

    // The single permitted data read: the 1-D concat-dim coordinate
    let coord_var = file
        .variable(concat_dim)
        .ok_or_else(|| metadata_err(format!("no coordinate variable for '{}'", concat_dim)))?;
    let coord_values: Vec<f64> = coord_var.get_values::<f64, _>(..)?;
    if coord_values.is_empty() {
        return Err(metadata_err(format!("coordinate '{}' is empty", concat_dim)));
    }
    let min = coord_values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = coord_values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let mut attrs = BTreeMap::new();
    for attr in file.attributes() {
        if let Ok(value) = attr.value() {
            attrs.insert(attr.name().to_string(), AttrValue::from(value));
        }
    }

    Ok(FileScan {
        source: SourceFile {
            path: path.to_path_buf(),
            coord_range: (min, max),
            dims,
            coords,
            variables,
            coord_attrs,
            attrs,
        },
        coord_values,
    })
}
