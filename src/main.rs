//! Entry point for the nc-federate command-line tool.
//! Handles CLI parsing, multi-file opening, and dispatches queries like
//! time grouping or source-file lookups.

use clap::Parser;

use nc_federate::cli::Args;
use nc_federate::dataset::{CoordSelector, FederatedDataset};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    println!(
        r#"
------------------------------------------------------------------
        _   _  ____  _____        _                _
       | \ | |/ ___||  ___|__  __| | ___ _ __ __ _| |_ ___
       |  \| | |    | |_ / _ \/ _` |/ _ \ '__/ _` | __/ _ \
       | |\  | |___ |  _|  __/ (_| |  __/ | | (_| | ||  __/
       |_| \_|\____||_|  \___|\__,_|\___|_|  \__,_|\__\___|
                Multi-file NetCDF metadata tool
------------------------------------------------------------------
"#
    );

    // A single input containing '*' is treated as a glob pattern
    let ds = if args.inputs.len() == 1 && args.inputs[0].contains('*') {
        FederatedDataset::open_mfdataset_glob(&args.inputs[0], &args.concat_dim)?
    } else {
        FederatedDataset::open_mfdataset(&args.inputs, &args.concat_dim)?
    };
    let n_files = ds.registry().map(|r| r.len()).unwrap_or(0);
    println!("Successfully opened {} file(s) along '{}'", n_files, args.concat_dim);
    println!();

    let mut handled = false;

    if let Some((lo, hi)) = args.files_for {
        let files = ds.get_source_files(Some(CoordSelector::Offset { min: lo, max: hi }))?;
        println!("Files covering offsets {}..={}:", lo, hi);
        for path in &files {
            println!("    {}", path.display());
        }
        handled = true;
    }

    if let Some((start, end)) = args.files_between {
        let files = ds.get_source_files(Some(CoordSelector::Date { start, end }))?;
        println!("Files covering {} .. {}:", start, end);
        for path in &files {
            println!("    {}", path.display());
        }
        handled = true;
    }

    if let Some(name) = &args.describe {
        let meta = ds
            .variables
            .get(name)
            .or_else(|| ds.coords.get(name))
            .ok_or_else(|| format!("Variable '{}' not found in dataset", name))?;
        println!("Variable: {}", name);
        println!("    dimensions: ({})", meta.dims.join(", "));
        if meta.attrs.is_empty() {
            println!("    attributes: (none)");
        } else {
            println!("    attributes:");
            for (key, value) in &meta.attrs {
                println!("        {}: {}", key, value);
            }
        }
        handled = true;
    }

    if let Some(path) = &args.file_info {
        let info = ds.get_file_info(path)?;
        println!("File: {}", info.path.display());
        println!(
            "    coordinate range: [{}, {}]",
            info.coord_range.0, info.coord_range.1
        );
        for (name, size) in &info.dims {
            println!("    dimension {}: {}", name, size);
        }
        for name in info.variables.keys() {
            println!("    variable {}", name);
        }
        handled = true;
    }

    if let Some(spec) = &args.groupby {
        let groups = ds.groupby_time(spec, !args.keep_units)?;
        println!("Grouped into {} period(s) of {}:", groups.len(), spec);
        for group in &groups {
            let size = group
                .dataset
                .dims
                .get(&args.concat_dim)
                .copied()
                .unwrap_or(0);
            println!(
                "    period {:>3}: offsets [{}, {}), {} step(s), {} file(s)",
                group.period_index,
                group.start_offset,
                group.end_offset,
                size,
                group.member_files().len()
            );
            for path in group.member_files() {
                println!("        {}", path.display());
            }
        }
        handled = true;
    }

    if !handled {
        if args.json {
            println!("{}", ds.to_json_string()?);
        } else {
            println!("{}", ds);
        }
    }

    Ok(())
}
