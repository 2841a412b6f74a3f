//! Initial dataset sources.
//!
//! The server loads exactly one dataset before it binds its listener: either
//! the built-in [`reference_dataset`] or a JSON file given with `--data-file`.

use anyhow::{Context, bail};
use motostream_core::types::{Motorcycle, MotorcycleId, Specification};
use std::{collections::HashMap, path::Path};

/// The four motorcycles served by default.
pub fn reference_dataset() -> HashMap<MotorcycleId, Motorcycle> {
    [
        Motorcycle::new(
            "1",
            "Suzuki",
            "Bandit 650",
            Specification::new(2000, "red", 6500.0),
        ),
        Motorcycle::new(
            "2",
            "Suzuki",
            "V-Strom 650",
            Specification::new(2005, "black", 15500.0),
        ),
        Motorcycle::new(
            "3",
            "Honda",
            "Varadero 1000",
            Specification::new(2002, "blue", 7200.0),
        ),
        Motorcycle::new(
            "4",
            "Kawasaki",
            "Vulcan 900",
            Specification::new(1997, "green", 12000.0),
        ),
    ]
    .into_iter()
    .map(|moto| (moto.id.clone(), moto))
    .collect()
}

/// Reads a JSON array of motorcycles from `path`.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed, or if two records share an id.
pub fn load_dataset_file(path: &Path) -> anyhow::Result<HashMap<MotorcycleId, Motorcycle>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_dataset(&raw).with_context(|| format!("invalid dataset in {}", path.display()))
}

fn parse_dataset(raw: &str) -> anyhow::Result<HashMap<MotorcycleId, Motorcycle>> {
    let records: Vec<Motorcycle> = serde_json::from_str(raw)?;
    let mut dataset = HashMap::with_capacity(records.len());
    for moto in records {
        if dataset.contains_key(&moto.id) {
            bail!("duplicate motorcycle id {}", moto.id);
        }
        dataset.insert(moto.id.clone(), moto);
    }
    Ok(dataset)
}
