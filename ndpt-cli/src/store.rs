use anyhow::{bail, Context};
use ndpt_core::CorrectionTuple;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const STORE_VERSION_V1: u32 = 1;

/// On-disk JSON layout: one record per order, sorted by order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorrectionStoreFileV1 {
    pub version: u32,
    pub corrections: Vec<CorrectionTuple>,
}

fn atomic_write(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load(path: &Path) -> anyhow::Result<Vec<CorrectionTuple>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file: CorrectionStoreFileV1 = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing {}", path.display()))?;
    if file.version != STORE_VERSION_V1 {
        bail!(
            "unsupported store version {} in {} (expected {})",
            file.version,
            path.display(),
            STORE_VERSION_V1
        );
    }
    Ok(file.corrections)
}

/// Merge `records` into the store at `path`, replacing orders that are
/// already present. Returns the number of orders in the store afterwards.
pub fn merge_and_save(path: &Path, records: Vec<CorrectionTuple>) -> anyhow::Result<usize> {
    let mut by_order: BTreeMap<u32, CorrectionTuple> = BTreeMap::new();
    if path.exists() {
        for record in load(path)? {
            by_order.insert(record.0, record);
        }
    }
    for record in records {
        by_order.insert(record.0, record);
    }

    let file = CorrectionStoreFileV1 {
        version: STORE_VERSION_V1,
        corrections: by_order.into_values().collect(),
    };
    let bytes = serde_json::to_vec(&file)?;
    atomic_write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(file.corrections.len())
}
