//! Loading the algorithm catalogue from a folder of declaration files.

use std::path::Path;

use tracing::{info, warn};

use crate::algorithm::SagaAlgorithm;
use crate::error::Result;

/// Load every `*.txt` declaration in `dir`, in file name order.
///
/// Files that fail to parse are logged and skipped.
pub fn load_algorithms<P: AsRef<Path>>(dir: P) -> Result<Vec<SagaAlgorithm>> {
    let dir = dir.as_ref();
    let mut files: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|e| e.eq_ignore_ascii_case("txt"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();

    let mut algorithms = Vec::with_capacity(files.len());
    for file in &files {
        match SagaAlgorithm::from_file(file) {
            Ok(alg) => algorithms.push(alg),
            Err(e) => warn!(file = %file.display(), error = %e, "could not load SAGA algorithm"),
        }
    }
    info!(
        dir = %dir.display(),
        loaded = algorithms.len(),
        skipped = files.len() - algorithms.len(),
        "SAGA algorithms loaded"
    );
    Ok(algorithms)
}
