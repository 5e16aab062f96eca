use std::path::{Path, PathBuf};

use crate::color::{hex_to_rgb, Rgb};
use crate::error::{Error, Result};
use crate::features;

/// Index-aligned training samples: `inputs[i]` was extracted from
/// `sources[i]` and `labels[i]` is the color its file name encodes.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub inputs: Vec<Vec<f64>>,
    pub labels: Vec<[f64; 3]>,
    pub sources: Vec<PathBuf>,
}

impl Dataset {
    /// Builds a dataset from a directory of hex-named images such as
    /// `ff0000.png` or `#40e0d0.jpg`.
    ///
    /// Entries are visited in file-name order. Subdirectories and hidden
    /// files are not samples. The first file whose name is not a hex color
    /// or whose contents do not decode aborts the build.
    pub fn build(directory: &Path) -> Result<Dataset> {
        let files = list_sample_files(directory)?;
        let mut dataset = Dataset::default();
        for path in files {
            let label = label_for(&path)?;
            let input = features::extract_file(&path)?;
            log::debug!("{} -> {}", path.display(), label);
            dataset.push(input, label.to_unit(), path);
        }
        log::info!("loaded {} samples from {}", dataset.len(), directory.display());
        Ok(dataset)
    }

    pub fn push(&mut self, input: Vec<f64>, label: [f64; 3], source: PathBuf) {
        self.inputs.push(input);
        self.labels.push(label);
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// The ground-truth color encoded in a file name: the full name minus its
/// extension, parsed as hex.
pub fn label_for(path: &Path) -> Result<Rgb> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::FilenameFormat(path.to_path_buf()))?;
    hex_to_rgb(stem).map_err(|_| Error::FilenameFormat(path.to_path_buf()))
}

fn list_sample_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(directory).map_err(|source| Error::Read {
        path: directory.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !entry.file_type()?.is_file() {
            continue;
        }
        files.push(entry.path());
    }
    files.sort();
    Ok(files)
}
