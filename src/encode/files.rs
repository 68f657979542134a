use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::LinestackResult;

/// Base name used when the caller does not pick one.
pub const DEFAULT_BASENAME: &str = "linestack";

/// `<base>.jpg` for a single file, `<base>_01.jpg`, `<base>_02.jpg`, ... otherwise.
pub fn output_file_names(basename: &str, count: usize) -> Vec<String> {
    if count == 1 {
        return vec![format!("{basename}.jpg")];
    }
    (1..=count)
        .map(|i| format!("{basename}_{i:02}.jpg"))
        .collect()
}

/// Write encoded segments into `dir` using [`output_file_names`]. Returns the written paths.
pub fn write_outputs<B: AsRef<[u8]>>(
    dir: &Path,
    basename: &str,
    blobs: &[B],
) -> LinestackResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create output directory '{}'", dir.display()))?;

    let mut written = Vec::with_capacity(blobs.len());
    for (name, blob) in output_file_names(basename, blobs.len()).into_iter().zip(blobs) {
        let path = dir.join(name);
        std::fs::write(&path, blob.as_ref())
            .with_context(|| format!("write '{}'", path.display()))?;
        tracing::info!(path = %path.display(), bytes = blob.as_ref().len(), "wrote segment");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/files.rs"]
mod tests;
