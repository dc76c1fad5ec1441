use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error while creating {path}: {source}")]
    IO {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, OutputError>;

/// Ensures `base/domain_label` exists, creating missing ancestors,
/// and returns it. Calling it again for an existing directory is a no-op.
pub fn resolve_output_dir(base: &Path, domain_label: &str) -> Result<PathBuf> {
    let dir = base.join(domain_label);

    std::fs::create_dir_all(&dir).map_err(|source| OutputError::IO {
        path: dir.clone(),
        source,
    })?;

    debug!(dir = %dir.display(), "output directory ready");
    Ok(dir)
}
