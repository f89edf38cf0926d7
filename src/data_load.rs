use anyhow::{Context, Result};
use bytesize::ByteSize;
use log::debug;
use origami::DesignFile;
use std::{fs, path::Path};

pub fn load_design<P: AsRef<Path>>(path: P) -> Result<DesignFile> {
    let bytes = fs::read(&path)
        .with_context(|| format!("Failed to open design at: {:?}", path.as_ref()))?;
    debug!(
        "Read {} from {:?}",
        ByteSize(bytes.len() as u64),
        path.as_ref()
    );

    let design: DesignFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("Invalid design file: {:?}", path.as_ref()))?;
    Ok(design)
}
