//! ROM file loading.
use std::{fs, path::Path};

use chip8_vm::constants::MAX_PROGRAM_SIZE;
use log::{info, warn};

use crate::error::AppError;

/// Read the raw program bytes of a ROM file.
///
/// Size limits are enforced by the VM when the program is loaded.
pub fn read_rom(path: impl AsRef<Path>) -> Result<Vec<u8>, AppError> {
    let path = path.as_ref();
    let bytecode = fs::read(path)?;

    info!("read {} bytes from {}", bytecode.len(), path.display());

    if bytecode.is_empty() {
        warn!("ROM {} is empty", path.display());
    }
    if bytecode.len() > MAX_PROGRAM_SIZE {
        warn!(
            "ROM {} exceeds the {MAX_PROGRAM_SIZE} byte program area",
            path.display()
        );
    }

    Ok(bytecode)
}
