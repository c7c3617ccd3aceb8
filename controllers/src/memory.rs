//! Flat 64 KiB RAM backing the whole 8080 address space.

use std::path::{Path, PathBuf};

use cadence_core::core::Controller;
use thiserror::Error;
use tracing::debug;

pub const MEMORY_SIZE: usize = 0x10000;

/// Errors that can occur when loading a program image.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The image would run past the top of the address space.
    #[error("{len} bytes at {offset:#06x} exceed the 64K address space")]
    TooLarge { offset: u16, len: usize },
}

pub struct MemoryController {
    ram: Box<[u8]>,
}

impl Default for MemoryController {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryController {
    pub fn new() -> Self {
        Self {
            ram: vec![0; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    /// Copy `data` into memory starting at `offset`.
    pub fn load_bytes(&mut self, offset: u16, data: &[u8]) -> Result<(), LoadError> {
        let start = offset as usize;
        if start + data.len() > MEMORY_SIZE {
            return Err(LoadError::TooLarge {
                offset,
                len: data.len(),
            });
        }
        self.ram[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Load a raw binary file at `offset`. Returns the number of bytes loaded.
    pub fn load_file(&mut self, path: impl AsRef<Path>, offset: u16) -> Result<usize, LoadError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_bytes(offset, &data)?;
        debug!(path = %path.display(), offset, len = data.len(), "program loaded");
        Ok(data.len())
    }

    pub fn clear(&mut self) {
        self.ram.fill(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.ram
    }
}

impl Controller for MemoryController {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }
}
