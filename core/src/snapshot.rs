//! Save-state codec: CPU registers plus a checksummed memory image.
//!
//! Snapshots are JSON documents tagged with a format name and version.
//! Decoding checks the tag, version, image size and CRC-32 before any
//! machine state is touched. A snapshot may also fingerprint the ROM
//! regions it was taken against; restoring it over a different program
//! image fails.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::Controller;
use crate::cpu::{CpuStateTrait, I8080, I8080State};

pub const SNAPSHOT_FORMAT: &str = "cadence/i8080";
pub const SNAPSHOT_VERSION: u32 = 1;

/// Bytes in the 8080 address space.
pub const MEMORY_SIZE: usize = 0x10000;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot format {found:?}")]
    Format { found: String },
    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version { found: u64, expected: u32 },
    #[error("memory image is {actual} bytes, expected {expected}")]
    Size { expected: usize, actual: usize },
    #[error("memory image checksum {actual:#010x} does not match {expected:#010x}")]
    Checksum { expected: u32, actual: u32 },
    #[error("memory image codec failed: {0}")]
    Codec(#[from] std::io::Error),
    #[error("snapshot was taken against a different ROM (checksum {actual:#010x}, expected {expected:#010x})")]
    IncompatibleRom { expected: u32, actual: u32 },
}

/// A span of the address space, as configured in the `rom` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryRegion {
    pub offset: u16,
    pub size: u32,
}

impl MemoryRegion {
    /// Whether the region stays inside the 64 KiB address space.
    pub fn is_valid(&self) -> bool {
        self.offset as usize + self.size as usize <= MEMORY_SIZE
    }

    fn addresses(&self) -> impl Iterator<Item = u16> {
        let start = self.offset as usize;
        (start..start + self.size as usize).map(|addr| addr as u16)
    }
}

/// CRC-32 over the bytes of every ROM region, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomDigest {
    pub regions: Vec<MemoryRegion>,
    pub crc32: u32,
}

impl RomDigest {
    pub fn compute(memory: &mut dyn Controller, regions: &[MemoryRegion]) -> Self {
        let mut crc = flate2::Crc::new();
        for region in regions {
            let bytes: Vec<u8> = region.addresses().map(|addr| memory.read(addr)).collect();
            crc.update(&bytes);
        }
        Self {
            regions: regions.to_vec(),
            crc32: crc.sum(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compressor {
    #[default]
    #[serde(rename = "zlib")]
    Zlib,
    #[serde(rename = "none")]
    Stored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryImage {
    pub compressor: Compressor,
    /// Uncompressed size.
    pub size: usize,
    /// CRC-32 of the uncompressed bytes.
    pub crc32: u32,
    pub bytes: Vec<u8>,
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

impl MemoryImage {
    pub fn encode(raw: &[u8], compressor: Compressor) -> Result<Self, SnapshotError> {
        let bytes = match compressor {
            Compressor::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(raw)?;
                encoder.finish()?
            }
            Compressor::Stored => raw.to_vec(),
        };
        Ok(Self {
            compressor,
            size: raw.len(),
            crc32: crc32(raw),
            bytes,
        })
    }

    /// Decompress and verify against the recorded size and checksum.
    pub fn decode(&self) -> Result<Vec<u8>, SnapshotError> {
        if self.size != MEMORY_SIZE {
            return Err(SnapshotError::Size {
                expected: MEMORY_SIZE,
                actual: self.size,
            });
        }
        let raw = match self.compressor {
            Compressor::Zlib => {
                // One byte past the limit is enough to detect an oversized image
                let mut out = Vec::with_capacity(self.size);
                ZlibDecoder::new(self.bytes.as_slice())
                    .take(MEMORY_SIZE as u64 + 1)
                    .read_to_end(&mut out)?;
                out
            }
            Compressor::Stored => self.bytes.clone(),
        };
        if raw.len() != self.size {
            return Err(SnapshotError::Size {
                expected: self.size,
                actual: raw.len(),
            });
        }
        let actual = crc32(&raw);
        if actual != self.crc32 {
            return Err(SnapshotError::Checksum {
                expected: self.crc32,
                actual,
            });
        }
        Ok(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format: String,
    pub version: u32,
    pub cpu: I8080State,
    pub memory: MemoryImage,
    #[serde(default)]
    pub rom: RomDigest,
}

impl Snapshot {
    /// Capture CPU registers and the full address space seen through `memory`.
    pub fn capture(
        cpu: &I8080,
        memory: &mut dyn Controller,
        compressor: Compressor,
    ) -> Result<Self, SnapshotError> {
        let raw: Vec<u8> = (0..MEMORY_SIZE).map(|addr| memory.read(addr as u16)).collect();
        Ok(Self {
            format: SNAPSHOT_FORMAT.to_string(),
            version: SNAPSHOT_VERSION,
            cpu: cpu.snapshot(),
            memory: MemoryImage::encode(&raw, compressor)?,
            rom: RomDigest::default(),
        })
    }

    /// Record a fingerprint of `regions` so the snapshot only restores
    /// over the same ROM contents.
    pub fn with_rom(mut self, memory: &mut dyn Controller, regions: &[MemoryRegion]) -> Self {
        self.rom = RomDigest::compute(memory, regions);
        self
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot, rejecting foreign formats and other versions
    /// before interpreting the rest of the document.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(json)?;

        let format = value.get("format").and_then(Value::as_str).unwrap_or_default();
        if format != SNAPSHOT_FORMAT {
            return Err(SnapshotError::Format {
                found: format.to_string(),
            });
        }
        let version = value.get("version").and_then(Value::as_u64).unwrap_or(0);
        if version != SNAPSHOT_VERSION as u64 {
            return Err(SnapshotError::Version {
                found: version,
                expected: SNAPSHOT_VERSION,
            });
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Write the memory image and registers back. The image and the ROM
    /// fingerprint are verified first, so a rejected snapshot leaves both
    /// untouched.
    pub fn restore(&self, cpu: &mut I8080, memory: &mut dyn Controller) -> Result<(), SnapshotError> {
        let current = RomDigest::compute(memory, &self.rom.regions);
        if current.crc32 != self.rom.crc32 {
            return Err(SnapshotError::IncompatibleRom {
                expected: self.rom.crc32,
                actual: current.crc32,
            });
        }
        let raw = self.memory.decode()?;
        for (addr, &byte) in raw.iter().enumerate() {
            memory.write(addr as u16, byte);
        }
        cpu.restore(&self.cpu);
        Ok(())
    }
}
