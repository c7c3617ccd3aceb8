//! Machine configuration, exchanged as camelCase JSON.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::snapshot::{Compressor, MemoryRegion};

/// The only instruction set this machine emulates.
pub const CPU_I8080: &str = "i8080";

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("malformed options: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read options from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("options must be a JSON object")]
    NotAnObject,
    #[error("unsupported cpu {0:?}")]
    Cpu(String),
    #[error("isrFreq must be a finite value >= 0, got {0}")]
    IsrFreq(f64),
    #[error("rom region at {offset:#06x} with size {size} runs past the address space")]
    Region { offset: u16, size: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Options {
    pub cpu: String,
    /// Nanoseconds of emulated time between syncs with real time.
    /// Negative runs unpaced; zero is rejected by the machine.
    pub clock_resolution: i64,
    /// Interrupt polls happen every `isr_freq * resolution` cycles;
    /// zero polls before every instruction.
    pub isr_freq: f64,
    pub run_async: bool,
    /// Stop the run when PC reaches this address.
    pub exit_address: Option<u16>,
    /// Memory image encoding used by snapshots.
    pub compressor: Compressor,
    /// Program image regions fingerprinted into snapshots; a snapshot
    /// only loads over the same bytes.
    pub rom: Vec<MemoryRegion>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cpu: CPU_I8080.to_string(),
            clock_resolution: -1,
            isr_freq: 0.0,
            run_async: false,
            exit_address: None,
            compressor: Compressor::default(),
            rom: Vec::new(),
        }
    }
}

impl Options {
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        let mut options = Self::default();
        options.merge_json(json)?;
        Ok(options)
    }

    /// Overlay the keys present in `json` onto these options.
    ///
    /// `json` may also be `file://<path>`, naming a file holding the
    /// object. Nothing changes unless the merged result validates.
    pub fn merge_json(&mut self, json: &str) -> Result<(), OptionsError> {
        let text = match json.strip_prefix("file://") {
            Some(path) => std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
                path: PathBuf::from(path),
                source,
            })?,
            None => json.to_owned(),
        };

        let Value::Object(update) = serde_json::from_str::<Value>(&text)? else {
            return Err(OptionsError::NotAnObject);
        };
        let mut merged = serde_json::to_value(&*self)?;
        if let Value::Object(current) = &mut merged {
            current.extend(update);
        }

        let next: Options = serde_json::from_value(merged)?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.cpu != CPU_I8080 {
            return Err(OptionsError::Cpu(self.cpu.clone()));
        }
        if !self.isr_freq.is_finite() || self.isr_freq < 0.0 {
            return Err(OptionsError::IsrFreq(self.isr_freq));
        }
        if let Some(region) = self.rom.iter().find(|region| !region.is_valid()) {
            return Err(OptionsError::Region {
                offset: region.offset,
                size: region.size,
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, OptionsError> {
        Ok(serde_json::to_string(self)?)
    }
}
