//! Program path resolution: loads a program image from a raw file, a
//! named entry inside a ZIP archive, or the first loadable entry of one.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Extensions recognised as loadable when no entry is named.
const PROGRAM_EXTENSIONS: [&str; 2] = ["com", "bin"];

#[derive(Debug)]
pub enum ProgramLoadError {
    /// Underlying I/O error (file not found, permission denied, etc.)
    Io(std::io::Error),

    /// The archive could not be read.
    Zip(String),

    /// The named entry (or any loadable entry) is not in the archive.
    MissingEntry(String),

    /// The program file is empty.
    Empty(String),
}

impl std::fmt::Display for ProgramLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Zip(e) => write!(f, "invalid ZIP: {e}"),
            Self::MissingEntry(name) => write!(f, "no program {name} in archive"),
            Self::Empty(name) => write!(f, "program {name} is empty"),
        }
    }
}

impl std::error::Error for ProgramLoadError {}

impl From<std::io::Error> for ProgramLoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<zip::result::ZipError> for ProgramLoadError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Zip(e.to_string())
    }
}

/// Resolve a program path and return the image bytes.
///
/// Resolution order:
/// 1. `archive.zip:NAME` → entry `NAME` of the archive (case-insensitive).
/// 2. A path ending in `.zip` → its first `.com` or `.bin` entry.
/// 3. Anything else → the raw file.
pub fn load_program(target: &str) -> Result<Vec<u8>, ProgramLoadError> {
    if let Some((archive, entry)) = split_archive_entry(target) {
        return load_from_zip(Path::new(archive), Some(entry));
    }

    let path = Path::new(target);
    let data = if has_extension(path, "zip") {
        load_from_zip(path, None)?
    } else {
        std::fs::read(path)?
    };
    if data.is_empty() {
        return Err(ProgramLoadError::Empty(target.to_string()));
    }
    Ok(data)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn split_archive_entry(target: &str) -> Option<(&str, &str)> {
    let lower = target.to_ascii_lowercase();
    let split = lower.find(".zip:")? + ".zip".len();
    let (archive, entry) = (&target[..split], &target[split + 1..]);
    (!entry.is_empty()).then_some((archive, entry))
}

fn load_from_zip(path: &Path, entry_name: Option<&str>) -> Result<Vec<u8>, ProgramLoadError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        // Skip directories
        if entry.is_dir() {
            continue;
        }

        let file_name = entry
            .name()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let wanted = match entry_name {
            Some(name) => file_name.eq_ignore_ascii_case(name),
            None => PROGRAM_EXTENSIONS
                .iter()
                .any(|ext| has_extension(Path::new(&file_name), ext)),
        };
        if wanted {
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            if data.is_empty() {
                return Err(ProgramLoadError::Empty(file_name));
            }
            return Ok(data);
        }
    }

    Err(ProgramLoadError::MissingEntry(
        entry_name.unwrap_or("*.com/*.bin").to_string(),
    ))
}
