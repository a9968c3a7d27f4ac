//! Zip archive accumulation for transcript files.

use std::collections::HashSet;
use std::io::{Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error("Archive already contains an entry named '{0}'")]
    DuplicateEntry(String),

    #[error("Archive has been sealed; no more entries can be added")]
    Sealed,

    #[error("Archive is unusable after an earlier write failure")]
    Poisoned,

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

enum State<W: Write + Seek> {
    Open(ZipWriter<W>),
    Sealed(W),
    Poisoned,
}

/// Builds a zip archive one named text entry at a time.
///
/// Entry names are unique; once [`seal`](Self::seal) has written the central
/// directory the archive is immutable.
pub struct ArchiveBuilder<W: Write + Seek> {
    state: State<W>,
    entries: Vec<String>,
    names: HashSet<String>,
}

impl<W: Write + Seek> ArchiveBuilder<W> {
    pub fn new(inner: W) -> Self {
        Self {
            state: State::Open(ZipWriter::new(inner)),
            entries: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Add a file to the archive
    pub fn add(&mut self, name: &str, content: &[u8]) -> Result<(), ArchiveError> {
        let writer = match &mut self.state {
            State::Open(writer) => writer,
            State::Sealed(_) => return Err(ArchiveError::Sealed),
            State::Poisoned => return Err(ArchiveError::Poisoned),
        };

        if self.names.contains(name) {
            return Err(ArchiveError::DuplicateEntry(name.to_string()));
        }

        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        writer.start_file(name, options)?;
        writer.write_all(content)?;

        tracing::debug!("Added {} ({} bytes) to archive", name, content.len());

        self.names.insert(name.to_string());
        self.entries.push(name.to_string());
        Ok(())
    }

    /// Finalize the archive. Calling this more than once is a no-op.
    pub fn seal(&mut self) -> Result<&mut W, ArchiveError> {
        match std::mem::replace(&mut self.state, State::Poisoned) {
            State::Open(mut writer) => {
                let inner = writer.finish()?;
                self.state = State::Sealed(inner);
            }
            other => self.state = other,
        }

        match &mut self.state {
            State::Sealed(inner) => Ok(inner),
            _ => Err(ArchiveError::Poisoned),
        }
    }

    /// Seal the archive and hand back the underlying writer
    pub fn into_inner(mut self) -> Result<W, ArchiveError> {
        self.seal()?;
        match std::mem::replace(&mut self.state, State::Poisoned) {
            State::Sealed(inner) => Ok(inner),
            _ => Err(ArchiveError::Poisoned),
        }
    }

    /// Entry names in insertion order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        matches!(self.state, State::Sealed(_))
    }
}
