//! The shared visited-state store. All three drivers deduplicate through
//! this structure, so acceptance of a fingerprint is atomic and happens at
//! most once even under concurrent expansion.

use anyhow::{Context, Result, bail};
use dashmap::DashMap;

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use std::sync::Mutex;

/// A set of canonical board fingerprints, optionally journaled to disk so a
/// later run can skip states a previous run already explored.
pub struct VisitedStore {
    set: DashMap<Box<[u8]>, (), ahash::RandomState>,
    journal: Option<Mutex<BufWriter<File>>>,
}

impl VisitedStore {
    pub fn in_memory() -> Self {
        Self {
            set: DashMap::default(),
            journal: None,
        }
    }

    /// Opens a disk-backed store, loading any fingerprints the journal
    /// already holds and appending every fresh acceptance.
    pub fn open(path: &Path) -> Result<Self> {
        let set: DashMap<Box<[u8]>, (), ahash::RandomState> = DashMap::default();
        match File::open(path) {
            Ok(file) => {
                let mut reader = BufReader::new(file);
                loop {
                    let mut len_bytes = [0u8; 2];
                    match reader.read_exact(&mut len_bytes) {
                        Ok(()) => {}
                        Err(err) if err.kind() == ErrorKind::UnexpectedEof => break,
                        Err(err) => return Err(err).context("failed to read seen cache"),
                    }
                    let len = u16::from_le_bytes(len_bytes) as usize;
                    let mut fingerprint = vec![0u8; len];
                    reader
                        .read_exact(&mut fingerprint)
                        .context("seen cache ends mid-record")?;
                    set.insert(fingerprint.into_boxed_slice(), ());
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err).context("failed to open seen cache"),
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context("failed to open seen cache for appending")?;
        Ok(Self {
            set,
            journal: Some(Mutex::new(BufWriter::new(file))),
        })
    }

    pub fn open_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::open(path),
            None => Ok(Self::in_memory()),
        }
    }

    /// Records a fingerprint; returns true exactly once per fingerprint.
    pub fn insert(&self, fingerprint: &[u8]) -> Result<bool> {
        if self
            .set
            .insert(Box::from(fingerprint), ())
            .is_some()
        {
            return Ok(false);
        }
        if let Some(journal) = &self.journal {
            if fingerprint.len() > u16::MAX as usize {
                bail!("fingerprint too long for the seen cache");
            }
            let mut writer = journal.lock().expect("seen cache journal poisoned");
            writer.write_all(&(fingerprint.len() as u16).to_le_bytes())?;
            writer.write_all(fingerprint)?;
        }
        Ok(true)
    }

    pub fn contains(&self, fingerprint: &[u8]) -> bool {
        self.set.contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn flush(&self) -> Result<()> {
        if let Some(journal) = &self.journal {
            journal
                .lock()
                .expect("seen cache journal poisoned")
                .flush()?;
        }
        Ok(())
    }
}
