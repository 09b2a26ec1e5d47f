//! Public suffix list storage.
//!
//! The suffix list is loaded once per store and never mutated afterwards.
//! Entries are kept as raw UTF-8 bytes so internationalized labels compare
//! byte-for-byte, without any punycode normalization.

use crate::error::WhoisQueryError;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Public suffix list compiled into the library.
const BUNDLED_SUFFIX_LIST: &str = include_str!("../data/public_suffix_list.dat");

/// Marker that starts a comment line in the suffix list format.
const COMMENT_MARKER: &str = "//";

/// Immutable set of known public suffixes (`com`, `co.uk`, `公司.hk`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixSet {
    entries: HashSet<Vec<u8>>,
}

impl SuffixSet {
    /// Parse newline-delimited suffix list text.
    ///
    /// Blank lines and lines starting with `//` are skipped. Entries are
    /// trimmed and lowercased.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
            .map(|line| line.to_lowercase().into_bytes())
            .collect();

        Self { entries }
    }

    /// Whether `candidate` (already lowercase) is a known suffix.
    pub fn contains(&self, candidate: &[u8]) -> bool {
        self.entries.contains(candidate)
    }

    /// Convenience wrapper over [`SuffixSet::contains`] for text.
    pub fn contains_str(&self, candidate: &str) -> bool {
        self.contains(candidate.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where a [`SuffixStore`] reads its list from.
#[derive(Debug, Clone, PartialEq)]
pub enum SuffixSource {
    /// The list compiled into the library
    Bundled,
    /// A suffix list file on disk (e.g. a fresh publicsuffix.org download)
    File(PathBuf),
    /// In-memory text, mostly useful for tests and embedding
    Text(String),
}

impl SuffixSource {
    fn describe(&self) -> String {
        match self {
            SuffixSource::Bundled => "bundled public suffix list".to_string(),
            SuffixSource::File(path) => path.display().to_string(),
            SuffixSource::Text(_) => "inline suffix list".to_string(),
        }
    }

    fn read(&self) -> Result<String, WhoisQueryError> {
        match self {
            SuffixSource::Bundled => Ok(BUNDLED_SUFFIX_LIST.to_string()),
            SuffixSource::File(path) => fs::read_to_string(path).map_err(|e| {
                WhoisQueryError::resource_unavailable(
                    path.display().to_string(),
                    format!("Failed to read suffix list: {}", e),
                )
            }),
            SuffixSource::Text(text) => Ok(text.clone()),
        }
    }
}

/// Lazily loads a [`SuffixSet`] exactly once.
///
/// The check-then-load sequence runs while holding the store's lock, so
/// concurrent callers never trigger a second read and never observe a
/// partially built set. A failed load publishes nothing; the next call
/// tries the source again.
#[derive(Debug)]
pub struct SuffixStore {
    source: SuffixSource,
    loaded: Mutex<Option<Arc<SuffixSet>>>,
    reads: AtomicUsize,
}

// Process-wide store over the bundled list
lazy_static::lazy_static! {
    static ref GLOBAL_SUFFIX_STORE: Arc<SuffixStore> =
        Arc::new(SuffixStore::new(SuffixSource::Bundled));
}

impl SuffixStore {
    /// Create an empty store for `source`. Nothing is read until [`load`](Self::load).
    pub fn new(source: SuffixSource) -> Self {
        Self {
            source,
            loaded: Mutex::new(None),
            reads: AtomicUsize::new(0),
        }
    }

    /// The process-wide store backed by the bundled suffix list.
    pub fn global() -> Arc<SuffixStore> {
        Arc::clone(&GLOBAL_SUFFIX_STORE)
    }

    /// Return the suffix set, reading the source on first use.
    ///
    /// # Errors
    ///
    /// Returns `ResourceUnavailable` if the source cannot be read or holds
    /// no entries.
    pub fn load(&self) -> Result<Arc<SuffixSet>, WhoisQueryError> {
        let mut loaded = self
            .loaded
            .lock()
            .map_err(|_| WhoisQueryError::internal("Failed to acquire suffix store lock"))?;

        if let Some(set) = loaded.as_ref() {
            return Ok(Arc::clone(set));
        }

        self.reads.fetch_add(1, Ordering::SeqCst);
        let text = self.source.read()?;
        let set = SuffixSet::parse(&text);

        if set.is_empty() {
            return Err(WhoisQueryError::resource_unavailable(
                self.source.describe(),
                "Suffix list contains no entries",
            ));
        }

        debug!(
            source = %self.source.describe(),
            entries = set.len(),
            "Loaded public suffix list"
        );

        let set = Arc::new(set);
        *loaded = Some(Arc::clone(&set));
        Ok(set)
    }

    /// How many times the backing source has been read.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn source(&self) -> &SuffixSource {
        &self.source
    }
}
