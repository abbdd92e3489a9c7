//! Traits at the two I/O seams of langsync: file formats and locale stores.

use std::{
    fs::File,
    io::{BufRead, BufReader, Cursor, Write},
    path::Path,
};

use crate::{error::Error, types::LocaleStore};

/// A trait for parsing and writing one resource file.
///
/// # Example
///
/// ```rust,no_run
/// use langsync::traits::Parser;
/// let format = langsync::formats::resw::Format::read_from("Strings/en-US/Resources.resw")?;
/// let mut out = Vec::new();
/// format.to_writer(&mut out)?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Parser {
    /// Parse from any reader.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error>
    where
        Self: Sized;

    /// Parse from file path.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path).map_err(Error::Io)?;
        let reader = BufReader::new(file);
        Self::from_reader(reader)
    }

    /// Write to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error>;

    /// Parse from a string.
    fn from_str(s: &str) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Self::from_reader(Cursor::new(s))
    }
}

/// Loads and persists whole locale stores.
///
/// Implementations must preserve entry keys and be idempotent: saving a store whose
/// content did not change must leave the underlying storage unchanged.
pub trait StoreAdapter {
    /// All locale identifiers available, in any order.
    fn locales(&self) -> Result<Vec<String>, Error>;

    /// Loads the latest persisted state of `locale`.
    fn load(&self, locale: &str) -> Result<LocaleStore, Error>;

    /// Persists `store` under `store.language`, replacing its previous content.
    fn save(&mut self, store: &LocaleStore) -> Result<(), Error>;
}
