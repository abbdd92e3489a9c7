//! Store adapters: locale stores on disk (`<root>/<locale>/Resources.resw`) and in memory.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::Error,
    formats::ReswFormat,
    traits::{Parser, StoreAdapter},
    types::LocaleStore,
};

pub const DEFAULT_FILE_NAME: &str = "Resources.resw";

/// A directory holding one sub-directory per locale, each with a `.resw` file.
#[derive(Debug, Clone)]
pub struct ReswDirectory {
    root: PathBuf,
    file_name: String,
}

impl ReswDirectory {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the resource file for `locale`.
    pub fn path_for(&self, locale: &str) -> PathBuf {
        self.root.join(locale).join(&self.file_name)
    }
}

impl StoreAdapter for ReswDirectory {
    fn locales(&self) -> Result<Vec<String>, Error> {
        let mut locales = Vec::new();
        for dir_entry in fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = dir_entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if self.path_for(&name).is_file() {
                locales.push(name);
            } else {
                tracing::warn!(locale = %name, "no {} found, skipping", self.file_name);
            }
        }
        locales.sort();
        Ok(locales)
    }

    fn load(&self, locale: &str) -> Result<LocaleStore, Error> {
        let path = self.path_for(locale);
        if !path.is_file() {
            return Err(Error::LocaleNotFound(locale.to_string()));
        }
        let store = ReswFormat::read_from(&path)?.into_store(locale);
        tracing::trace!(locale, entries = store.len(), "loaded {}", path.display());
        Ok(store)
    }

    fn save(&mut self, store: &LocaleStore) -> Result<(), Error> {
        let path = self.path_for(&store.language);
        let (existing, mut format) = if path.is_file() {
            (Some(fs::read(&path)?), ReswFormat::read_from(&path)?)
        } else {
            (None, ReswFormat::default())
        };
        format.apply_store(store);

        let mut bytes = Vec::new();
        format.to_writer(&mut bytes)?;
        if existing.as_deref() == Some(bytes.as_slice()) {
            tracing::trace!(locale = %store.language, "unchanged, not rewriting");
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        tracing::debug!(locale = %store.language, "saved {}", path.display());
        Ok(())
    }
}

/// Locale stores held in memory.
///
/// Used by tests and for dry runs: [`MemoryStore::snapshot`] copies every locale out of
/// another adapter so a run can proceed without writing anything back.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    stores: BTreeMap<String, LocaleStore>,
    /// Locale of every `save` call, in order.
    pub saves: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: LocaleStore) -> Self {
        self.insert(store);
        self
    }

    pub fn insert(&mut self, store: LocaleStore) {
        self.stores.insert(store.language.clone(), store);
    }

    pub fn get(&self, locale: &str) -> Option<&LocaleStore> {
        self.stores.get(locale)
    }

    /// Copies every locale of `adapter` into a new in-memory store.
    pub fn snapshot(adapter: &dyn StoreAdapter) -> Result<Self, Error> {
        let mut memory = Self::new();
        for locale in adapter.locales()? {
            memory.insert(adapter.load(&locale)?);
        }
        Ok(memory)
    }

    /// Number of `save` calls made for `locale`.
    pub fn save_count(&self, locale: &str) -> usize {
        self.saves.iter().filter(|l| l.as_str() == locale).count()
    }
}

impl StoreAdapter for MemoryStore {
    fn locales(&self) -> Result<Vec<String>, Error> {
        Ok(self.stores.keys().cloned().collect())
    }

    fn load(&self, locale: &str) -> Result<LocaleStore, Error> {
        self.stores
            .get(locale)
            .cloned()
            .ok_or_else(|| Error::LocaleNotFound(locale.to_string()))
    }

    fn save(&mut self, store: &LocaleStore) -> Result<(), Error> {
        self.saves.push(store.language.clone());
        self.insert(store.clone());
        Ok(())
    }
}
