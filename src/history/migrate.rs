/* src/history/migrate.rs */

use super::backend::KvBackend;
use super::record::SavedFit;
use super::store::HistoryStore;
use crate::error::{HistoryError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use std::collections::HashSet;

/// A fit as old clients stored it, with the image inlined as a `data:` URL.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyFit {
    pub id: String,
    pub image: String,
    pub score: u8,
    pub message: String,
    pub date: String,
}

impl LegacyFit {
    pub fn into_saved(self) -> Result<SavedFit> {
        let image = decode_data_url(&self.image).map_err(|reason| {
            HistoryError::InvalidLegacyImage {
                id: self.id.clone(),
                reason: reason.to_string(),
            }
        })?;
        Ok(SavedFit {
            id: self.id,
            image,
            score: self.score,
            message: self.message,
            date: self.date,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
    /// The completion flag was already set.
    AlreadyDone,
    NothingToMigrate,
    /// Fits copied over; ids already present in the new history are skipped.
    Migrated { copied: usize, skipped: usize },
}

impl<B: KvBackend> HistoryStore<B> {
    /// Moves legacy fits into the current history, at most once per store.
    ///
    /// The legacy copy is removed and the completion flag set only after the
    /// converted history is written. A failed run leaves both untouched, and a
    /// rerun skips fits whose id is already present.
    pub fn migrate(&mut self) -> Result<Migration> {
        if self.backend.get(&self.keys.migrated_flag)?.is_some() {
            return Ok(Migration::AlreadyDone);
        }

        let Some(raw) = self.backend.get(&self.keys.legacy)? else {
            self.backend.put(&self.keys.migrated_flag, b"true")?;
            return Ok(Migration::NothingToMigrate);
        };

        let legacy: Vec<LegacyFit> = serde_json::from_slice(&raw)?;
        let existing = self.read_history()?;
        let mut seen: HashSet<String> = existing.iter().map(|fit| fit.id.clone()).collect();

        let mut merged = Vec::with_capacity(legacy.len() + existing.len());
        let mut skipped = 0;
        for old in legacy {
            if !seen.insert(old.id.clone()) {
                skipped += 1;
                continue;
            }
            merged.push(old.into_saved()?);
        }
        let copied = merged.len();
        merged.extend(existing);

        self.write_history(&merged)?;
        self.backend.delete(&self.keys.legacy)?;
        self.backend.put(&self.keys.migrated_flag, b"true")?;

        tracing::info!(copied, skipped, "migrated legacy fit history");
        Ok(Migration::Migrated { copied, skipped })
    }
}

/// Decodes a base64 `data:` URL such as `data:image/jpeg;base64,/9j/...`.
pub fn decode_data_url(url: &str) -> std::result::Result<Vec<u8>, &'static str> {
    let rest = url.strip_prefix("data:").ok_or("not a data URL")?;
    let (meta, payload) = rest.split_once(',').ok_or("data URL has no payload")?;
    if !meta.ends_with(";base64") {
        return Err("data URL is not base64-encoded");
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|_| "data URL payload is not valid base64")
}
