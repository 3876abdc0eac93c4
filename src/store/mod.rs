//! Persistent destination store.
//!
//! Destinations and their cards live in a single JSON document. First run
//! seeds the canned sample set; every open runs the legacy-card migration
//! and persists only if anything changed. Writes are atomic (temp file,
//! decode verification, rename) and serialized with an advisory file lock.

pub mod migrate;

use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{CulturalCard, Destination};

const LOCK_FILE: &str = ".destinations.lock";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("destination not found: {0}")]
    DestinationNotFound(String),

    #[error("destination already exists: {0}")]
    DuplicateDestination(String),

    #[error("card not found: {0}")]
    CardNotFound(Uuid),
}

/// Advisory consistency findings. Never fatal.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub duplicate_destination_ids: Vec<Uuid>,
    pub duplicate_card_ids: Vec<Uuid>,
    pub ai_cards_missing_fields: Vec<Uuid>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_destination_ids.is_empty()
            && self.duplicate_card_ids.is_empty()
            && self.ai_cards_missing_fields.is_empty()
    }
}

pub struct ContentStore {
    path: PathBuf,
    destinations: Vec<Destination>,
}

impl ContentStore {
    /// Open the store at `path`. An absent file seeds the sample set; an
    /// existing one is decoded, normalized, and migrated (persisting only
    /// if migration changed anything).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if !path.exists() {
            info!(path = %path.display(), "No store found, seeding sample destinations");
            let store = Self {
                path,
                destinations: Destination::sample_data(),
            };
            store.persist(&store.destinations)?;
            return Ok(store);
        }

        let bytes = fs::read(&path)?;
        let mut destinations: Vec<Destination> = serde_json::from_slice(&bytes)?;

        let mut migrated = 0;
        for dest in &mut destinations {
            dest.normalize();
            migrated += migrate::migrate_destination(dest);
        }

        let store = Self { path, destinations };
        if migrated > 0 {
            info!(cards = migrated, "Migrated legacy cards to structured shape");
            store.persist(&store.destinations)?;
        } else {
            debug!(
                destinations = store.destinations.len(),
                "Loaded destination store"
            );
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Case-insensitive lookup by destination name.
    pub fn find(&self, name: &str) -> Option<&Destination> {
        self.destinations
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Atomic write: temp file in the store directory, decode-verify the
    /// bytes, rename over the target. An exclusive lock on a sibling lock
    /// file serializes concurrent savers.
    fn persist(&self, destinations: &[Destination]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let lock = File::create(dir.join(LOCK_FILE))?;
        lock.lock_exclusive()?;

        let bytes = serde_json::to_vec_pretty(destinations)?;
        // Refuse to replace the document with bytes that don't decode back
        let _verify: Vec<Destination> = serde_json::from_slice(&bytes)?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        temp.write_all(&bytes)?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        // Lock released on drop
        Ok(())
    }

    /// Persist the current in-memory state.
    pub fn save(&self) -> Result<(), StoreError> {
        self.persist(&self.destinations)
    }

    /// Apply a mutation, persist, and only then commit it to memory. A
    /// failed save leaves the in-memory state untouched.
    fn commit<T>(
        &mut self,
        mutate: impl FnOnce(&mut Vec<Destination>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut next = self.destinations.clone();
        let out = mutate(&mut next)?;
        self.persist(&next)?;
        self.destinations = next;
        Ok(out)
    }

    /// Append a card to the named destination.
    pub fn add_card(&mut self, destination: &str, card: CulturalCard) -> Result<(), StoreError> {
        self.commit(|dests| {
            let dest = dests
                .iter_mut()
                .find(|d| d.name.eq_ignore_ascii_case(destination))
                .ok_or_else(|| StoreError::DestinationNotFound(destination.to_string()))?;
            dest.add_card(card);
            Ok(())
        })
    }

    /// Remove a card by id from the named destination.
    pub fn remove_card(
        &mut self,
        destination: &str,
        card_id: Uuid,
    ) -> Result<CulturalCard, StoreError> {
        self.commit(|dests| {
            let dest = dests
                .iter_mut()
                .find(|d| d.name.eq_ignore_ascii_case(destination))
                .ok_or_else(|| StoreError::DestinationNotFound(destination.to_string()))?;
            dest.remove_card(card_id)
                .ok_or(StoreError::CardNotFound(card_id))
        })
    }

    /// Add a new destination. Names are unique, case-insensitively.
    pub fn add_destination(&mut self, destination: Destination) -> Result<(), StoreError> {
        self.commit(|dests| {
            if dests
                .iter()
                .any(|d| d.name.eq_ignore_ascii_case(&destination.name))
            {
                return Err(StoreError::DuplicateDestination(destination.name.clone()));
            }
            dests.push(destination);
            Ok(())
        })
    }

    /// Remove a destination by name, returning it.
    pub fn remove_destination(&mut self, name: &str) -> Result<Destination, StoreError> {
        self.commit(|dests| {
            let pos = dests
                .iter()
                .position(|d| d.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| StoreError::DestinationNotFound(name.to_string()))?;
            Ok(dests.remove(pos))
        })
    }

    /// Replace a destination matched by id.
    pub fn update_destination(&mut self, destination: Destination) -> Result<(), StoreError> {
        self.commit(|dests| {
            let slot = dests
                .iter_mut()
                .find(|d| d.id == destination.id)
                .ok_or_else(|| StoreError::DestinationNotFound(destination.name.clone()))?;
            *slot = destination;
            Ok(())
        })
    }

    /// Advisory consistency check over the loaded document.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        let mut dest_ids = std::collections::HashSet::new();
        let mut card_ids = std::collections::HashSet::new();

        for dest in &self.destinations {
            if !dest_ids.insert(dest.id) {
                report.duplicate_destination_ids.push(dest.id);
            }
            for card in &dest.cultural_cards {
                if !card_ids.insert(card.id) {
                    report.duplicate_card_ids.push(card.id);
                }
                if card.is_ai_generated
                    && (card.category.is_none()
                        || card.key_knowledge.is_none()
                        || card.cultural_insights.is_none())
                {
                    report.ai_cards_missing_fields.push(card.id);
                }
            }
        }

        if !report.is_clean() {
            warn!(
                duplicate_destinations = report.duplicate_destination_ids.len(),
                duplicate_cards = report.duplicate_card_ids.len(),
                incomplete_ai_cards = report.ai_cards_missing_fields.len(),
                "Store validation found issues"
            );
        }
        report
    }
}
