use std::collections::HashSet;

use chrono::Utc;

use crate::engine::progress::{ProgressState, is_valid_section};
use crate::error::{StoreError, StudyError};
use crate::store::kv::KeyValueStore;
use crate::store::schema::{EXPORT_VERSION, ExportData, STORAGE_KEY};

/// The persisted progress state together with its storage slot.
///
/// Every mutation builds the next state, writes it, and only then makes it
/// visible: a failed write leaves memory and storage untouched.
pub struct ProgressTracker<S: KeyValueStore> {
    state: ProgressState,
    visited: HashSet<String>,
    store: S,
}

impl<S: KeyValueStore> ProgressTracker<S> {
    /// Load saved progress, falling back to defaults when the slot is
    /// absent, unreadable or corrupt.
    pub fn open(store: S) -> Self {
        let state = match store.get(STORAGE_KEY) {
            Ok(Some(blob)) => ProgressState::deserialize(&blob),
            Ok(None) => ProgressState::default(),
            Err(err) => {
                log::warn!("could not read saved progress, starting fresh: {err}");
                ProgressState::default()
            }
        };
        log::debug!(
            "opened progress: {}% complete, {} bookmark(s), {} reviewed",
            state.progress(),
            state.bookmarked_cards().len(),
            state.reviewed_cards()
        );
        Self {
            state,
            visited: HashSet::new(),
            store,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn was_visited(&self, section_id: &str) -> bool {
        self.visited.contains(section_id)
    }

    /// Returns whether the section is complete afterwards.
    pub fn toggle_section_complete(&mut self, section_id: &str) -> Result<bool, StudyError> {
        let mut next = self.state.clone();
        let completed = next.toggle_section(section_id)?;
        self.commit(next)?;
        Ok(completed)
    }

    /// Count the first navigation of this session to a section that is not
    /// complete yet. Returns whether the reviewed counter moved.
    pub fn mark_section_visited(&mut self, section_id: &str) -> Result<bool, StudyError> {
        if !is_valid_section(section_id) {
            return Err(StudyError::UnknownSection(section_id.to_string()));
        }
        if self.state.is_completed(section_id) || self.visited.contains(section_id) {
            return Ok(false);
        }
        let mut next = self.state.clone();
        next.bump_reviewed();
        self.commit(next)?;
        self.visited.insert(section_id.to_string());
        Ok(true)
    }

    /// Returns whether the card is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self, card_id: &str) -> Result<bool, StudyError> {
        let mut next = self.state.clone();
        let bookmarked = next.toggle_bookmark(card_id);
        self.commit(next)?;
        Ok(bookmarked)
    }

    /// A perfect quiz counts as one reviewed card, independently of visits.
    pub fn record_perfect_quiz(&mut self) -> Result<(), StudyError> {
        let mut next = self.state.clone();
        next.bump_reviewed();
        self.commit(next)
    }

    pub fn reset(&mut self) -> Result<(), StudyError> {
        self.commit(ProgressState::default())?;
        self.visited.clear();
        log::info!("progress reset");
        Ok(())
    }

    pub fn export(&self) -> ExportData {
        ExportData {
            alquenos_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            state: self.state.to_record(),
        }
    }

    /// Replace the whole state with an exported one. The caller checks the
    /// export version when reading the file.
    pub fn import(&mut self, data: &ExportData) -> Result<(), StudyError> {
        self.commit(ProgressState::from_record(&data.state))?;
        self.visited.clear();
        log::info!(
            "imported progress exported at {}",
            data.exported_at.to_rfc3339()
        );
        Ok(())
    }

    fn commit(&mut self, next: ProgressState) -> Result<(), StudyError> {
        let blob = next.serialize().map_err(StoreError::from)?;
        self.store.set(STORAGE_KEY, &blob)?;
        log::debug!("persisted progress ({} bytes)", blob.len());
        self.state = next;
        Ok(())
    }
}
