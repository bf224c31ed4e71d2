use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::StudyError;
use crate::store::schema::PersistedState;

/// The six top-level sections of the alkene curriculum, in display order.
pub const SECTION_IDS: [&str; 6] = [
    "fundamentos",
    "nomenclatura",
    "propiedades",
    "reacciones",
    "sintesis",
    "aplicaciones",
];

pub const TOTAL_SECTIONS: usize = SECTION_IDS.len();

pub fn is_valid_section(id: &str) -> bool {
    SECTION_IDS.contains(&id)
}

/// `round(100 * done / total)`, halves rounding up.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total);
    ((200 * done + total) / (2 * total)) as u8
}

/// Completed sections, bookmarked cards and the reviewed-card counter.
///
/// The completion percentage is always derived from the completed set and
/// never stored on its own.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressState {
    completed_sections: BTreeSet<String>,
    bookmarked_cards: BTreeSet<String>,
    reviewed_cards: u32,
}

impl ProgressState {
    pub fn progress(&self) -> u8 {
        percent(self.completed_sections.len(), TOTAL_SECTIONS)
    }

    pub fn completed_sections(&self) -> &BTreeSet<String> {
        &self.completed_sections
    }

    pub fn bookmarked_cards(&self) -> &BTreeSet<String> {
        &self.bookmarked_cards
    }

    pub fn reviewed_cards(&self) -> u32 {
        self.reviewed_cards
    }

    pub fn is_completed(&self, section_id: &str) -> bool {
        self.completed_sections.contains(section_id)
    }

    pub fn is_bookmarked(&self, card_id: &str) -> bool {
        self.bookmarked_cards.contains(card_id)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Flip completion of a section. Returns whether it is complete afterwards.
    pub fn toggle_section(&mut self, section_id: &str) -> Result<bool, StudyError> {
        if !is_valid_section(section_id) {
            return Err(StudyError::UnknownSection(section_id.to_string()));
        }
        if self.completed_sections.remove(section_id) {
            Ok(false)
        } else {
            self.completed_sections.insert(section_id.to_string());
            Ok(true)
        }
    }

    /// Flip a bookmark. Returns whether the card is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self, card_id: &str) -> bool {
        if self.bookmarked_cards.remove(card_id) {
            false
        } else {
            self.bookmarked_cards.insert(card_id.to_string());
            true
        }
    }

    pub fn bump_reviewed(&mut self) {
        self.reviewed_cards = self.reviewed_cards.saturating_add(1);
    }

    pub fn to_record(&self) -> PersistedState {
        PersistedState {
            progress: self.progress(),
            completed_sections: self.completed_sections.iter().cloned().collect(),
            bookmarked_cards: self.bookmarked_cards.iter().cloned().collect(),
            reviewed_cards: self.reviewed_cards,
        }
    }

    /// Build state from a typed record, dropping section ids outside the curriculum.
    pub fn from_record(record: &PersistedState) -> Self {
        Self {
            completed_sections: record
                .completed_sections
                .iter()
                .filter(|id| is_valid_section(id))
                .cloned()
                .collect(),
            bookmarked_cards: record.bookmarked_cards.iter().cloned().collect(),
            reviewed_cards: record.reviewed_cards,
        }
    }

    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_record())
    }

    /// Parse a persisted blob. Never fails: each missing or malformed field
    /// falls back to its default on its own.
    pub fn deserialize(blob: &str) -> Self {
        match serde_json::from_str::<Value>(blob) {
            Ok(value) => Self::from_value(&value),
            Err(err) => {
                log::warn!("persisted state is not valid JSON, using defaults: {err}");
                Self::default()
            }
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            log::warn!("persisted state is not a JSON object, using defaults");
            return Self::default();
        };

        let completed_sections = string_set(fields.get("completedSections"), "completedSections")
            .into_iter()
            .filter(|id| {
                let valid = is_valid_section(id);
                if !valid {
                    log::warn!("dropping unknown section '{id}' from persisted state");
                }
                valid
            })
            .collect();

        Self {
            completed_sections,
            bookmarked_cards: string_set(fields.get("bookmarkedCards"), "bookmarkedCards"),
            reviewed_cards: counter(fields.get("reviewedCards"), "reviewedCards"),
        }
    }
}

fn string_set(field: Option<&Value>, name: &str) -> BTreeSet<String> {
    match field {
        None | Some(Value::Null) => BTreeSet::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(_) => {
            log::warn!("persisted field '{name}' is not a list, using an empty set");
            BTreeSet::new()
        }
    }
}

fn counter(field: Option<&Value>, name: &str) -> u32 {
    let Some(value) = field.filter(|v| !v.is_null()) else {
        return 0;
    };
    let parsed = value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
        .and_then(|n| u32::try_from(n).ok());
    parsed.unwrap_or_else(|| {
        log::warn!("persisted field '{name}' is not a counter, using 0");
        0
    })
}
