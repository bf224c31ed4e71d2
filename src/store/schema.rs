use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slot name of the persisted progress blob.
pub const STORAGE_KEY: &str = "organicChemistryMindmap";

pub const EXPORT_VERSION: u32 = 1;

/// Flat record written to the storage slot.
///
/// `progress` is derived from `completed_sections` and is only written so
/// that other readers of the blob see the same percentage; it is never
/// trusted on load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub progress: u8,
    pub completed_sections: Vec<String>,
    pub bookmarked_cards: Vec<String>,
    pub reviewed_cards: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub alquenos_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub state: PersistedState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_state_uses_camel_case_keys() {
        let record = PersistedState {
            progress: 17,
            completed_sections: vec!["fundamentos".to_string()],
            bookmarked_cards: vec!["1.1".to_string()],
            reviewed_cards: 3,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["progress"], 17);
        assert_eq!(json["completedSections"][0], "fundamentos");
        assert_eq!(json["bookmarkedCards"][0], "1.1");
        assert_eq!(json["reviewedCards"], 3);
    }

    #[test]
    fn test_export_missing_state_fields_default() {
        let json = r#"{
            "alquenos_export_version": 1,
            "exported_at": "2026-01-05T10:00:00Z",
            "state": { "reviewedCards": 4 }
        }"#;
        let export: ExportData = serde_json::from_str(json).unwrap();
        assert_eq!(export.state.reviewed_cards, 4);
        assert!(export.state.completed_sections.is_empty());
    }
}
