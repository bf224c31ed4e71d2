pub mod practice;

use std::collections::{BTreeMap, HashSet};

use rust_embed::Embed;
use serde::Deserialize;

use crate::engine::grading::Quiz;
use crate::engine::progress::{ProgressState, SECTION_IDS};
use crate::error::{CatalogError, StudyError};

#[derive(Embed)]
#[folder = "assets/curriculum/"]
struct CurriculumAssets;

const CURRICULUM_FILE: &str = "alquenos.toml";

#[derive(Clone, Debug, Deserialize)]
pub struct Card {
    pub id: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub quiz: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

#[derive(Deserialize)]
struct CurriculumFile {
    sections: Vec<Section>,
    #[serde(default)]
    quizzes: Vec<Quiz>,
}

/// A bookmarked id resolved against the curriculum. `card` is `None` for
/// ids that no longer name a card.
pub struct BookmarkEntry<'a> {
    pub card_id: &'a str,
    pub card: Option<(&'a Section, &'a Card)>,
}

/// Immutable table of sections, cards and quizzes, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Catalog {
    sections: Vec<Section>,
    quizzes: BTreeMap<String, Quiz>,
}

impl Catalog {
    pub fn bundled() -> Result<Self, CatalogError> {
        let file = CurriculumAssets::get(CURRICULUM_FILE)
            .ok_or_else(|| CatalogError::Missing(CURRICULUM_FILE.to_string()))?;
        let content = std::str::from_utf8(file.data.as_ref())?;
        Self::from_toml(content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let file: CurriculumFile = toml::from_str(content)?;
        validate(&file)?;
        let quizzes = file
            .quizzes
            .into_iter()
            .map(|quiz| (quiz.id.clone(), quiz))
            .collect();
        Ok(Self {
            sections: file.sections,
            quizzes,
        })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Find a card and the section that owns it.
    pub fn card(&self, id: &str) -> Option<(&Section, &Card)> {
        self.sections
            .iter()
            .find_map(|s| s.cards.iter().find(|c| c.id == id).map(|c| (s, c)))
    }

    pub fn quiz(&self, id: &str) -> Result<&Quiz, StudyError> {
        self.quizzes
            .get(id)
            .ok_or_else(|| StudyError::QuizNotFound(id.to_string()))
    }

    pub fn quizzes(&self) -> impl Iterator<Item = &Quiz> {
        self.quizzes.values()
    }

    pub fn bookmarks<'a>(&'a self, state: &'a ProgressState) -> Vec<BookmarkEntry<'a>> {
        state
            .bookmarked_cards()
            .iter()
            .map(|id| BookmarkEntry {
                card_id: id.as_str(),
                card: self.card(id),
            })
            .collect()
    }
}

fn validate(file: &CurriculumFile) -> Result<(), CatalogError> {
    let ids: Vec<&str> = file.sections.iter().map(|s| s.id.as_str()).collect();
    if ids != SECTION_IDS {
        return Err(CatalogError::Invalid(format!(
            "sections must be {SECTION_IDS:?}, found {ids:?}"
        )));
    }

    let mut quiz_ids = HashSet::new();
    for quiz in &file.quizzes {
        if !quiz_ids.insert(quiz.id.as_str()) {
            return Err(CatalogError::Invalid(format!("duplicate quiz '{}'", quiz.id)));
        }
        if quiz.is_empty() {
            return Err(CatalogError::Invalid(format!("quiz '{}' has no questions", quiz.id)));
        }
        for (idx, q) in quiz.questions.iter().enumerate() {
            if q.options.len() < 2 {
                return Err(CatalogError::Invalid(format!(
                    "quiz '{}' question {} needs at least two options",
                    quiz.id,
                    idx + 1
                )));
            }
            if q.correct >= q.options.len() {
                return Err(CatalogError::Invalid(format!(
                    "quiz '{}' question {} has correct index {} out of range",
                    quiz.id,
                    idx + 1,
                    q.correct
                )));
            }
        }
    }

    let mut card_ids = HashSet::new();
    for card in file.sections.iter().flat_map(|s| &s.cards) {
        if !card_ids.insert(card.id.as_str()) {
            return Err(CatalogError::Invalid(format!("duplicate card '{}'", card.id)));
        }
        if let Some(quiz) = &card.quiz
            && !quiz_ids.contains(quiz.as_str())
        {
            return Err(CatalogError::Invalid(format!(
                "card '{}' references unknown quiz '{quiz}'",
                card.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_SECTIONS: &str = r#"
[[sections]]
id = "fundamentos"
title = "F"
summary = ""
[[sections.cards]]
id = "1.1"
title = "C"
summary = ""
quiz = "1.1"
[[sections]]
id = "nomenclatura"
title = "N"
summary = ""
[[sections]]
id = "propiedades"
title = "P"
summary = ""
[[sections]]
id = "reacciones"
title = "R"
summary = ""
[[sections]]
id = "sintesis"
title = "S"
summary = ""
[[sections]]
id = "aplicaciones"
title = "A"
summary = ""
"#;

    fn with_quiz(quiz: &str) -> String {
        format!("{MINIMAL_SECTIONS}\n{quiz}")
    }

    #[test]
    fn test_bundled_curriculum_loads() {
        let catalog = Catalog::bundled().unwrap();
        let ids: Vec<&str> = catalog.sections().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, SECTION_IDS);
        assert!(catalog.sections().iter().all(|s| !s.cards.is_empty()));
    }

    #[test]
    fn test_bundled_quiz_catalog() {
        let catalog = Catalog::bundled().unwrap();
        let quiz = catalog.quiz("1.1").unwrap();
        assert_eq!(quiz.title, "Test: Enlace doble C=C");
        let corrects: Vec<usize> = quiz.questions.iter().map(|q| q.correct).collect();
        assert_eq!(corrects, vec![1, 1]);

        let markovnikov = catalog.quiz("1.3").unwrap();
        assert_eq!(markovnikov.len(), 1);
        assert_eq!(markovnikov.questions[0].correct, 2);
    }

    #[test]
    fn test_unknown_quiz_is_not_found() {
        let catalog = Catalog::bundled().unwrap();
        let err = catalog.quiz("4.1").unwrap_err();
        assert!(matches!(err, StudyError::QuizNotFound(ref id) if id == "4.1"));
    }

    #[test]
    fn test_card_lookup_returns_owner() {
        let catalog = Catalog::bundled().unwrap();
        let (section, card) = catalog.card("4.2").unwrap();
        assert_eq!(section.id, "reacciones");
        assert_eq!(card.id, "4.2");
        assert!(catalog.card("9.9").is_none());
    }

    #[test]
    fn test_bookmarks_resolve_known_and_unknown() {
        let catalog = Catalog::bundled().unwrap();
        let mut state = ProgressState::default();
        state.toggle_bookmark("1.3");
        state.toggle_bookmark("legacy-card");
        let entries = catalog.bookmarks(&state);
        assert_eq!(entries.len(), 2);
        let known = entries.iter().find(|e| e.card_id == "1.3").unwrap();
        assert_eq!(known.card.unwrap().1.title, "Regla de Markovnikov");
        let unknown = entries.iter().find(|e| e.card_id == "legacy-card").unwrap();
        assert!(unknown.card.is_none());
    }

    #[test]
    fn test_rejects_wrong_sections() {
        let content = MINIMAL_SECTIONS.replace("aplicaciones", "extra");
        let err = Catalog::from_toml(&content).unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }

    #[test]
    fn test_rejects_dangling_quiz_reference() {
        let err = Catalog::from_toml(MINIMAL_SECTIONS).unwrap_err();
        assert!(err.to_string().contains("unknown quiz"));
    }

    #[test]
    fn test_rejects_correct_index_out_of_range() {
        let content = with_quiz(
            r#"
[[quizzes]]
id = "1.1"
title = "T"
[[quizzes.questions]]
prompt = "?"
options = ["a", "b"]
correct = 2
explanation = ""
"#,
        );
        let err = Catalog::from_toml(&content).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_rejects_quiz_without_questions() {
        let content = with_quiz(
            r#"
[[quizzes]]
id = "1.1"
title = "T"
questions = []
"#,
        );
        let err = Catalog::from_toml(&content).unwrap_err();
        assert!(err.to_string().contains("no questions"));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = Catalog::from_toml("[[sections]\nid = ").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }
}
