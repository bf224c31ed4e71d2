use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::curriculum::Catalog;
use crate::engine::grading::{Question, Quiz};
use crate::engine::progress::ProgressState;

pub const PRACTICE_QUIZ_ID: &str = "practice";

/// Assemble a shuffled review quiz from what the learner has worked on.
///
/// Questions come from quizzes attached to bookmarked cards or to cards of
/// completed sections. With nothing to draw from, every quiz in the catalog
/// is used instead. Returns `None` only when the catalog has no quizzes.
pub fn build_practice_quiz<R: Rng + ?Sized>(
    catalog: &Catalog,
    state: &ProgressState,
    rng: &mut R,
    max_questions: usize,
) -> Option<Quiz> {
    let focused: BTreeSet<&str> = catalog
        .sections()
        .iter()
        .flat_map(|section| {
            let completed = state.is_completed(&section.id);
            section
                .cards
                .iter()
                .filter(move |card| completed || state.is_bookmarked(&card.id))
                .filter_map(|card| card.quiz.as_deref())
        })
        .collect();

    let mut pool: Vec<Question> = if focused.is_empty() {
        catalog
            .quizzes()
            .flat_map(|quiz| quiz.questions.iter().cloned())
            .collect()
    } else {
        focused
            .iter()
            .filter_map(|id| catalog.quiz(id).ok())
            .flat_map(|quiz| quiz.questions.iter().cloned())
            .collect()
    };
    if pool.is_empty() {
        return None;
    }

    pool.shuffle(rng);
    pool.truncate(max_questions.max(1));

    Some(Quiz {
        id: PRACTICE_QUIZ_ID.to_string(),
        title: "Test: Repaso personalizado".to_string(),
        questions: pool,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn prompts(quiz: &Quiz) -> BTreeSet<String> {
        quiz.questions.iter().map(|q| q.prompt.clone()).collect()
    }

    #[test]
    fn test_empty_progress_draws_from_whole_catalog() {
        let catalog = Catalog::bundled().unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let quiz = build_practice_quiz(&catalog, &ProgressState::default(), &mut rng, 10).unwrap();
        assert_eq!(quiz.id, PRACTICE_QUIZ_ID);
        let total: usize = catalog.quizzes().map(Quiz::len).sum();
        assert_eq!(quiz.len(), total);
    }

    #[test]
    fn test_bookmark_focuses_pool() {
        let catalog = Catalog::bundled().unwrap();
        let mut state = ProgressState::default();
        state.toggle_bookmark("1.3");
        let mut rng = SmallRng::seed_from_u64(1);
        let quiz = build_practice_quiz(&catalog, &state, &mut rng, 10).unwrap();
        assert_eq!(prompts(&quiz), prompts(catalog.quiz("1.3").unwrap()));
    }

    #[test]
    fn test_completed_section_includes_its_quizzes() {
        let catalog = Catalog::bundled().unwrap();
        let mut state = ProgressState::default();
        state.toggle_section("fundamentos").unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        let quiz = build_practice_quiz(&catalog, &state, &mut rng, 10).unwrap();
        let mut expected = prompts(catalog.quiz("1.1").unwrap());
        expected.extend(prompts(catalog.quiz("1.3").unwrap()));
        assert_eq!(prompts(&quiz), expected);
    }

    #[test]
    fn test_bookmark_without_quiz_falls_back_to_everything() {
        let catalog = Catalog::bundled().unwrap();
        let mut state = ProgressState::default();
        state.toggle_bookmark("6.1");
        let mut rng = SmallRng::seed_from_u64(5);
        let quiz = build_practice_quiz(&catalog, &state, &mut rng, 10).unwrap();
        let total: usize = catalog.quizzes().map(Quiz::len).sum();
        assert_eq!(quiz.len(), total);
    }

    #[test]
    fn test_truncates_to_limit() {
        let catalog = Catalog::bundled().unwrap();
        let mut rng = SmallRng::seed_from_u64(11);
        let quiz = build_practice_quiz(&catalog, &ProgressState::default(), &mut rng, 2).unwrap();
        assert_eq!(quiz.len(), 2);
        let quiz = build_practice_quiz(&catalog, &ProgressState::default(), &mut rng, 0).unwrap();
        assert_eq!(quiz.len(), 1);
    }
}
