use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct: usize,
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Selected option per question index. Questions without an entry are unanswered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuizAttempt {
    selections: BTreeMap<usize, usize>,
}

impl QuizAttempt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, question: usize, option: usize) {
        self.selections.insert(question, option);
    }

    pub fn clear(&mut self, question: usize) {
        self.selections.remove(&question);
    }

    pub fn selected(&self, question: usize) -> Option<usize> {
        self.selections.get(&question).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }
}

impl FromIterator<(usize, usize)> for QuizAttempt {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        Self {
            selections: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub answered: bool,
    pub correct: bool,
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GradeReport {
    pub score: usize,
    pub per_question: Vec<QuestionOutcome>,
}

impl GradeReport {
    pub fn total(&self) -> usize {
        self.per_question.len()
    }

    pub fn is_perfect(&self) -> bool {
        self.score == self.total()
    }
}

/// Score an attempt. Pure: the same inputs always give the same report.
///
/// A selection outside the question's options counts as answered and wrong.
pub fn grade(quiz: &Quiz, attempt: &QuizAttempt) -> GradeReport {
    let per_question: Vec<QuestionOutcome> = quiz
        .questions
        .iter()
        .enumerate()
        .map(|(idx, question)| {
            let selected = attempt.selected(idx);
            QuestionOutcome {
                answered: selected.is_some(),
                correct: selected == Some(question.correct),
                explanation: question.explanation.clone(),
            }
        })
        .collect();
    let score = per_question.iter().filter(|o| o.correct).count();
    GradeReport {
        score,
        per_question,
    }
}
