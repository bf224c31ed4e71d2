use crate::curriculum::Catalog;
use crate::engine::grading::{GradeReport, Quiz, QuizAttempt, grade};
use crate::error::StudyError;
use crate::session::tracker::ProgressTracker;
use crate::store::kv::KeyValueStore;

/// An open quiz: the questions to render, the current selections and, once
/// submitted, the graded report. Selections are locked after submitting
/// until the quiz is restarted.
#[derive(Clone, Debug)]
pub struct QuizSession {
    quiz: Quiz,
    attempt: QuizAttempt,
    report: Option<GradeReport>,
    focused: usize,
}

impl QuizSession {
    pub fn open(catalog: &Catalog, quiz_id: &str) -> Result<Self, StudyError> {
        catalog.quiz(quiz_id).cloned().map(Self::from_quiz)
    }

    pub fn from_quiz(quiz: Quiz) -> Self {
        Self {
            quiz,
            attempt: QuizAttempt::new(),
            report: None,
            focused: 0,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn attempt(&self) -> &QuizAttempt {
        &self.attempt
    }

    pub fn report(&self) -> Option<&GradeReport> {
        self.report.as_ref()
    }

    pub fn is_submitted(&self) -> bool {
        self.report.is_some()
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn focus_next(&mut self) {
        if self.focused + 1 < self.quiz.len() {
            self.focused += 1;
        }
    }

    pub fn focus_prev(&mut self) {
        self.focused = self.focused.saturating_sub(1);
    }

    /// Select an option for a question. Ignored (returns false) once
    /// submitted or when either index is out of range.
    pub fn select(&mut self, question: usize, option: usize) -> bool {
        if self.is_submitted() {
            return false;
        }
        let Some(q) = self.quiz.questions.get(question) else {
            return false;
        };
        if option >= q.options.len() {
            return false;
        }
        self.attempt.select(question, option);
        true
    }

    /// Drop the selection of the focused question. Ignored once submitted.
    pub fn clear_focused(&mut self) -> bool {
        if self.is_submitted() || self.attempt.selected(self.focused).is_none() {
            return false;
        }
        self.attempt.clear(self.focused);
        true
    }

    /// Move the selection of the focused question by `delta` options, wrapping.
    pub fn cycle_focused(&mut self, delta: isize) -> bool {
        let Some(q) = self.quiz.questions.get(self.focused) else {
            return false;
        };
        let count = q.options.len() as isize;
        let next = match self.attempt.selected(self.focused) {
            Some(current) => (current as isize + delta).rem_euclid(count),
            None if delta < 0 => count - 1,
            None => 0,
        };
        self.select(self.focused, next as usize)
    }

    /// Grade the attempt. Returns the report only the first time it is
    /// graded; later calls return `None` until `restart`.
    pub fn submit(&mut self) -> Option<&GradeReport> {
        if self.report.is_some() {
            return None;
        }
        self.report = Some(grade(&self.quiz, &self.attempt));
        self.report.as_ref()
    }

    pub fn restart(&mut self) {
        self.attempt = QuizAttempt::new();
        self.report = None;
        self.focused = 0;
    }
}

/// Grade an open quiz and credit a perfect score to the reviewed counter.
///
/// Returns `Ok(None)` when the session was already submitted. The session
/// only locks once the credit is persisted, so a failed write can be retried.
pub fn submit_quiz<S: KeyValueStore>(
    session: &mut QuizSession,
    tracker: &mut ProgressTracker<S>,
) -> Result<Option<GradeReport>, StudyError> {
    if session.is_submitted() {
        return Ok(None);
    }
    let report = grade(&session.quiz, &session.attempt);
    log::debug!(
        "quiz '{}' graded {}/{}",
        session.quiz.id,
        report.score,
        report.total()
    );
    if report.is_perfect() {
        tracker.record_perfect_quiz()?;
    }
    session.report = Some(report.clone());
    Ok(Some(report))
}
