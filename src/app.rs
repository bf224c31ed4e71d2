use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::SmallRng;

use alquenos::config::Config;
use alquenos::curriculum::practice::build_practice_quiz;
use alquenos::curriculum::{Card, Catalog, Section};
use alquenos::error::StudyError;
use alquenos::session::quiz::{QuizSession, submit_quiz};
use alquenos::session::tracker::ProgressTracker;
use alquenos::store::kv::KeyValueStore;

use crate::ui::theme::Theme;

const STATUS_TTL: Duration = Duration::from_secs(2);

pub const QUIZ_UNAVAILABLE: &str = "Quiz no disponible para esta sección.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Sections,
    Section,
    Quiz,
    Bookmarks,
    ConfirmReset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    expires_at: Instant,
}

pub struct App<S: KeyValueStore> {
    pub screen: AppScreen,
    pub catalog: Catalog,
    pub tracker: ProgressTracker<S>,
    pub config: Config,
    pub theme: Theme,
    pub section_selected: usize,
    pub card_selected: usize,
    pub bookmark_selected: usize,
    pub quiz: Option<QuizSession>,
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
    quiz_return: AppScreen,
    rng: SmallRng,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(catalog: Catalog, tracker: ProgressTracker<S>, config: Config, theme: Theme) -> Self {
        Self {
            screen: AppScreen::Sections,
            catalog,
            tracker,
            config,
            theme,
            section_selected: 0,
            card_selected: 0,
            bookmark_selected: 0,
            quiz: None,
            status: None,
            should_quit: false,
            quiz_return: AppScreen::Sections,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Screen drawn underneath popups.
    pub fn background_screen(&self) -> AppScreen {
        match self.screen {
            AppScreen::Quiz => self.quiz_return,
            AppScreen::ConfirmReset => AppScreen::Sections,
            screen => screen,
        }
    }

    pub fn current_section(&self) -> &Section {
        let sections = self.catalog.sections();
        &sections[self.section_selected.min(sections.len() - 1)]
    }

    pub fn selected_card(&self) -> Option<&Card> {
        self.current_section().cards.get(self.card_selected)
    }

    pub fn select_next_section(&mut self) {
        self.section_selected = (self.section_selected + 1) % self.catalog.sections().len();
    }

    pub fn select_prev_section(&mut self) {
        let len = self.catalog.sections().len();
        self.section_selected = (self.section_selected + len - 1) % len;
    }

    pub fn select_section(&mut self, index: usize) {
        if index < self.catalog.sections().len() {
            self.section_selected = index;
        }
    }

    pub fn select_next_card(&mut self) {
        let len = self.current_section().cards.len();
        if self.card_selected + 1 < len {
            self.card_selected += 1;
        }
    }

    pub fn select_prev_card(&mut self) {
        self.card_selected = self.card_selected.saturating_sub(1);
    }

    pub fn select_next_bookmark(&mut self) {
        let len = self.tracker.state().bookmarked_cards().len();
        if self.bookmark_selected + 1 < len {
            self.bookmark_selected += 1;
        }
    }

    pub fn select_prev_bookmark(&mut self) {
        self.bookmark_selected = self.bookmark_selected.saturating_sub(1);
    }

    /// Navigate into the selected section; the first visit of the session
    /// to an incomplete section counts as a reviewed card.
    pub fn open_section(&mut self) {
        let id = self.current_section().id.clone();
        self.card_selected = 0;
        self.screen = AppScreen::Section;
        let result = self.tracker.mark_section_visited(&id);
        self.handle(result);
    }

    pub fn toggle_section_complete(&mut self) {
        let section = self.current_section();
        let (id, title) = (section.id.clone(), section.title.clone());
        let result = self.tracker.toggle_section_complete(&id);
        if let Some(done) = self.handle(result) {
            let text = if done {
                format!("{title}: completada")
            } else {
                format!("{title}: marcada como pendiente")
            };
            self.set_status(text, StatusKind::Success);
        }
    }

    pub fn toggle_selected_bookmark(&mut self) {
        let card_id = match self.screen {
            AppScreen::Bookmarks => self
                .tracker
                .state()
                .bookmarked_cards()
                .iter()
                .nth(self.bookmark_selected)
                .cloned(),
            _ => self.selected_card().map(|c| c.id.clone()),
        };
        let Some(card_id) = card_id else { return };
        let result = self.tracker.toggle_bookmark(&card_id);
        self.handle(result);

        let len = self.tracker.state().bookmarked_cards().len();
        self.bookmark_selected = self.bookmark_selected.min(len.saturating_sub(1));
    }

    /// Open the quiz attached to the selected card, keyed by the card id when
    /// the card names no quiz of its own.
    pub fn open_card_quiz(&mut self) {
        let Some(card) = self.selected_card() else { return };
        let quiz_id = card.quiz.clone().unwrap_or_else(|| card.id.clone());
        let result = QuizSession::open(&self.catalog, &quiz_id);
        if let Some(session) = self.handle(result) {
            self.show_quiz(session);
        }
    }

    pub fn open_practice_quiz(&mut self) {
        let quiz = build_practice_quiz(
            &self.catalog,
            self.tracker.state(),
            &mut self.rng,
            self.config.practice_questions,
        );
        match quiz {
            Some(quiz) => self.show_quiz(QuizSession::from_quiz(quiz)),
            None => self.set_status(QUIZ_UNAVAILABLE, StatusKind::Info),
        }
    }

    fn show_quiz(&mut self, session: QuizSession) {
        self.quiz = Some(session);
        if self.screen != AppScreen::Quiz {
            self.quiz_return = self.screen;
        }
        self.screen = AppScreen::Quiz;
    }

    pub fn submit_quiz(&mut self) {
        let Some(session) = self.quiz.as_mut() else { return };
        let result = submit_quiz(session, &mut self.tracker);
        if let Some(Some(report)) = self.handle(result)
            && report.is_perfect()
        {
            self.set_status("¡Excelente! +1 tarjeta revisada", StatusKind::Success);
        }
    }

    pub fn restart_quiz(&mut self) {
        if let Some(session) = self.quiz.as_mut() {
            session.restart();
        }
    }

    pub fn close_quiz(&mut self) {
        self.quiz = None;
        self.screen = self.quiz_return;
    }

    pub fn go_to_bookmarks(&mut self) {
        self.bookmark_selected = 0;
        self.screen = AppScreen::Bookmarks;
        let count = self.tracker.state().bookmarked_cards().len();
        if count == 0 {
            self.set_status(
                "Guarda algunas tarjetas primero usando el marcador.",
                StatusKind::Info,
            );
        } else {
            self.set_status(
                format!("Tienes {count} tarjetas guardadas para estudio."),
                StatusKind::Info,
            );
        }
    }

    pub fn go_to_sections(&mut self) {
        self.screen = AppScreen::Sections;
    }

    pub fn request_reset(&mut self) {
        if self.config.confirm_reset {
            self.screen = AppScreen::ConfirmReset;
        } else {
            self.reset_progress();
        }
    }

    pub fn reset_progress(&mut self) {
        let result = self.tracker.reset();
        if self.handle(result).is_some() {
            self.card_selected = 0;
            self.bookmark_selected = 0;
            self.set_status("¡Reiniciado!", StatusKind::Success);
        }
        self.screen = AppScreen::Sections;
    }

    pub fn cancel_reset(&mut self) {
        self.screen = AppScreen::Sections;
    }

    pub fn cycle_theme(&mut self) {
        let next = Theme::next_name(&self.config.theme);
        let Some(theme) = Theme::load(&next) else { return };
        self.theme = theme;
        self.config.theme = next;
        match Config::save_theme(&self.config.theme) {
            Ok(()) => self.set_status(format!("Tema: {}", self.config.theme), StatusKind::Info),
            Err(err) => {
                log::error!("failed to save config: {err:#}");
                self.set_status(format!("No se pudo guardar la configuración: {err}"), StatusKind::Error);
            }
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
            expires_at: Instant::now() + STATUS_TTL,
        });
    }

    pub fn tick(&mut self, now: Instant) {
        if self.status.as_ref().is_some_and(|s| now >= s.expires_at) {
            self.status = None;
        }
    }

    /// Turn a study error into a status line. Unknown quizzes are an
    /// informational notice, everything else is shown as an error.
    fn handle<T>(&mut self, result: Result<T, StudyError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(StudyError::QuizNotFound(id)) => {
                log::info!("no quiz for '{id}'");
                self.set_status(QUIZ_UNAVAILABLE, StatusKind::Info);
                None
            }
            Err(err) => {
                log::error!("{err}");
                self.set_status(format!("Error: {err}"), StatusKind::Error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alquenos::store::kv::MemoryStore;

    fn app() -> App<MemoryStore> {
        let mut config = Config::default();
        config.confirm_reset = true;
        App::new(
            Catalog::bundled().unwrap(),
            ProgressTracker::open(MemoryStore::new()),
            config,
            Theme::default(),
        )
    }

    #[test]
    fn test_open_section_counts_first_visit() {
        let mut app = app();
        app.open_section();
        assert_eq!(app.screen, AppScreen::Section);
        assert_eq!(app.tracker.state().reviewed_cards(), 1);
        app.go_to_sections();
        app.open_section();
        assert_eq!(app.tracker.state().reviewed_cards(), 1);
    }

    #[test]
    fn test_section_navigation_wraps() {
        let mut app = app();
        app.select_prev_section();
        assert_eq!(app.current_section().id, "aplicaciones");
        app.select_next_section();
        assert_eq!(app.current_section().id, "fundamentos");
        app.select_section(3);
        assert_eq!(app.current_section().id, "reacciones");
        app.select_section(42);
        assert_eq!(app.section_selected, 3);
    }

    #[test]
    fn test_card_without_quiz_shows_notice() {
        let mut app = app();
        app.open_section();
        app.select_next_card(); // 1.2 has no quiz
        app.open_card_quiz();
        assert_eq!(app.screen, AppScreen::Section);
        assert!(app.quiz.is_none());
        let status = app.status.as_ref().unwrap();
        assert_eq!(status.text, QUIZ_UNAVAILABLE);
        assert_eq!(status.kind, StatusKind::Info);
    }

    #[test]
    fn test_perfect_quiz_from_section_bumps_counter() {
        let mut app = app();
        app.open_section();
        app.open_card_quiz();
        assert_eq!(app.screen, AppScreen::Quiz);
        {
            let session = app.quiz.as_mut().unwrap();
            session.select(0, 1);
            session.select(1, 1);
        }
        app.submit_quiz();
        // one visit plus one perfect quiz
        assert_eq!(app.tracker.state().reviewed_cards(), 2);
        app.submit_quiz();
        assert_eq!(app.tracker.state().reviewed_cards(), 2);

        app.close_quiz();
        assert_eq!(app.screen, AppScreen::Section);
    }

    #[test]
    fn test_bookmarks_screen_unbookmarks_selected() {
        let mut app = app();
        app.open_section();
        app.toggle_selected_bookmark();
        app.select_next_card();
        app.toggle_selected_bookmark();
        assert_eq!(app.tracker.state().bookmarked_cards().len(), 2);

        app.go_to_bookmarks();
        assert!(app.status.as_ref().unwrap().text.contains('2'));
        app.select_next_bookmark();
        app.toggle_selected_bookmark();
        assert_eq!(app.tracker.state().bookmarked_cards().len(), 1);
        assert_eq!(app.bookmark_selected, 0);
        assert!(app.tracker.state().is_bookmarked("1.1"));
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let mut app = app();
        app.toggle_section_complete();
        app.request_reset();
        assert_eq!(app.screen, AppScreen::ConfirmReset);
        app.cancel_reset();
        assert_eq!(app.tracker.state().progress(), 17);

        app.request_reset();
        app.reset_progress();
        assert_eq!(app.screen, AppScreen::Sections);
        assert!(app.tracker.state().is_empty());
        assert_eq!(app.status.as_ref().unwrap().text, "¡Reiniciado!");
    }

    #[test]
    fn test_store_failure_surfaces_error_status() {
        let mut app = app();
        app.tracker.store_mut().set_fail_writes(true);
        app.toggle_section_complete();
        assert!(app.tracker.state().is_empty());
        assert_eq!(app.status.as_ref().unwrap().kind, StatusKind::Error);
    }

    #[test]
    fn test_practice_quiz_opens() {
        let mut app = app();
        app.open_practice_quiz();
        assert_eq!(app.screen, AppScreen::Quiz);
        assert_eq!(app.quiz.as_ref().unwrap().quiz().id, "practice");
        app.close_quiz();
        assert_eq!(app.screen, AppScreen::Sections);
    }

    #[test]
    fn test_status_expires_on_tick() {
        let mut app = app();
        app.set_status("hola", StatusKind::Info);
        app.tick(Instant::now());
        assert!(app.status.is_some());
        app.tick(Instant::now() + STATUS_TTL + Duration::from_millis(1));
        assert!(app.status.is_none());
    }
}
