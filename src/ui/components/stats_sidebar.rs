use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use alquenos::engine::progress::{ProgressState, TOTAL_SECTIONS};

use crate::ui::components::progress_bar::ProgressBar;
use crate::ui::theme::Theme;

pub struct StatsSidebar<'a> {
    state: &'a ProgressState,
    theme: &'a Theme,
}

impl<'a> StatsSidebar<'a> {
    pub fn new(state: &'a ProgressState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl Widget for StatsSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        ProgressBar::new("Progreso", self.state.progress(), self.theme).render(layout[0], buf);

        let block = Block::bordered()
            .title(" Estadísticas ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(layout[1]);
        block.render(layout[1], buf);

        let label = Style::default().fg(colors.muted());
        let value = Style::default()
            .fg(colors.accent())
            .add_modifier(Modifier::BOLD);

        let lines = vec![
            Line::from(vec![
                Span::styled(" Secciones completadas: ", label),
                Span::styled(
                    format!("{}/{TOTAL_SECTIONS}", self.state.completed_sections().len()),
                    value,
                ),
            ]),
            Line::from(vec![
                Span::styled(" Tarjetas revisadas:    ", label),
                Span::styled(self.state.reviewed_cards().to_string(), value),
            ]),
            Line::from(vec![
                Span::styled(" Tarjetas guardadas:    ", label),
                Span::styled(self.state.bookmarked_cards().len().to_string(), value),
            ]),
        ];
        Paragraph::new(lines).render(inner, buf);
    }
}
