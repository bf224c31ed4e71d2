use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use alquenos::curriculum::Section;
use alquenos::engine::progress::ProgressState;

use crate::ui::theme::Theme;

/// The curriculum overview: one row per section with its completion mark.
pub struct SectionList<'a> {
    sections: &'a [Section],
    state: &'a ProgressState,
    selected: usize,
    theme: &'a Theme,
}

impl<'a> SectionList<'a> {
    pub fn new(
        sections: &'a [Section],
        state: &'a ProgressState,
        selected: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            sections,
            state,
            selected,
            theme,
        }
    }
}

impl Widget for SectionList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(inner);

        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Alquenos",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Mapa mental de química orgánica",
                Style::default().fg(colors.fg()),
            )),
        ];
        Paragraph::new(title_lines)
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                self.sections
                    .iter()
                    .map(|_| Constraint::Length(2))
                    .collect::<Vec<_>>(),
            )
            .split(layout[1]);

        for (i, section) in self.sections.iter().enumerate() {
            let Some(row) = rows.get(i) else { break };
            let is_selected = i == self.selected;
            let done = self.state.is_completed(&section.id);
            let indicator = if is_selected { ">" } else { " " };
            let mark = if done { "[x]" } else { "[ ]" };

            let label_style = Style::default()
                .fg(if is_selected { colors.accent() } else { colors.fg() })
                .add_modifier(if is_selected {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                });
            let mark_style = Style::default().fg(if done {
                colors.completed()
            } else {
                colors.muted()
            });

            let lines = vec![
                Line::from(vec![
                    Span::styled(format!(" {indicator} "), label_style),
                    Span::styled(mark, mark_style),
                    Span::styled(format!(" {}. {}", i + 1, section.title), label_style),
                    Span::styled(
                        format!("  ({} tarjetas)", section.cards.len()),
                        Style::default().fg(colors.muted()),
                    ),
                ]),
                Line::from(Span::styled(
                    format!("       {}", section.summary),
                    Style::default().fg(colors.muted()),
                )),
            ];
            Paragraph::new(lines).render(*row, buf);
        }
    }
}
