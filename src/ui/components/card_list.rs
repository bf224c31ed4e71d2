use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use alquenos::curriculum::{BookmarkEntry, Card};
use alquenos::engine::progress::ProgressState;

use crate::ui::theme::Theme;

pub struct CardRow<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub summary: &'a str,
    pub bookmarked: bool,
    pub has_quiz: bool,
}

impl<'a> CardRow<'a> {
    pub fn from_card(card: &'a Card, state: &ProgressState) -> Self {
        Self {
            id: &card.id,
            title: &card.title,
            summary: &card.summary,
            bookmarked: state.is_bookmarked(&card.id),
            has_quiz: card.quiz.is_some(),
        }
    }

    pub fn from_bookmark(entry: &BookmarkEntry<'a>) -> Self {
        match entry.card {
            Some((section, card)) => Self {
                id: &card.id,
                title: &card.title,
                summary: &section.title,
                bookmarked: true,
                has_quiz: card.quiz.is_some(),
            },
            None => Self {
                id: entry.card_id,
                title: entry.card_id,
                summary: "(tarjeta no encontrada)",
                bookmarked: true,
                has_quiz: false,
            },
        }
    }
}

/// Bordered list of cards with bookmark and quiz markers.
pub struct CardList<'a> {
    title: String,
    rows: Vec<CardRow<'a>>,
    selected: usize,
    empty_message: &'a str,
    theme: &'a Theme,
}

impl<'a> CardList<'a> {
    pub fn new(title: &str, rows: Vec<CardRow<'a>>, selected: usize, theme: &'a Theme) -> Self {
        Self {
            title: title.to_string(),
            rows,
            selected,
            empty_message: "",
            theme,
        }
    }

    pub fn empty_message(mut self, message: &'a str) -> Self {
        self.empty_message = message;
        self
    }
}

impl Widget for CardList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.rows.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                format!(" {}", self.empty_message),
                Style::default().fg(colors.muted()),
            )))
            .wrap(Wrap { trim: false })
            .render(inner, buf);
            return;
        }

        let mut lines: Vec<Line> = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };
            let mark = if row.bookmarked { "★" } else { "☆" };
            let quiz = if row.has_quiz { "  [test]" } else { "" };

            let title_style = Style::default()
                .fg(if is_selected { colors.accent() } else { colors.fg() })
                .add_modifier(if is_selected {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                });
            let mark_style = Style::default().fg(if row.bookmarked {
                colors.bookmark()
            } else {
                colors.muted()
            });

            lines.push(Line::from(vec![
                Span::styled(format!(" {indicator} "), title_style),
                Span::styled(mark, mark_style),
                Span::styled(format!(" {} {}", row.id, row.title), title_style),
                Span::styled(quiz, Style::default().fg(colors.accent())),
            ]));
            lines.push(Line::from(Span::styled(
                format!("     {}", row.summary),
                Style::default().fg(colors.muted()),
            )));
            lines.push(Line::from(""));
        }

        // Keep the selected card visible: three lines per row.
        let row_height = 3u16;
        let visible_rows = (inner.height / row_height).max(1) as usize;
        let first = self.selected.saturating_sub(visible_rows.saturating_sub(1));
        Paragraph::new(lines)
            .scroll((first as u16 * row_height, 0))
            .render(inner, buf);
    }
}
