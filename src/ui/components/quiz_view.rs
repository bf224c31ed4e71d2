use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use alquenos::session::quiz::QuizSession;

use crate::ui::theme::Theme;

/// Quiz modal: questions with radio options, explanations after grading and
/// the final score line.
pub struct QuizView<'a> {
    session: &'a QuizSession,
    theme: &'a Theme,
}

impl<'a> QuizView<'a> {
    pub fn new(session: &'a QuizSession, theme: &'a Theme) -> Self {
        Self { session, theme }
    }

    fn lines(&self) -> (Vec<Line<'a>>, usize) {
        let colors = &self.theme.colors;
        let quiz = self.session.quiz();
        let attempt = self.session.attempt();
        let report = self.session.report();
        let mut lines: Vec<Line> = Vec::new();
        let mut focused_line = 0;

        for (idx, question) in quiz.questions.iter().enumerate() {
            let is_focused = idx == self.session.focused() && report.is_none();
            if idx == self.session.focused() {
                focused_line = lines.len();
            }
            let prompt_style = Style::default()
                .fg(if is_focused { colors.accent() } else { colors.fg() })
                .add_modifier(Modifier::BOLD);
            lines.push(Line::from(Span::styled(
                format!("{}. {}", idx + 1, question.prompt),
                prompt_style,
            )));

            let selected = attempt.selected(idx);
            for (opt_idx, option) in question.options.iter().enumerate() {
                let chosen = selected == Some(opt_idx);
                let radio = if chosen { "(•)" } else { "( )" };
                let style = match report {
                    Some(_) if opt_idx == question.correct => Style::default().fg(colors.correct()),
                    Some(_) if chosen => Style::default().fg(colors.incorrect()),
                    _ if chosen => Style::default().fg(colors.accent()),
                    _ => Style::default().fg(colors.fg()),
                };
                lines.push(Line::from(Span::styled(
                    format!("   {radio} {} {option}", opt_idx + 1),
                    style,
                )));
            }

            if let Some(outcome) = report.and_then(|r| r.per_question.get(idx)) {
                let color = if !outcome.answered {
                    colors.unanswered()
                } else if outcome.correct {
                    colors.correct()
                } else {
                    colors.incorrect()
                };
                lines.push(Line::from(vec![
                    Span::styled(
                        "   Explicación: ",
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(outcome.explanation.clone(), Style::default().fg(color)),
                ]));
                if !outcome.answered {
                    lines.push(Line::from(Span::styled(
                        "   No seleccionaste una opción.",
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    )));
                }
            }
            lines.push(Line::from(""));
        }

        if report.is_none() {
            lines.push(Line::from(Span::styled(
                format!("Respondidas: {}/{}", attempt.answered_count(), quiz.len()),
                Style::default().fg(colors.muted()),
            )));
        }

        if let Some(report) = report {
            let verdict = if report.is_perfect() {
                "¡Excelente! 🎯"
            } else {
                "¡Sigue practicando! 📚"
            };
            lines.push(Line::from(Span::styled(
                format!("Resultado: {}/{}  {verdict}", report.score, report.total()),
                Style::default()
                    .fg(if report.is_perfect() {
                        colors.correct()
                    } else {
                        colors.unanswered()
                    })
                    .add_modifier(Modifier::BOLD),
            )));
        }

        (lines, focused_line)
    }
}

impl Widget for QuizView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        Clear.render(area, buf);

        let block = Block::bordered()
            .title(format!(" {} ", self.session.quiz().title))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let (lines, focused_line) = self.lines();
        let total = lines.len() as u16;
        // Scroll to the bottom once graded so the score is visible.
        let scroll = if self.session.is_submitted() {
            total.saturating_sub(inner.height)
        } else {
            (focused_line as u16).min(total.saturating_sub(inner.height))
        };
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .render(inner, buf);
    }
}
