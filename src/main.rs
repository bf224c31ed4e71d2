mod app;
mod cli;
mod event;
mod ui;

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};

use alquenos::config::Config;
use alquenos::curriculum::Catalog;
use alquenos::session::tracker::ProgressTracker;
use alquenos::store::json_store::JsonStore;
use alquenos::store::kv::KeyValueStore;

use app::{App, AppScreen, StatusKind};
use cli::Cli;
use event::{AppEvent, EventHandler};
use ui::components::card_list::{CardList, CardRow};
use ui::components::progress_bar::ProgressBar;
use ui::components::quiz_view::QuizView;
use ui::components::section_list::SectionList;
use ui::components::stats_sidebar::StatsSidebar;
use ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use ui::theme::Theme;

fn main() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|err| {
        log::warn!("ignoring unreadable config: {err:#}");
        Config::default()
    });
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }
    config.validate(&Theme::available_themes());

    let catalog = Catalog::bundled()?;
    let store = JsonStore::with_base_dir(config.data_dir())?;
    let mut tracker = ProgressTracker::open(store);

    if let Some(command) = cli.command {
        let mut stdout = io::stdout().lock();
        return cli::run_command(command, &catalog, &mut tracker, &config, &mut stdout);
    }

    let theme = Theme::load(&config.theme).unwrap_or_default();
    let mut app = App::new(catalog, tracker, config, theme);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(200));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app<S: KeyValueStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<S>,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.tick(Instant::now()),
            AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key<S: KeyValueStore>(app: &mut App<S>, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Sections => handle_sections_key(app, key),
        AppScreen::Section => handle_section_key(app, key),
        AppScreen::Quiz => handle_quiz_key(app, key),
        AppScreen::Bookmarks => handle_bookmarks_key(app, key),
        AppScreen::ConfirmReset => handle_confirm_key(app, key),
    }
}

fn handle_sections_key<S: KeyValueStore>(app: &mut App<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.select_prev_section(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_section(),
        KeyCode::Char(ch @ '1'..='6') => app.select_section(ch as usize - '1' as usize),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => app.open_section(),
        KeyCode::Char('c') => app.toggle_section_complete(),
        KeyCode::Char('b') => app.go_to_bookmarks(),
        KeyCode::Char('p') => app.open_practice_quiz(),
        KeyCode::Char('r') => app.request_reset(),
        KeyCode::Char('t') => app.cycle_theme(),
        _ => {}
    }
}

fn handle_section_key<S: KeyValueStore>(app: &mut App<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('q') => {
            app.go_to_sections()
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_prev_card(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_card(),
        KeyCode::Char('m') | KeyCode::Char(' ') => app.toggle_selected_bookmark(),
        KeyCode::Char('c') => app.toggle_section_complete(),
        KeyCode::Enter | KeyCode::Char('t') => app.open_card_quiz(),
        _ => {}
    }
}

fn handle_quiz_key<S: KeyValueStore>(app: &mut App<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_quiz(),
        KeyCode::Enter => app.submit_quiz(),
        KeyCode::Char('r') => app.restart_quiz(),
        _ => {
            let Some(session) = app.quiz.as_mut() else { return };
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => session.focus_prev(),
                KeyCode::Down | KeyCode::Char('j') => session.focus_next(),
                KeyCode::Left | KeyCode::Char('h') => {
                    session.cycle_focused(-1);
                }
                KeyCode::Right | KeyCode::Char('l') => {
                    session.cycle_focused(1);
                }
                KeyCode::Backspace | KeyCode::Char('0') => {
                    session.clear_focused();
                }
                KeyCode::Char(ch @ '1'..='9') => {
                    let focused = session.focused();
                    session.select(focused, ch as usize - '1' as usize);
                }
                _ => {}
            }
        }
    }
}

fn handle_bookmarks_key<S: KeyValueStore>(app: &mut App<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') => app.go_to_sections(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev_bookmark(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_bookmark(),
        KeyCode::Char('m') | KeyCode::Char('x') | KeyCode::Delete => {
            app.toggle_selected_bookmark()
        }
        _ => {}
    }
}

fn handle_confirm_key<S: KeyValueStore>(app: &mut App<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('s') => app.reset_progress(),
        KeyCode::Char('n') | KeyCode::Esc => app.cancel_reset(),
        _ => {}
    }
}

fn hints_for(screen: AppScreen) -> &'static [&'static str] {
    match screen {
        AppScreen::Sections | AppScreen::ConfirmReset => &[
            "[Enter] Abrir",
            "[c] Completar",
            "[b] Guardadas",
            "[p] Repaso",
            "[r] Reiniciar",
            "[t] Tema",
            "[q] Salir",
        ],
        AppScreen::Section => &[
            "[Enter] Test",
            "[m] Marcador",
            "[c] Completar sección",
            "[Esc] Volver",
        ],
        AppScreen::Quiz => &[
            "[↑↓] Pregunta",
            "[←→/1-4] Opción",
            "[0] Borrar",
            "[Enter] Verificar",
            "[r] Reiniciar quiz",
            "[Esc] Cerrar",
        ],
        AppScreen::Bookmarks => &["[↑↓] Mover", "[m] Quitar marcador", "[Esc] Volver"],
    }
}

fn render<S: KeyValueStore>(frame: &mut ratatui::Frame, app: &App<S>) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    let hints = pack_hint_lines(hints_for(app.screen), area.width as usize);
    let layout = AppLayout::new(area, hints.len() as u16);

    render_header(frame, app, layout.header);

    match app.background_screen() {
        AppScreen::Section => render_section(frame, app, layout.main),
        AppScreen::Bookmarks => render_bookmarks(frame, app, layout.main),
        _ => render_sections(frame, app, layout.main, layout.sidebar.is_none()),
    }

    if let Some(sidebar) = layout.sidebar {
        frame.render_widget(StatsSidebar::new(app.tracker.state(), &app.theme), sidebar);
    }

    match app.screen {
        AppScreen::Quiz => {
            if let Some(ref session) = app.quiz {
                let popup = centered_rect(80, 85, area);
                frame.render_widget(QuizView::new(session, &app.theme), popup);
            }
        }
        AppScreen::ConfirmReset => render_confirm_reset(frame, app),
        _ => {}
    }

    render_footer(frame, app, layout.footer, hints);
}

fn render_header<S: KeyValueStore>(frame: &mut ratatui::Frame, app: &App<S>, area: Rect) {
    let colors = &app.theme.colors;
    let state = app.tracker.state();
    let info = format!(
        " Progreso {}% | {}/{} secciones | {} revisadas | {} guardadas",
        state.progress(),
        state.completed_sections().len(),
        app.catalog.sections().len(),
        state.reviewed_cards(),
        state.bookmarked_cards().len(),
    );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " alquenos ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default().fg(colors.muted()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_sections<S: KeyValueStore>(
    frame: &mut ratatui::Frame,
    app: &App<S>,
    area: Rect,
    show_progress: bool,
) {
    let state = app.tracker.state();
    let list_area = if show_progress {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        frame.render_widget(ProgressBar::new("Progreso", state.progress(), &app.theme), split[0]);
        split[1]
    } else {
        area
    };
    let list = SectionList::new(
        app.catalog.sections(),
        state,
        app.section_selected,
        &app.theme,
    );
    frame.render_widget(list, list_area);
}

fn render_section<S: KeyValueStore>(frame: &mut ratatui::Frame, app: &App<S>, area: Rect) {
    let state = app.tracker.state();
    let section = app.current_section();
    let done = if state.is_completed(&section.id) {
        " ✓"
    } else {
        ""
    };
    let rows = section
        .cards
        .iter()
        .map(|card| CardRow::from_card(card, state))
        .collect();
    let list = CardList::new(
        &format!("{}{done}", section.title),
        rows,
        app.card_selected,
        &app.theme,
    );
    frame.render_widget(list, area);
}

fn render_bookmarks<S: KeyValueStore>(frame: &mut ratatui::Frame, app: &App<S>, area: Rect) {
    let entries = app.catalog.bookmarks(app.tracker.state());
    let rows = entries.iter().map(CardRow::from_bookmark).collect();
    let list = CardList::new("Tarjetas guardadas", rows, app.bookmark_selected, &app.theme)
        .empty_message("Guarda algunas tarjetas primero usando el marcador.");
    frame.render_widget(list, area);
}

fn render_confirm_reset<S: KeyValueStore>(frame: &mut ratatui::Frame, app: &App<S>) {
    let colors = &app.theme.colors;
    let popup = centered_rect(40, 20, frame.area());
    frame.render_widget(Clear, popup);
    let block = Block::bordered()
        .title(" Reiniciar progreso ")
        .border_style(Style::default().fg(colors.incorrect()))
        .style(Style::default().bg(colors.bg()));
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            " ¿Estás seguro de que quieres reiniciar todo tu progreso?",
            Style::default().fg(colors.fg()),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " [y] Sí   [n] No",
            Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
        )),
    ];
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
        popup,
    );
}

fn render_footer<S: KeyValueStore>(
    frame: &mut ratatui::Frame,
    app: &App<S>,
    area: Rect,
    hints: Vec<String>,
) {
    let colors = &app.theme.colors;
    let lines: Vec<Line> = match app.status {
        Some(ref status) => {
            let color = match status.kind {
                StatusKind::Info => colors.accent(),
                StatusKind::Success => colors.correct(),
                StatusKind::Error => colors.incorrect(),
            };
            vec![Line::from(Span::styled(
                format!(" {}", status.text),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))]
        }
        None => hints
            .into_iter()
            .map(|h| Line::from(Span::styled(h, Style::default().fg(colors.muted()))))
            .collect(),
    };
    frame.render_widget(Paragraph::new(lines), area);
}
