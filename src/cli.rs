use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use alquenos::config::Config;
use alquenos::curriculum::Catalog;
use alquenos::curriculum::practice::build_practice_quiz;
use alquenos::engine::grading::GradeReport;
use alquenos::engine::progress::TOTAL_SECTIONS;
use alquenos::error::StudyError;
use alquenos::session::quiz::{QuizSession, submit_quiz};
use alquenos::session::tracker::ProgressTracker;
use alquenos::store::json_store::{read_export, write_export};
use alquenos::store::kv::KeyValueStore;

use crate::app::QUIZ_UNAVAILABLE;

#[derive(Parser)]
#[command(name = "alquenos", version, about = "Interactive study companion for alkenes")]
pub struct Cli {
    #[arg(short, long, help = "Theme name")]
    pub theme: Option<String>,

    #[arg(short, long, help = "Directory holding saved progress")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show progress, completed sections and counters
    Status,
    /// Toggle completion of a section
    Complete { section: String },
    /// Record a visit to a section
    Visit { section: String },
    /// Toggle a bookmark on a card
    Bookmark { card: String },
    /// List bookmarked cards
    Bookmarks,
    /// Show a quiz, or grade it when answers are given
    Quiz {
        id: String,
        /// Answer as QUESTION=OPTION, both counted from 1
        #[arg(short, long = "answer", value_parser = parse_answer)]
        answers: Vec<(usize, usize)>,
    },
    /// Build a review quiz from bookmarks and completed sections
    Practice {
        /// Seed for a reproducible question order
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long = "answer", value_parser = parse_answer)]
        answers: Vec<(usize, usize)>,
    },
    /// Clear all progress
    Reset {
        #[arg(long, help = "Confirm the reset")]
        yes: bool,
    },
    /// Write progress to a JSON file
    Export { path: PathBuf },
    /// Replace progress with a previously exported file
    Import { path: PathBuf },
}

/// Parse `Q=O` (1-based) into zero-based `(question, option)`.
pub fn parse_answer(raw: &str) -> Result<(usize, usize), String> {
    let (q, o) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION=OPTION, got '{raw}'"))?;
    let parse = |s: &str| -> Result<usize, String> {
        match s.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(format!("'{s}' is not a number starting at 1")),
        }
    };
    Ok((parse(q)?, parse(o)?))
}

pub fn run_command<S: KeyValueStore, W: Write>(
    command: Command,
    catalog: &Catalog,
    tracker: &mut ProgressTracker<S>,
    config: &Config,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Status => print_status(catalog, tracker, out)?,
        Command::Complete { section } => {
            let done = tracker.toggle_section_complete(&section)?;
            let verb = if done { "completada" } else { "pendiente" };
            writeln!(out, "{section}: {verb} ({}%)", tracker.state().progress())?;
        }
        Command::Visit { section } => {
            if tracker.mark_section_visited(&section)? {
                writeln!(out, "{section}: +1 tarjeta revisada")?;
            } else {
                writeln!(out, "{section}: sin cambios")?;
            }
        }
        Command::Bookmark { card } => {
            if catalog.card(&card).is_none() {
                log::warn!("bookmarking '{card}', which is not in the curriculum");
            }
            let saved = tracker.toggle_bookmark(&card)?;
            let verb = if saved { "guardada" } else { "eliminada" };
            writeln!(out, "{card}: {verb}")?;
        }
        Command::Bookmarks => print_bookmarks(catalog, tracker, out)?,
        Command::Quiz { id, answers } => match QuizSession::open(catalog, &id) {
            Ok(session) => run_quiz(session, &answers, tracker, out)?,
            Err(StudyError::QuizNotFound(_)) => writeln!(out, "{QUIZ_UNAVAILABLE}")?,
            Err(err) => return Err(err.into()),
        },
        Command::Practice { seed, answers } => {
            let mut rng = match seed {
                Some(seed) => SmallRng::seed_from_u64(seed),
                None => SmallRng::from_entropy(),
            };
            let quiz = build_practice_quiz(
                catalog,
                tracker.state(),
                &mut rng,
                config.practice_questions,
            );
            match quiz {
                Some(quiz) => run_quiz(QuizSession::from_quiz(quiz), &answers, tracker, out)?,
                None => writeln!(out, "{QUIZ_UNAVAILABLE}")?,
            }
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("refusing to reset progress without --yes");
            }
            tracker.reset()?;
            writeln!(out, "¡Reiniciado!")?;
        }
        Command::Export { path } => {
            write_export(&path, &tracker.export())?;
            writeln!(out, "Progreso exportado a {}", path.display())?;
        }
        Command::Import { path } => {
            let data = read_export(&path)?;
            tracker.import(&data)?;
            writeln!(out, "Progreso importado ({}%)", tracker.state().progress())?;
        }
    }
    Ok(())
}

fn print_status<S: KeyValueStore, W: Write>(
    catalog: &Catalog,
    tracker: &ProgressTracker<S>,
    out: &mut W,
) -> Result<()> {
    let state = tracker.state();
    writeln!(out, "Progreso: {}%", state.progress())?;
    writeln!(
        out,
        "Secciones completadas: {}/{TOTAL_SECTIONS}",
        state.completed_sections().len()
    )?;
    for (i, section) in catalog.sections().iter().enumerate() {
        let mark = if state.is_completed(&section.id) { "x" } else { " " };
        writeln!(out, "  [{mark}] {}. {} ({})", i + 1, section.title, section.id)?;
    }
    writeln!(out, "Tarjetas revisadas: {}", state.reviewed_cards())?;
    writeln!(out, "Tarjetas guardadas: {}", state.bookmarked_cards().len())?;
    Ok(())
}

fn print_bookmarks<S: KeyValueStore, W: Write>(
    catalog: &Catalog,
    tracker: &ProgressTracker<S>,
    out: &mut W,
) -> Result<()> {
    let entries = catalog.bookmarks(tracker.state());
    if entries.is_empty() {
        writeln!(out, "Guarda algunas tarjetas primero usando el marcador.")?;
        return Ok(());
    }
    writeln!(out, "Tienes {} tarjetas guardadas para estudio.", entries.len())?;
    for entry in entries {
        match entry.card {
            Some((section, card)) => {
                writeln!(out, "  {} {} ({})", card.id, card.title, section.title)?
            }
            None => writeln!(out, "  {} (tarjeta no encontrada)", entry.card_id)?,
        }
    }
    Ok(())
}

fn run_quiz<S: KeyValueStore, W: Write>(
    mut session: QuizSession,
    answers: &[(usize, usize)],
    tracker: &mut ProgressTracker<S>,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "{}", session.quiz().title)?;
    if answers.is_empty() {
        for (idx, question) in session.quiz().questions.iter().enumerate() {
            writeln!(out, "{}. {}", idx + 1, question.prompt)?;
            for (opt, option) in question.options.iter().enumerate() {
                writeln!(out, "   {}) {option}", opt + 1)?;
            }
        }
        writeln!(out, "Responde con -a PREGUNTA=OPCIÓN")?;
        return Ok(());
    }

    for &(question, option) in answers {
        if !session.select(question, option) {
            bail!(
                "answer {}={} does not match a question and option of this quiz",
                question + 1,
                option + 1
            );
        }
    }
    if let Some(report) = submit_quiz(&mut session, tracker)? {
        print_report(&report, out)?;
    }
    Ok(())
}

fn print_report<W: Write>(report: &GradeReport, out: &mut W) -> Result<()> {
    for (idx, outcome) in report.per_question.iter().enumerate() {
        let verdict = match (outcome.answered, outcome.correct) {
            (false, _) => "sin responder",
            (true, true) => "correcta",
            (true, false) => "incorrecta",
        };
        writeln!(out, "{}. {verdict}: {}", idx + 1, outcome.explanation)?;
    }
    let verdict = if report.is_perfect() {
        "¡Excelente! 🎯"
    } else {
        "¡Sigue practicando! 📚"
    };
    writeln!(out, "Resultado: {}/{}  {verdict}", report.score, report.total())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alquenos::store::kv::MemoryStore;

    fn run(command: Command, tracker: &mut ProgressTracker<MemoryStore>) -> Result<String> {
        let catalog = Catalog::bundled().unwrap();
        let mut out = Vec::new();
        run_command(command, &catalog, tracker, &Config::default(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["alquenos", "quiz", "1.1", "-a", "1=2", "-a", "2=1"]).unwrap();
        match cli.command {
            Some(Command::Quiz { id, answers }) => {
                assert_eq!(id, "1.1");
                assert_eq!(answers, vec![(0, 1), (1, 0)]);
            }
            other => panic!("unexpected command {other:?}"),
        }
        let cli = Cli::try_parse_from(["alquenos"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_answer_rejects_bad_input() {
        assert_eq!(parse_answer("3=4"), Ok((2, 3)));
        assert!(parse_answer("3").is_err());
        assert!(parse_answer("0=1").is_err());
        assert!(parse_answer("a=1").is_err());
    }

    #[test]
    fn test_quiz_grading_output() {
        let mut tracker = ProgressTracker::open(MemoryStore::new());
        let out = run(
            Command::Quiz {
                id: "1.1".to_string(),
                answers: vec![(0, 1), (1, 0)],
            },
            &mut tracker,
        )
        .unwrap();
        assert!(out.contains("Resultado: 1/2"));
        assert!(out.contains("1. correcta"));
        assert!(out.contains("2. incorrecta"));
        assert_eq!(tracker.state().reviewed_cards(), 0);
    }

    #[test]
    fn test_perfect_quiz_counts() {
        let mut tracker = ProgressTracker::open(MemoryStore::new());
        run(
            Command::Quiz {
                id: "1.3".to_string(),
                answers: vec![(0, 2)],
            },
            &mut tracker,
        )
        .unwrap();
        assert_eq!(tracker.state().reviewed_cards(), 1);
    }

    #[test]
    fn test_unknown_quiz_is_informational() {
        let mut tracker = ProgressTracker::open(MemoryStore::new());
        let out = run(
            Command::Quiz {
                id: "9.9".to_string(),
                answers: vec![],
            },
            &mut tracker,
        )
        .unwrap();
        assert_eq!(out.trim(), QUIZ_UNAVAILABLE);
    }

    #[test]
    fn test_quiz_without_answers_lists_options() {
        let mut tracker = ProgressTracker::open(MemoryStore::new());
        let out = run(
            Command::Quiz {
                id: "1.3".to_string(),
                answers: vec![],
            },
            &mut tracker,
        )
        .unwrap();
        assert!(out.contains("3) Al carbono con más hidrógenos"));
    }

    #[test]
    fn test_out_of_range_answer_errors() {
        let mut tracker = ProgressTracker::open(MemoryStore::new());
        let err = run(
            Command::Quiz {
                id: "1.3".to_string(),
                answers: vec![(4, 0)],
            },
            &mut tracker,
        )
        .unwrap_err();
        assert!(err.to_string().contains("5=1"));
    }

    #[test]
    fn test_reset_needs_confirmation() {
        let mut tracker = ProgressTracker::open(MemoryStore::new());
        run(Command::Complete { section: "fundamentos".into() }, &mut tracker).unwrap();
        assert!(run(Command::Reset { yes: false }, &mut tracker).is_err());
        assert_eq!(tracker.state().progress(), 17);
        run(Command::Reset { yes: true }, &mut tracker).unwrap();
        assert!(tracker.state().is_empty());
    }

    #[test]
    fn test_status_and_bookmarks_output() {
        let mut tracker = ProgressTracker::open(MemoryStore::new());
        run(Command::Complete { section: "reacciones".into() }, &mut tracker).unwrap();
        run(Command::Bookmark { card: "4.3".into() }, &mut tracker).unwrap();
        let status = run(Command::Status, &mut tracker).unwrap();
        assert!(status.contains("Progreso: 17%"));
        assert!(status.contains("[x] 4. Reacciones"));
        let bookmarks = run(Command::Bookmarks, &mut tracker).unwrap();
        assert!(bookmarks.contains("4.3 Halogenación (Reacciones)"));
    }

    #[test]
    fn test_unknown_section_errors() {
        let mut tracker = ProgressTracker::open(MemoryStore::new());
        let err = run(Command::Complete { section: "alcanos".into() }, &mut tracker).unwrap_err();
        assert!(err.to_string().contains("unknown section"));
    }
}
