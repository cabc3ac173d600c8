use std::io::BufRead;
use std::path::Path;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::warn;

use exam_simulator::config::{Config, QuestionSource};
use exam_simulator::error::AppError;
use exam_simulator::models::{load_catalog_overrides, ScoreBand, TestCatalog, TestMode, TestResult, TestType};
use exam_simulator::orchestrator::App;
use exam_simulator::services::{
    FileAccessGate, FixtureGenerator, Generator, HistoryStore, JsonFileHistory, LlmService,
    MemoryHistory,
};
use exam_simulator::session::{
    format_countdown, format_elapsed, SessionCommand, SessionOutcome, SessionPresenter, TestSession,
    TimeBand,
};
use exam_simulator::utils::logging;

const USAGE: &str = "\
Uso:
  exam-sim <PAA|OTIS> <simulacro|practica>   iniciar una prueba
  exam-sim history                           ver historial
  exam-sim clear-history                     borrar historial
  exam-sim grant-access                      activar acceso premium

Durante la prueba:
  a-e    elegir opción      n / >   siguiente     p / <   anterior
  <num>  ir a la pregunta   f       terminar      q       abandonar";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [command] if command == "history" => show_history(&config),
        [command] if command == "clear-history" => {
            open_history(&config).clear_all()?;
            println!("Historial eliminado.");
            Ok(())
        }
        [command] if command == "grant-access" => {
            FileAccessGate::open(&config.access_file).grant()?;
            println!("Acceso premium activado.");
            Ok(())
        }
        [test_type, test_mode] => {
            let test_type: TestType = test_type.parse()?;
            let test_mode: TestMode = test_mode.parse()?;
            run_exam(config, test_type, test_mode).await
        }
        _ => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

async fn run_exam(config: Config, test_type: TestType, test_mode: TestMode) -> Result<()> {
    let generator = build_generator(&config).await?;
    logging::log_startup(test_type, test_mode, &generator.describe());

    let catalog = load_catalog(&config).await?;
    let history = open_history(&config);
    let access = FileAccessGate::open(&config.access_file);
    let mut app = App::new(&config, catalog, generator, history, access);

    println!("Generando preguntas de {} ({})...", test_type, test_mode);
    let session = tokio::select! {
        result = app.start_test(test_type, test_mode) => match result {
            Ok(session) => session,
            Err(AppError::AccessDenied { .. }) => {
                println!("El modo simulacro requiere acceso premium (exam-sim grant-access).");
                return Ok(());
            }
            Err(e) if e.is_retryable() => {
                println!("No se pudieron generar las preguntas: {}. Inténtalo de nuevo.", e);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("⚠️ 已取消出题");
            return Ok(());
        }
    };

    println!("{}", USAGE.lines().skip(6).collect::<Vec<_>>().join("\n"));

    let (tx, mut commands) = mpsc::channel(16);
    spawn_stdin_reader(tx);

    let mut presenter = TerminalPresenter;
    match app.run_session(session, &mut commands, &mut presenter).await? {
        SessionOutcome::Finished(_) => {}
        SessionOutcome::Abandoned => println!("Prueba abandonada."),
    }

    Ok(())
}

async fn build_generator(config: &Config) -> Result<Generator> {
    Ok(match config.question_source {
        QuestionSource::Llm => Generator::Llm(LlmService::new(config)),
        QuestionSource::Fixture => {
            Generator::Fixture(FixtureGenerator::load(Path::new(&config.fixture_file)).await?)
        }
    })
}

async fn load_catalog(config: &Config) -> Result<TestCatalog> {
    let catalog = TestCatalog::builtin();
    match &config.test_catalog_file {
        Some(path) => {
            let overrides = load_catalog_overrides(Path::new(path)).await?;
            Ok(catalog.with_overrides(overrides)?)
        }
        None => Ok(catalog),
    }
}

fn open_history(config: &Config) -> Box<dyn HistoryStore + Send> {
    match &config.history_file {
        Some(path) => Box::new(JsonFileHistory::open(path.as_str())),
        None => Box::new(MemoryHistory::new()),
    }
}

fn show_history(config: &Config) -> Result<()> {
    let history = open_history(config);
    if history.list_all().is_empty() {
        println!("No hay pruebas registradas.");
        return Ok(());
    }
    for result in history.list_all() {
        println!(
            "{}  {:<4} {:<10} {:>6}  {}/{}  {}",
            result.date.format("%Y-%m-%d %H:%M"),
            result.test_type,
            result.test_mode,
            result.score_label(),
            result.correct_answers,
            result.total_questions,
            format_elapsed(result.time_taken)
        );
    }
    Ok(())
}

/// 标准输入读取放在独立线程，程序退出时不用等待它
fn spawn_stdin_reader(tx: mpsc::Sender<SessionCommand>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let Some(command) = parse_command(&line) else {
                println!("Comando no reconocido: {}", line.trim());
                continue;
            };
            let stop = matches!(command, SessionCommand::Finish | SessionCommand::Abandon);
            if tx.blocking_send(command).is_err() || stop {
                break;
            }
        }
    });
}

fn parse_command(line: &str) -> Option<SessionCommand> {
    let input = line.trim().to_lowercase();
    match input.as_str() {
        "n" | ">" => Some(SessionCommand::Next),
        "p" | "<" => Some(SessionCommand::Previous),
        "f" => Some(SessionCommand::Finish),
        "q" => Some(SessionCommand::Abandon),
        "a" | "b" | "c" | "d" | "e" => Some(SessionCommand::Select {
            option_id: input.to_uppercase(),
        }),
        other => other
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(|n| SessionCommand::GoTo(n - 1)),
    }
}

struct TerminalPresenter;

impl SessionPresenter for TerminalPresenter {
    fn show_question(&mut self, session: &TestSession) {
        let Some(question) = session.current_question() else {
            return;
        };
        let index = session.current_index();
        let chosen = session.answer_for(index);

        println!("\n{}", "─".repeat(60));
        println!(
            "Pregunta {}/{} · {} ({:.0}%)",
            index + 1,
            session.questions().len(),
            question.section,
            session.progress()
        );
        println!("{}\n", question.text);
        for option in &question.options {
            let marker = if chosen == Some(option.id.as_str()) { "●" } else { "○" };
            println!("  {} {}) {}", marker, option.id, option.text);
        }
    }

    fn show_countdown(&mut self, remaining_secs: u64) {
        let band = TimeBand::for_remaining(remaining_secs);
        let announce = match band {
            TimeBand::Green => remaining_secs % 300 == 0,
            TimeBand::Yellow => remaining_secs % 60 == 0,
            TimeBand::Red => remaining_secs % 10 == 0,
        };
        if announce {
            println!("⏱ Tiempo restante: {}", format_countdown(remaining_secs));
        }
    }

    fn show_elapsed(&mut self, elapsed_secs: u64) {
        if elapsed_secs % 300 == 0 {
            println!("⏱ Tiempo transcurrido: {}", format_elapsed(elapsed_secs));
        }
    }

    fn show_explanation(&mut self, session: &TestSession, question_index: usize) {
        let Some(question) = session.questions().get(question_index) else {
            return;
        };
        let verdict = if question.is_correct(session.answer_for(question_index)) {
            "✔ Correcto"
        } else {
            "✘ Incorrecto"
        };
        println!(
            "{} · Respuesta: {}\n{}",
            verdict, question.correct_answer_id, question.explanation
        );
    }

    fn show_time_up(&mut self) {
        println!("\n⏰ ¡Se acabó el tiempo!");
    }

    fn show_result(&mut self, result: &TestResult) {
        let band = match result.score_band() {
            ScoreBand::Good => "¡Excelente!",
            ScoreBand::Fair => "Bien, sigue practicando",
            ScoreBand::Poor => "Necesitas más práctica",
        };
        println!("\n{}", "=".repeat(60));
        println!("Resultado: {}  {}", result.score_label(), band);
        println!(
            "Correctas: {}  Incorrectas: {}  Tiempo: {}",
            result.correct_answers,
            result.incorrect_answers,
            format_elapsed(result.time_taken)
        );
        println!("{}", "=".repeat(60));

        for (index, item) in result.review().iter().enumerate() {
            let mark = if item.is_correct { "✔" } else { "✘" };
            println!(
                "{} {:>2}. {} (tu respuesta: {}, correcta: {})",
                mark,
                index + 1,
                logging::truncate_text(&item.question.text, 60),
                item.chosen.unwrap_or("-"),
                item.question.correct_answer_id
            );
        }
    }
}
