//! The `queryeval annotate` command.
//!
//! A line-oriented annotation loop: each stdin line is one command, the
//! session clock ticks in the background, and submits go through the
//! configured sink.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tokio::io::{AsyncBufReadExt, BufReader};

use queryeval_core::clock::format_elapsed;
use queryeval_core::criteria::{parse_answer, Criterion};
use queryeval_core::engine::SessionDriver;
use queryeval_core::error::SubmitError;
use queryeval_core::model::TaskStatus;
use queryeval_core::parser::{validate_catalog, TomlTaskSource};
use queryeval_core::report::SessionReport;
use queryeval_core::session::{Notice, Session, SessionSnapshot};
use queryeval_core::statistics::{format_average, SessionStats};
use queryeval_core::traits::{SessionObserver, TaskSource};
use queryeval_sinks::{create_sink, load_config_from};

pub struct AnnotateArgs {
    pub catalog: PathBuf,
    pub config: Option<PathBuf>,
    pub annotator: Option<String>,
    pub latency_ms: Option<u64>,
    pub auto_advance_ms: Option<u64>,
    pub output: Option<PathBuf>,
    pub no_save: bool,
}

/// Console observer for submit progress.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_state_change(&self, snapshot: &SessionSnapshot<'_>) {
        if snapshot.is_submitting {
            println!("Submitting task {}...", snapshot.index + 1);
        }
    }

    fn on_submit_succeeded(&self, index: usize, status: &TaskStatus) {
        println!(
            "{} ({}s on task)",
            Notice::Submitted { index },
            status.time_spent_secs
        );
    }

    fn on_submit_failed(&self, _index: usize, error: &SubmitError) {
        println!("{} ({error})", error.user_notice());
    }

    fn on_auto_advance(&self, _from: usize, to: usize) {
        println!("Moving to task {}.", to + 1);
    }
}

/// One parsed line of annotator input.
#[derive(Debug, Clone, PartialEq)]
enum Input {
    Show,
    Next,
    Previous,
    /// Zero-based target.
    Goto(usize),
    Skip,
    Set(Criterion, bool),
    Clear(Criterion),
    Comment(String),
    Submit,
    Pause,
    Resume,
    Time,
    Stats,
    Help,
    Quit,
}

/// Parse a command line. Blank lines yield `Ok(None)`.
fn parse_input(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word.to_lowercase().as_str() {
        "show" => Input::Show,
        "next" | "n" => Input::Next,
        "prev" | "p" => Input::Previous,
        "goto" | "g" => {
            let n: usize = rest
                .parse()
                .map_err(|_| format!("goto needs a task number, got: '{rest}'"))?;
            let index = n.checked_sub(1).ok_or("task numbers start at 1")?;
            Input::Goto(index)
        }
        "skip" => Input::Skip,
        "set" => {
            let (criterion, answer) = rest
                .split_once(char::is_whitespace)
                .ok_or("usage: set <criterion> <yes|no>")?;
            Input::Set(criterion.parse()?, parse_answer(answer)?)
        }
        "clear" => Input::Clear(rest.parse()?),
        "comment" => Input::Comment(rest.to_string()),
        "submit" => Input::Submit,
        "pause" => Input::Pause,
        "resume" => Input::Resume,
        "time" => Input::Time,
        "stats" => Input::Stats,
        "help" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        other => {
            // `<criterion> <answer>`, e.g. `3 y`
            let criterion: Criterion = other
                .parse()
                .map_err(|_| format!("unknown command: {other} (type `help`)"))?;
            if rest.is_empty() {
                return Err(format!("missing answer for {}", criterion.short_name()));
            }
            Input::Set(criterion, parse_answer(rest)?)
        }
    };
    Ok(Some(input))
}

pub async fn execute(args: AnnotateArgs) -> Result<()> {
    // Load config, flags win
    let mut config = load_config_from(args.config.as_deref())?;
    if let Some(ms) = args.latency_ms {
        config.set_latency_ms(ms);
    }
    if let Some(ms) = args.auto_advance_ms {
        config.auto_advance_delay_ms = ms;
    }
    if args.annotator.is_some() {
        config.annotator = args.annotator;
    }
    let output = args.output.unwrap_or_else(|| config.output_dir.clone());

    let catalog = TomlTaskSource::new(args.catalog.clone()).load().await?;
    for w in validate_catalog(&catalog) {
        tracing::warn!(task = w.task_id.as_deref().unwrap_or("-"), "{}", w.message);
    }
    let mut session = Session::new(catalog)
        .with_context(|| format!("cannot annotate {}", args.catalog.display()))?;

    let sink = create_sink(&config.sink);
    let driver = SessionDriver::new(sink, Arc::new(ConsoleObserver), config.driver_config());
    let _ticker = session.clock().spawn_ticker(config.tick_interval());

    println!(
        "queryeval v{} - {} ({} tasks) via {} sink",
        env!("CARGO_PKG_VERSION"),
        session.catalog().name,
        session.task_count(),
        driver.sink_name()
    );
    println!("Type `help` for commands.\n");
    render_task(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_input(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };
        if !apply(&driver, &mut session, input).await {
            break;
        }
    }

    session.clock().pause();
    print_summary(&session);

    if !args.no_save {
        std::fs::create_dir_all(&output)?;
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        let path = output.join(format!("session-{timestamp}.json"));
        SessionReport::from_session(&session, config.annotator.clone()).save_json(&path)?;
        eprintln!("Session saved to: {}", path.display());
    }

    Ok(())
}

/// Apply one command. Returns `false` when the annotator quits.
async fn apply(driver: &SessionDriver, session: &mut Session, input: Input) -> bool {
    match input {
        Input::Show => render_task(session),
        Input::Next => {
            if session.next() {
                render_task(session);
            } else {
                println!("Already at the last task.");
            }
        }
        Input::Previous => {
            if session.previous() {
                render_task(session);
            } else {
                println!("Already at the first task.");
            }
        }
        Input::Goto(index) => {
            if index >= session.task_count() {
                println!(
                    "No task {} (catalog has {} tasks).",
                    index + 1,
                    session.task_count()
                );
            } else if session.go_to(index) {
                render_task(session);
            } else {
                println!("Already on task {}.", index + 1);
            }
        }
        Input::Skip => {
            if session.jump_to_next_incomplete() {
                render_task(session);
            } else {
                println!("No pending tasks after this one.");
            }
        }
        Input::Set(criterion, value) => {
            session.answer(criterion, value);
            println!(
                "{}. {}: {}  ({}/{} answered)",
                criterion.ordinal(),
                criterion.short_name(),
                answer_label(criterion, Some(value)),
                session.form().answered_count(),
                Criterion::COUNT
            );
        }
        Input::Clear(criterion) => {
            session.clear_answer(criterion);
            println!(
                "Cleared {}  ({}/{} answered)",
                criterion.short_name(),
                session.form().answered_count(),
                Criterion::COUNT
            );
        }
        Input::Comment(text) => {
            let cleared = text.trim().is_empty();
            session.set_comments(text);
            println!("{}", if cleared { "Comment cleared." } else { "Comment saved." });
        }
        Input::Submit => {
            let before = session.current_index();
            match driver.submit(session).await {
                Ok(_) if session.current_index() != before => render_task(session),
                Ok(_) => {}
                Err(e) => println!("Cannot submit: {e}"),
            }
        }
        Input::Pause => {
            session.clock().pause();
            println!(
                "Timer paused at {}.",
                format_elapsed(session.clock().elapsed_secs())
            );
        }
        Input::Resume => {
            session.clock().resume();
            println!("Timer resumed.");
        }
        Input::Time => {
            let clock = session.clock();
            println!(
                "Session time: {} ({}){}",
                format_elapsed(clock.elapsed_secs()),
                clock.level(),
                if clock.is_running() { "" } else { " [paused]" }
            );
        }
        Input::Stats => print_stats(&session.stats(), session.clock().elapsed_secs()),
        Input::Help => print_help(),
        Input::Quit => return false,
    }
    true
}

fn answer_label(criterion: Criterion, answer: Option<bool>) -> String {
    match answer {
        Some(true) => format!("yes ({})", criterion.positive_label()),
        Some(false) => format!("no ({})", criterion.negative_label()),
        None => "-".to_string(),
    }
}

fn render_task(session: &Session) {
    let snap = session.snapshot();
    let task = snap.task;

    println!(
        "== Task {} of {} [{}] {} == {:.0}% of session complete",
        snap.index + 1,
        snap.total,
        task.id,
        snap.status.status,
        snap.completion_percent
    );
    println!("Query: {}", task.query);
    if let Some(context) = &task.context {
        println!("Context: {context}");
    }
    if let Some(date) = &task.reference_date {
        println!("Reference date: {date}");
    }
    if !task.interaction_history.is_empty() {
        println!("History:");
        for line in &task.interaction_history {
            println!("  {line}");
        }
    }

    println!(
        "Answers ({}/{}, {:.0}%):",
        snap.form.answered_count(),
        Criterion::COUNT,
        snap.form_progress_percent
    );
    for c in Criterion::ALL {
        println!(
            "  {}. {:<66} {}",
            c.ordinal(),
            c.question(),
            answer_label(c, snap.form.get(c))
        );
    }
    if !snap.form.comments().is_empty() {
        println!("Comment: {}", snap.form.comments());
    }

    let mut actions = Vec::new();
    if snap.can_previous {
        actions.push("prev");
    }
    if snap.can_next {
        actions.push("next");
    }
    if snap.can_submit {
        actions.push("submit");
    }
    println!(
        "Timer {}{} | available: {}",
        format_elapsed(snap.elapsed_secs),
        if snap.clock_running { "" } else { " [paused]" },
        actions.join(", ")
    );
}

pub(crate) fn print_stats(stats: &SessionStats, elapsed_secs: u64) {
    let mut table = Table::new();
    table.set_header(vec![
        "Completed",
        "Remaining",
        "In progress",
        "Progress",
        "Avg time",
        "Session time",
    ]);
    table.add_row(vec![
        Cell::new(format!("{}/{}", stats.completed, stats.total)),
        Cell::new(stats.remaining),
        Cell::new(stats.in_progress),
        Cell::new(format!("{:.1}%", stats.completion_percent)),
        Cell::new(format_average(stats.average_time_secs)),
        Cell::new(format_elapsed(elapsed_secs)),
    ]);
    println!("{table}");
}

fn print_summary(session: &Session) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Task", "Status", "Time", "Answered"]);

    for (i, record) in session.records().iter().enumerate() {
        let answered = record
            .response
            .as_ref()
            .map(|r| r.answered_count())
            .unwrap_or(0);
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&record.id),
            Cell::new(&record.status),
            Cell::new(format!("{}s", record.time_spent_secs)),
            Cell::new(format!("{answered}/{}", Criterion::COUNT)),
        ]);
    }

    println!("\n{table}");
    print_stats(&session.stats(), session.clock().elapsed_secs());
}

fn print_help() {
    println!(
        "\
Commands:
  show                     show the current task
  next | n, prev | p       move one task forward or back
  goto <N>                 jump to task N
  skip                     jump to the next pending task
  set <criterion> <y|n>    answer a criterion (also: `<1-6> <y|n>`)
  clear <criterion>        unset an answer
  comment <text>           set the comment (empty clears it)
  submit                   submit the current task
  pause, resume            stop or restart the session timer
  time                     show session time
  stats                    show session statistics
  quit | q                 end the session"
    );
}
