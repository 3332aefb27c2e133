//! Colorful console output for solver events.
//!
//! Provides a custom `tracing` layer that formats the structured events of
//! `seqforge-solver` with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Lifecycle events (solve start/end, first complete solution,
//!   restarts)
//! - **DEBUG**: Phase switches, reheats, cooling, new best solutions and
//!   progress (1/sec with speed and value)
//! - **TRACE**: Individual committed moves

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();
static SOLVE_START_NANOS: AtomicU64 = AtomicU64::new(0);

/// Package version for banner display.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "seqforge_solver=info";

/// Initializes the solver console output.
///
/// Safe to call multiple times - only the first call has effect.
/// Prints the SeqForge banner and sets up tracing. `RUST_LOG` overrides the
/// default `seqforge_solver=info` filter.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(SolverConsoleLayer)
            .try_init();
    });
}

// Marks the start of solving for elapsed time tracking.
fn mark_solve_start() {
    let epoch = EPOCH.get_or_init(Instant::now);
    let nanos = epoch.elapsed().as_nanos() as u64;
    SOLVE_START_NANOS.store(nanos, Ordering::Relaxed);
}

// Returns elapsed time since solve start.
fn elapsed_secs() -> f64 {
    let Some(epoch) = EPOCH.get() else {
        return 0.0;
    };
    let start_nanos = SOLVE_START_NANOS.load(Ordering::Relaxed);
    let now_nanos = epoch.elapsed().as_nanos() as u64;
    now_nanos.saturating_sub(start_nanos) as f64 / 1_000_000_000.0
}

fn print_banner() {
    let banner = r#"
 ____             _____
/ ___|  ___  __ _|  ___|__  _ __ __ _  ___
\___ \ / _ \/ _` | |_ / _ \| '__/ _` |/ _ \
 ___) |  __/ (_| |  _| (_) | | | (_| |  __/
|____/ \___|\__, |_|  \___/|_|  \__, |\___|
               |_|              |___/
"#;

    let version_line = format!(
        "              v{} - Adaptive Timetabling Search\n",
        VERSION
    );

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats solver events with colors.
pub struct SolverConsoleLayer;

impl<S: Subscriber> Layer<S> for SolverConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("seqforge_solver") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    strategy: Option<String>,
    from: Option<String>,
    to: Option<String>,
    state: Option<String>,
    error: Option<String>,
    iteration: Option<u64>,
    iterations: Option<u64>,
    variables: Option<u64>,
    unassigned: Option<u64>,
    restarts: Option<u64>,
    idle: Option<u64>,
    speed: Option<u64>,
    best_iteration: Option<i64>,
    total_value: Option<f64>,
    best_value: Option<f64>,
    value: Option<f64>,
    time: Option<f64>,
    bound: Option<f64>,
    temperature: Option<f64>,
}

impl EventVisitor {
    fn set_text(&mut self, name: &str, value: String) {
        match name {
            "event" => self.event = Some(value),
            "strategy" => self.strategy = Some(value),
            "from" => self.from = Some(value),
            "to" => self.to = Some(value),
            "state" => self.state = Some(value),
            "error" => self.error = Some(value),
            _ => {}
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.set_text(field.name(), s.trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set_text(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "iteration" => self.iteration = Some(value),
            "iterations" => self.iterations = Some(value),
            "variables" => self.variables = Some(value),
            "unassigned" => self.unassigned = Some(value),
            "restarts" => self.restarts = Some(value),
            "idle" => self.idle = Some(value),
            "speed" => self.speed = Some(value),
            "best_iteration" => self.best_iteration = Some(value as i64),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if field.name() == "best_iteration" {
            self.best_iteration = Some(value);
        } else if value >= 0 {
            self.record_u64(field, value as u64);
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        match field.name() {
            "total_value" => self.total_value = Some(value),
            "best_value" => self.best_value = Some(value),
            "value" => self.value = Some(value),
            "time" => self.time = Some(value),
            "bound" => self.bound = Some(value),
            "temperature" => self.temperature = Some(value),
            _ => {}
        }
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    let event = v.event.as_deref().unwrap_or("");

    match event {
        "solve_start" => format_solve_start(v),
        "solve_end" => format_solve_end(v),
        "solve_failed" => format_solve_failed(v),
        "nothing_to_solve" => format!(
            "{} {} Nothing to solve",
            format_elapsed(),
            "■".bright_yellow().bold()
        ),
        "phase_switch" => format_phase_switch(v),
        "complete_solution" => format_complete_solution(v),
        "best_saved" => format_best_saved(v),
        "reheat" | "cool" => format_schedule(v, event),
        "restart" => format_restart(v),
        "progress" => format_progress(v),
        "step" => format_step(v, level),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn format_count(count: u64) -> String {
    count.to_formatted_string(&Locale::en)
}

fn format_solve_start(v: &EventVisitor) -> String {
    mark_solve_start();
    let variables = v.variables.unwrap_or(0);
    let unassigned = v.unassigned.unwrap_or(0);
    let strategy = v.strategy.as_deref().unwrap_or("unknown");

    let mut output = format!(
        "{} {} Solving │ {} variables │ {} unassigned │ {}",
        format_elapsed(),
        "▶".bright_green().bold(),
        format_count(variables).bright_yellow(),
        format_count(unassigned).bright_yellow(),
        strategy.bright_magenta()
    );
    if let Some(value) = v.total_value {
        output.push_str(&format!(" │ value {}", format_value(value)));
    }
    output
}

fn format_solve_end(v: &EventVisitor) -> String {
    let state = v.state.as_deref().unwrap_or("UNKNOWN");
    let iterations = v.iterations.unwrap_or(0);
    let best = v.best_value.map_or_else(|| "N/A".to_string(), format_plain);
    let best_iteration = match v.best_iteration {
        Some(iteration) if iteration >= 0 => format_count(iteration as u64),
        _ => "none".to_string(),
    };

    let mut output = format!(
        "{} {} Solving ended │ {} │ {} iterations │ best {}",
        format_elapsed(),
        "■".bright_cyan().bold(),
        format_state(state),
        format_count(iterations).white(),
        best.bright_green()
    );

    // Summary box
    let rule = "══════════════════════════════════════════════════════════";
    output.push_str("\n\n");
    output.push_str(&format!("╔{}╗", rule).bright_cyan().to_string());
    output.push('\n');
    for (label, value) in [
        ("State:", state.to_string()),
        ("Best Value:", best),
        ("Best Iteration:", best_iteration),
        ("Time:", format_seconds(v.time.unwrap_or(0.0))),
    ] {
        output.push_str(&format!(
            "{}  {:<18}{:>36}  {}",
            "║".bright_cyan(),
            label,
            value,
            "║".bright_cyan()
        ));
        output.push('\n');
    }
    output.push_str(&format!("╚{}╝", rule).bright_cyan().to_string());
    output.push('\n');

    output
}

fn format_solve_failed(v: &EventVisitor) -> String {
    format!(
        "{} {} Solving failed │ {}",
        format_elapsed(),
        "✗".bright_red().bold(),
        v.error.as_deref().unwrap_or("unknown error").bright_red()
    )
}

fn format_phase_switch(v: &EventVisitor) -> String {
    let from = v.from.as_deref().unwrap_or("?");
    let to = v.to.as_deref().unwrap_or("?");

    let mut output = format!(
        "{} {} {} → {}",
        format_elapsed(),
        "▸".bright_blue(),
        from.white(),
        to.white().bold()
    );
    if let Some(iteration) = v.iteration {
        output.push_str(&format!(" │ iteration {}", format_count(iteration)));
    }
    if let Some(value) = v.total_value {
        output.push_str(&format!(" │ value {}", format_value(value)));
    }
    if let Some(unassigned) = v.unassigned.filter(|u| *u > 0) {
        output.push_str(&format!(
            " │ {} unassigned",
            format_count(unassigned).bright_red()
        ));
    }
    output
}

fn format_complete_solution(v: &EventVisitor) -> String {
    format!(
        "{} {} Complete solution │ iteration {} │ value {}",
        format_elapsed(),
        "★".bright_green().bold(),
        format_count(v.iteration.unwrap_or(0)),
        format_value(v.total_value.unwrap_or(0.0))
    )
}

fn format_best_saved(v: &EventVisitor) -> String {
    let mut output = format!(
        "{} {} New best │ iteration {} │ value {}",
        format_elapsed(),
        "↓".bright_green(),
        format_count(v.iteration.unwrap_or(0)),
        format_value(v.total_value.unwrap_or(0.0))
    );
    if let Some(unassigned) = v.unassigned.filter(|u| *u > 0) {
        output.push_str(&format!(
            " │ {} unassigned",
            format_count(unassigned).bright_red()
        ));
    }
    output
}

fn format_schedule(v: &EventVisitor, event: &str) -> String {
    let strategy = v.strategy.as_deref().unwrap_or("");
    let icon = if event == "reheat" {
        "♨".bright_red().to_string()
    } else {
        "❄".bright_blue().to_string()
    };

    let mut output = format!(
        "{} {} {} {}",
        format_elapsed(),
        icon,
        strategy.white(),
        event.bold()
    );
    if let Some(bound) = v.bound {
        output.push_str(&format!(" │ bound {}", format_plain(bound).bright_yellow()));
    }
    if let Some(temperature) = v.temperature {
        output.push_str(&format!(
            " │ temperature {}",
            format!("{:.6}", temperature).bright_yellow()
        ));
    }
    if let Some(idle) = v.idle {
        output.push_str(&format!(" │ idle {}", idle));
    }
    if let Some(iteration) = v.iteration {
        output.push_str(&format!(" │ iteration {}", format_count(iteration)));
    }
    output
}

fn format_restart(v: &EventVisitor) -> String {
    format!(
        "{} {} Restart #{} │ iteration {}",
        format_elapsed(),
        "↻".bright_yellow().bold(),
        v.restarts.unwrap_or(0),
        format_count(v.iteration.unwrap_or(0))
    )
}

fn format_progress(v: &EventVisitor) -> String {
    let iterations = v.iterations.unwrap_or(0);
    let speed = v.speed.unwrap_or(0);

    let mut output = format!(
        "{} {} {:>10} iterations │ {:>12}/s │ value {} │ best {}",
        format_elapsed(),
        "⚡".bright_cyan(),
        format_count(iterations).white(),
        format_count(speed).bright_magenta().bold(),
        format_value(v.total_value.unwrap_or(0.0)),
        format_value(v.best_value.unwrap_or(0.0))
    );
    if let Some(unassigned) = v.unassigned.filter(|u| *u > 0) {
        output.push_str(&format!(
            " │ {} unassigned",
            format_count(unassigned).bright_red()
        ));
    }
    output
}

fn format_step(v: &EventVisitor, level: Level) -> String {
    if level != Level::TRACE {
        return String::new();
    }

    let iteration = v.iteration.unwrap_or(0);
    let value = v.value.unwrap_or(0.0);
    let icon = if value <= 0.0 {
        "✓".bright_green().to_string()
    } else {
        "↑".bright_red().to_string()
    };

    format!(
        "{} {} Iteration {:>10} │ Δ {}",
        format_elapsed(),
        icon,
        format_count(iteration).bright_black(),
        format_plain(value).bright_black()
    )
}

fn format_state(state: &str) -> String {
    match state {
        "DONE" => state.bright_green().bold().to_string(),
        "STOPPED" => state.bright_yellow().bold().to_string(),
        "FAILED" => state.bright_red().bold().to_string(),
        _ => state.white().bold().to_string(),
    }
}

fn format_plain(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.3}", value)
    }
}

fn format_value(value: f64) -> String {
    let text = format_plain(value);
    if value == 0.0 {
        text.bright_green().to_string()
    } else {
        text.white().to_string()
    }
}

fn format_seconds(secs: f64) -> String {
    if secs < 1.0 {
        format!("{}ms", (secs * 1000.0).round() as u64)
    } else if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        let whole = secs as u64;
        format!("{}m {}s", whole / 60, whole % 60)
    }
}
