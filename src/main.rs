use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use logsieve_filter::{
    ConfigError, Context, FilterConfig, FilterSettings, FilteredLogger, JsonLinesSink, LogEvent,
    LogSink,
};
use logsieve_render::{Emphasis, Renderer};

/// Logsieve - Suppress noisy log entries before they reach the log store
#[derive(Parser, Debug)]
#[command(name = "logsieve")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a settings file (.toml or .json)
    Check {
        #[arg(value_name = "SETTINGS")]
        settings: PathBuf,
    },

    /// Filter JSON-lines events, writing passing events to stdout
    Filter {
        #[arg(value_name = "SETTINGS")]
        settings: PathBuf,

        /// Read events from a file instead of stdin
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Skip invalid patterns instead of refusing to start
        #[arg(long)]
        lenient: bool,

        /// Print pass/suppress counts to stderr when done
        #[arg(long)]
        stats: bool,
    },

    /// Render a message template the way patterns see it
    Render {
        template: String,

        /// Placeholder values as a JSON object
        #[arg(long, value_name = "JSON")]
        context: Option<String>,

        /// Wrap %placeholders in <em class="placeholder"> markup
        #[arg(long)]
        emphasis: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Diagnostics go to stderr; stdout carries the filtered events
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Check { settings } => check(&settings),
        Command::Filter {
            settings,
            input,
            lenient,
            stats,
        } => filter(&settings, input.as_deref(), lenient, stats),
        Command::Render {
            template,
            context,
            emphasis,
        } => render(&template, context.as_deref(), emphasis),
    }
}

fn check(path: &Path) -> Result<()> {
    let settings = FilterSettings::load(path)?;

    match settings.validate() {
        Ok(()) => {
            println!(
                "{}: ok ({}, {} level(s), {} channel(s), {} pattern(s))",
                path.display(),
                if settings.enabled { "enabled" } else { "disabled" },
                settings.log_levels.len(),
                settings.message_types.len(),
                settings.patterns.len()
            );
            Ok(())
        }
        Err(ConfigError::InvalidPatterns(errors)) => {
            for error in &errors {
                eprintln!("{}: {}", path.display(), error);
            }
            anyhow::bail!("{} invalid pattern(s) in {}", errors.len(), path.display())
        }
        Err(e) => Err(e.into()),
    }
}

fn filter(path: &Path, input: Option<&Path>, lenient: bool, stats: bool) -> Result<()> {
    let settings = FilterSettings::load(path)?;
    let config = if lenient {
        FilterConfig::from_settings_lenient(&settings)
    } else {
        FilterConfig::from_settings(&settings)
            .with_context(|| format!("Refusing to filter with {}", path.display()))?
    };

    let reader: Box<dyn BufRead> = match input {
        Some(file) => Box::new(BufReader::new(
            File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let sink = JsonLinesSink::new(BufWriter::new(io::stdout().lock()));
    let logger = FilteredLogger::new(sink, Arc::new(config));

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }

        let event: LogEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping malformed event");
                continue;
            }
        };

        logger
            .log(event.severity, &event.template, &event.context)
            .context("Failed to write event")?;
    }

    logger.inner().flush().context("Failed to flush output")?;

    if stats {
        let counts = logger.stats().snapshot();
        eprintln!(
            "passed: {}, suppressed: {} (level: {}, channel: {}, pattern: {})",
            counts.passed,
            counts.suppressed(),
            counts.level,
            counts.channel,
            counts.pattern
        );
    }

    Ok(())
}

fn render(template: &str, context: Option<&str>, emphasis: bool) -> Result<()> {
    let context: Context = match context {
        Some(json) => serde_json::from_str(json).context("--context must be a JSON object")?,
        None => Context::new(),
    };

    let renderer = if emphasis {
        Renderer::new().with_emphasis(Emphasis::Html)
    } else {
        Renderer::new()
    };

    println!("{}", renderer.render(template, &context));
    Ok(())
}
