use std::collections::BTreeSet;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use plandiff_diff::{diff_schedules, flat_diff_schedules, task_summary, DiffConfig};
use plandiff_formats::{FormatRegistry, Source};
use plandiff_model::Schedule;
use tracing::debug;

use crate::cli::{Cli, Command, DiffArgs, DiffMode, OutputFormat, ShowArgs};

/// How a successful command ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    Differences,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Clean => ExitCode::SUCCESS,
            Outcome::Differences => ExitCode::from(1),
        }
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<Outcome> {
    let registry = FormatRegistry::with_builtin_formats();
    let (output, outcome) = match cli.command {
        Command::Diff(args) => cmd_diff(&registry, &args, &cli.format)?,
        Command::Show(args) => cmd_show(&registry, &args, &cli.format)?,
        Command::Formats => cmd_formats(&registry),
    };
    print!("{output}");
    Ok(outcome)
}

fn load(registry: &FormatRegistry, path: &Path) -> anyhow::Result<Schedule> {
    let source = Source::read(path).with_context(|| format!("reading {}", path.display()))?;
    let schedule = registry
        .import(&source)
        .with_context(|| format!("loading {}", path.display()))?;
    debug!(path = %path.display(), tasks = schedule.task_count(), "loaded schedule");
    Ok(schedule)
}

/// Config file (or defaults) with command-line overrides applied.
fn diff_config(args: &DiffArgs) -> anyhow::Result<DiffConfig> {
    let mut config = match &args.config {
        Some(path) => DiffConfig::load(path).with_context(|| format!("config {}", path.display()))?,
        None => DiffConfig::default(),
    };
    if !args.hash_fields.is_empty() {
        config.hash_fields = args.hash_fields.clone();
    }
    if args.whole_days {
        config.whole_days = true;
    }
    if !args.attributes.is_empty() {
        config.legacy_attributes = args.attributes.clone();
    }
    config.validate()?;
    Ok(config)
}

fn cmd_diff(
    registry: &FormatRegistry,
    args: &DiffArgs,
    format: &OutputFormat,
) -> anyhow::Result<(String, Outcome)> {
    let config = diff_config(args)?;
    let old = load(registry, &args.old)?;
    let new = load(registry, &args.new)?;

    let (output, changed) = match args.mode {
        DiffMode::Tree => {
            let diff = diff_schedules(&old, &new, &config);
            let output = match format {
                OutputFormat::Text => colorize(&diff.render_text()),
                OutputFormat::Json => diff.to_json_string()? + "\n",
            };
            (output, diff.has_changes())
        }
        DiffMode::Flat => {
            let diff = flat_diff_schedules(&old, &new, &config)?;
            let output = match format {
                OutputFormat::Text => colorize(&diff.render_text()),
                OutputFormat::Json => serde_json::to_string_pretty(&diff.to_json())? + "\n",
            };
            (output, !diff.is_empty())
        }
    };
    let outcome = if changed { Outcome::Differences } else { Outcome::Clean };
    Ok((output, outcome))
}

fn colorize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let painted = if line.starts_with("[+]") {
            line.green().to_string()
        } else if line.starts_with("[-]") {
            line.red().to_string()
        } else if line.starts_with("[M]") {
            line.yellow().to_string()
        } else {
            line.to_string()
        };
        out.push_str(&painted);
        out.push('\n');
    }
    out
}

fn cmd_show(
    registry: &FormatRegistry,
    args: &ShowArgs,
    format: &OutputFormat,
) -> anyhow::Result<(String, Outcome)> {
    let mut schedule = load(registry, &args.file)?;
    if !args.flags.is_empty() {
        let flags: BTreeSet<String> = args.flags.iter().cloned().collect();
        schedule = schedule.with_flags(&flags);
    }
    if !args.exclude_flags.is_empty() {
        let flags: BTreeSet<String> = args.exclude_flags.iter().cloned().collect();
        schedule = schedule.without_flags(&flags);
    }
    if args.milestones {
        schedule = schedule.milestones_only();
    }

    let output = match format {
        OutputFormat::Json => String::from_utf8(registry.get("json")?.export(&schedule)?)?,
        OutputFormat::Text => {
            let mut out = format!("{} ({} tasks)\n", schedule.name.bold(), schedule.task_count());
            for task in schedule.iter() {
                let indent = "  ".repeat(task.level.saturating_sub(1) as usize);
                out.push_str(&format!("{indent}{}\n", task_summary(task)));
            }
            out
        }
    };
    Ok((output, Outcome::Clean))
}

fn cmd_formats(registry: &FormatRegistry) -> (String, Outcome) {
    let mut out = String::new();
    for name in registry.names() {
        out.push_str(name);
        out.push('\n');
    }
    (out, Outcome::Clean)
}
