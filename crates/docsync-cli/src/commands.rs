use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use docsync_delta::{Delta, Differ, DifferConfig};
use docsync_ops::{apply, translate, translate_wire, Operation, OperationLog};
use serde_json::Value;

use crate::cli::*;
use crate::config::load_config;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Diff(args) => cmd_diff(args, config, &cli.format),
        Command::Delta(args) => cmd_delta(args, config),
        Command::Translate(args) => cmd_translate(args, &cli.format),
        Command::Apply(args) => cmd_apply(args),
    }
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn differ(config: DifferConfig, min_text_length: Option<usize>) -> anyhow::Result<Differ> {
    let config = match min_text_length {
        Some(n) => config.with_text_diff_min_length(n),
        None => config,
    };
    Ok(Differ::new(config)?)
}

fn cmd_diff(args: DiffArgs, config: DifferConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let old = read_json(&args.old)?;
    let new = read_json(&args.new)?;
    let delta = differ(config, args.min_text_length)?.diff(&old, &new);
    let log = translate(&delta, &args.base)?;
    print_log(&log, format)
}

fn cmd_delta(args: DeltaArgs, config: DifferConfig) -> anyhow::Result<()> {
    let old = read_json(&args.old)?;
    let new = read_json(&args.new)?;
    let delta: Delta = differ(config, args.min_text_length)?.diff(&old, &new);
    println!("{}", serde_json::to_string_pretty(&delta)?);
    Ok(())
}

fn cmd_translate(args: TranslateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let left = read_json(&args.left)?;
    let delta = read_json(&args.delta)?;
    let log = translate_wire(&delta, &left, &args.base)?;
    print_log(&log, format)
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let document = read_json(&args.document)?;
    let log: OperationLog = serde_json::from_value(read_json(&args.operations)?)
        .with_context(|| format!("parsing operations in {}", args.operations.display()))?;
    let result = apply(&document, &args.base, log.operations())?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn print_log(log: &OperationLog, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(log)?),
        OutputFormat::Text => {
            if log.is_empty() {
                println!("No changes.");
                return Ok(());
            }
            for op in log {
                let line = op.to_string();
                let line = match op {
                    Operation::Insert { .. } | Operation::StringInsert { .. } => line.green(),
                    Operation::Delete { .. } | Operation::StringRemove { .. } => line.red(),
                    Operation::Replace { .. } => line.yellow(),
                };
                println!("  {line}");
            }
            println!(
                "{} {} operations ({} splices)",
                "✓".green().bold(),
                log.len().to_string().bold(),
                log.splices()
            );
        }
    }
    Ok(())
}
