use std::path::Path as FsPath;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use jsonkv_client::{ClientConfig, JsonClient};
use jsonkv_protocol::Operation;
use jsonkv_store::InMemoryJsonStore;
use jsonkv_types::normalize;
use serde_json::{json, Value};
use tracing::info;

use crate::cli::*;
use crate::script::{self, Outcome};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    };
    match cli.command {
        Command::Path(args) => cmd_path(args, &cli.format),
        Command::Ops(args) => cmd_ops(args, &cli.format),
        Command::Run(args) => cmd_run(args, config, &cli.format).await,
    }
}

fn cmd_path(args: PathArgs, format: &OutputFormat) -> anyhow::Result<()> {
    for input in &args.inputs {
        let canonical = normalize(input.as_str());
        match format {
            OutputFormat::Text => println!("{} {} {}", input, "→".dimmed(), canonical.as_str().cyan()),
            OutputFormat::Json => println!("{}", json!({"input": input, "canonical": canonical})),
        }
    }
    Ok(())
}

fn cmd_ops(args: OpsArgs, format: &OutputFormat) -> anyhow::Result<()> {
    for op in Operation::ALL.iter().filter(|op| !args.writes || op.is_write()) {
        match format {
            OutputFormat::Text => {
                let kind = if op.is_write() { "write".yellow() } else { "read".green() };
                println!("{:<16} {}", op.wire_name().bold(), kind);
            }
            OutputFormat::Json => {
                println!("{}", json!({"operation": op.wire_name(), "write": op.is_write()}))
            }
        }
    }
    Ok(())
}

async fn cmd_run(args: RunArgs, config: ClientConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading {}", args.script.display()))?;
    let lines = script::parse(&text)?;

    let store = Arc::new(InMemoryJsonStore::new());
    if let Some(seed) = &args.seed {
        load_seed(&store, seed)?;
    }
    let client = JsonClient::with_config(store.clone(), config);
    info!(lines = lines.len(), documents = store.len(), "running script");
    let failed = run_lines(&client, &lines, args.auto_create, format).await;

    if args.dump {
        for key in store.keys() {
            let doc = store.document(&key).unwrap_or(Value::Null);
            match format {
                OutputFormat::Text => println!("{} {}", key.bold(), doc),
                OutputFormat::Json => println!("{}", json!({"key": key, "document": doc})),
            }
        }
    }

    if let OutputFormat::Text = format {
        let summary = format!("{} commands, {} failed", lines.len(), failed);
        if failed == 0 {
            println!("{} {}", "✓".green().bold(), summary);
        } else {
            println!("{} {}", "✗".red().bold(), summary);
        }
    }
    Ok(())
}

/// Execute `lines` in order, reporting each; returns the number that failed.
async fn run_lines(
    client: &JsonClient,
    lines: &[script::ScriptLine],
    auto_create: bool,
    format: &OutputFormat,
) -> usize {
    let mut failed = 0;
    for line in lines {
        let result = script::execute(client, line, auto_create).await;
        if result.is_err() {
            failed += 1;
        }
        report(line, &result, format);
    }
    failed
}

fn load_seed(store: &InMemoryJsonStore, path: &FsPath) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let Value::Object(documents) = serde_json::from_str::<Value>(&text)
        .with_context(|| format!("parsing {}", path.display()))?
    else {
        bail!("{} must contain a JSON object keyed by document key", path.display());
    };
    for (key, doc) in documents {
        store.insert(key, doc);
    }
    Ok(())
}

fn report(line: &script::ScriptLine, result: &anyhow::Result<Outcome>, format: &OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!(
                "{} {} {}",
                format!("{:>3}", line.number).dimmed(),
                line.operation.bold(),
                line.args.join(" ")
            );
            match result {
                Ok(outcome) => {
                    println!("    {}", outcome.value.to_string().green());
                    if let Some(m) = &outcome.materialization {
                        println!(
                            "    {} anchor {} target {} ({} probes)",
                            "created ancestors:".yellow(),
                            m.anchor.as_str().cyan(),
                            m.target.as_str().cyan(),
                            m.probes
                        );
                    }
                }
                Err(err) => println!("    {} {err:#}", "error:".red().bold()),
            }
        }
        OutputFormat::Json => {
            let entry = match result {
                Ok(outcome) => json!({
                    "line": line.number,
                    "operation": line.operation,
                    "result": outcome.value,
                    "materialization": outcome.materialization,
                }),
                Err(err) => json!({
                    "line": line.number,
                    "operation": line.operation,
                    "error": format!("{err:#}"),
                }),
            };
            println!("{entry}");
        }
    }
}
