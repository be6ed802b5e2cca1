mod args;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use mailverify::{ReferenceTables, Verifier, resolve_mx, suggest, validate_syntax};
use tracing_subscriber::EnvFilter;

use std::io::{self, BufRead};

use args::{Cli, Commands};
use output::{Row, write_reports};

fn init_tracing(verbose: bool) {
    let default = if verbose { "mailverify=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_inputs(cli: &Cli) -> Result<Vec<String>> {
    let mut inputs = cli.cmd.inputs().to_vec();
    if cli.stdin {
        for line in io::stdin().lock().lines() {
            let line = line.context("read stdin")?;
            let line = line.trim();
            if !line.is_empty() {
                inputs.push(line.to_string());
            }
        }
    }
    Ok(inputs)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let inputs = read_inputs(&cli)?;
    if inputs.is_empty() {
        anyhow::bail!("aucune entrée: passez des arguments ou --stdin");
    }

    let rows: Vec<Row> = match &cli.cmd {
        Commands::Verify { probe, .. } => {
            let verifier = Verifier::with_config(probe.config());
            let options = probe.options();
            inputs
                .iter()
                .map(|email| Row::Verify(Box::new(verifier.verify(email, &options))))
                .collect()
        }
        Commands::Syntax { .. } => inputs
            .into_iter()
            .map(|email| {
                let report = validate_syntax(&email);
                Row::Syntax { email, report }
            })
            .collect(),
        Commands::Suggest { .. } => {
            let tables = ReferenceTables::builtin();
            inputs
                .into_iter()
                .map(|email| {
                    let suggestion = suggest(&email, &tables);
                    Row::Suggest { email, suggestion }
                })
                .collect()
        }
        Commands::Mx { .. } => inputs
            .into_iter()
            .map(|domain| match resolve_mx(&domain) {
                Ok(records) => Row::Mx {
                    domain,
                    records,
                    error: None,
                },
                Err(err) => Row::Mx {
                    domain,
                    records: Vec::new(),
                    error: Some(err.to_string()),
                },
            })
            .collect(),
    };

    write_reports(&rows, &cli)?;

    // codes de sortie : 0 OK, 2 au moins une entrée KO, 1 fatal
    if rows.iter().any(|row| !row.is_ok()) {
        std::process::exit(2);
    }
    Ok(())
}
