mod latex;
mod store;

use anyhow::{ensure, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use ndpt_core::{noncancelling_count, CompositionGenerator, EnergyCorrection};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when set.
    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Show { order, latex } => run_show(order, latex),
        Command::Generate { from, to, out } => run_generate(from, to, out),
        Command::Check { input } => run_check(input),
        Command::Count { order } => run_count(order),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "ndpt",
    about = "Energy corrections of nondegenerate perturbation theory"
)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute one order and print its terms
    Show {
        /// Perturbation order (>= 2)
        #[arg(long)]
        order: u32,

        /// Print a LaTeX equation instead of plain text
        #[arg(long, action = ArgAction::SetTrue)]
        latex: bool,
    },

    /// Compute a range of orders and merge them into a JSON store
    Generate {
        /// First order (inclusive)
        #[arg(long, default_value_t = 2)]
        from: u32,

        /// Last order (inclusive)
        #[arg(long)]
        to: u32,

        /// Store file; created if missing, existing orders are replaced
        #[arg(long)]
        out: PathBuf,
    },

    /// Rebuild every correction in a JSON store and report term counts
    Check {
        /// Store file written by `generate`
        #[arg(long)]
        input: PathBuf,
    },

    /// Number of raw compositions an order enumerates, without computing it
    Count {
        /// Perturbation order (>= 2)
        #[arg(long)]
        order: u32,
    },
}

fn run_show(order: u32, latex: bool) -> Result<()> {
    let generator = CompositionGenerator::new();
    let correction = EnergyCorrection::compute(order, &generator)
        .with_context(|| format!("computing correction of order {}", order))?;
    if latex {
        println!("{}", latex::correction_latex(&correction));
    } else {
        println!("{}", correction);
    }
    Ok(())
}

fn run_generate(from: u32, to: u32, out: PathBuf) -> Result<()> {
    ensure!(from <= to, "--from ({}) must not exceed --to ({})", from, to);

    // One generator for the whole batch so composition shapes are shared.
    let generator = CompositionGenerator::new();
    let mut records = Vec::new();
    for order in from..=to {
        let correction = EnergyCorrection::compute(order, &generator)
            .with_context(|| format!("computing correction of order {}", order))?;
        println!("Terms in correction {}: {}", order, correction.term_count());
        records.push(correction.to_tuple());
    }

    let stored = store::merge_and_save(&out, records)?;
    info!(path = %out.display(), orders = stored, "store written");
    Ok(())
}

fn run_check(input: PathBuf) -> Result<()> {
    let records = store::load(&input)?;
    for record in records {
        let order = record.0;
        let correction = EnergyCorrection::from_tuple(record.clone())
            .with_context(|| format!("rebuilding correction of order {}", order))?;
        println!(
            "Terms in correction {:02}: {:>11}",
            order,
            with_thousands(correction.term_count())
        );
        if correction.to_tuple() != record {
            warn!(order, "stored record is not in canonical form");
        }
    }
    Ok(())
}

fn run_count(order: u32) -> Result<()> {
    ensure!(order >= 2, "--order must be >= 2");
    println!(
        "Raw compositions for order {}: {}",
        order,
        noncancelling_count(order - 1)
    );
    Ok(())
}

fn with_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
