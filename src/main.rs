// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use ltecomp::prelude::*;
use ltecomp::provisioning::provision_role;
use ltecomp::report::analyzer;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{Level, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Place four cells and their terminals, attach, provision and run once
    Run {
        /// Distance parameter of the cell grid (m)
        #[arg(long = "enbDist", default_value_t = 100.0)]
        enb_dist: f64,
        /// Radius of the disc terminals are dropped in (m)
        #[arg(long, default_value_t = 50.0)]
        radius: f64,
        /// Terminals per cell
        #[arg(long = "numUes", default_value_t = 10)]
        num_ues: usize,
        /// 1 = static per-cell attachment, 0 = nearest cell
        #[arg(long = "isComp", default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
        is_comp: u8,
        /// Attachment policy by name (see `list`), overrides --isComp
        #[arg(long)]
        policy: Option<String>,
        /// Simulated seconds
        #[arg(long, default_value_t = 1)]
        sec: u64,
        #[arg(long = "rngRun", default_value_t = 1)]
        rng_run: u64,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(short, long, default_value = "Results")]
        output_dir: PathBuf,
        /// Skip the per-terminal console dump
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run both attachment modes over several placements and compare them
    Compare {
        #[arg(long = "enbDist", default_value_t = 100.0)]
        enb_dist: f64,
        #[arg(long, default_value_t = 50.0)]
        radius: f64,
        #[arg(long = "numUes", default_value_t = 10)]
        num_ues: usize,
        #[arg(long, default_value_t = 1)]
        sec: u64,
        #[arg(short, long, default_value_t = 5)]
        repetitions: u64,
        #[arg(short, long, default_value = "Results")]
        output_dir: PathBuf,
    },

    /// Summarize the scenario reports found in a directory
    Analyze {
        #[arg(default_value = "Results")]
        path: PathBuf,
    },

    /// Show attachment policies and the flow provisioning table
    List,
}

fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            enb_dist,
            radius,
            num_ues,
            is_comp,
            policy,
            sec,
            rng_run,
            seed,
            output_dir,
            quiet,
        } => {
            let mode = match policy {
                Some(name) => PolicyRegistry::global()
                    .resolve(&name)
                    .with_context(|| format!("unknown attachment policy '{}'", name))?,
                None => AttachmentMode::from_flag(is_comp),
            };
            let config = ScenarioConfig {
                enb_dist,
                radius,
                num_ues,
                mode,
                sec,
                rng_run,
                seed,
                output_dir,
                ..ScenarioConfig::default()
            };
            run_single(config, quiet)?;
        }

        Commands::Compare {
            enb_dist,
            radius,
            num_ues,
            sec,
            repetitions,
            output_dir,
        } => {
            let base = ScenarioConfig {
                enb_dist,
                radius,
                num_ues,
                sec,
                output_dir: output_dir.clone(),
                ..ScenarioConfig::default()
            };
            compare_modes(base, repetitions, &output_dir)?;
        }

        Commands::Analyze { path } => {
            analyze_results(&path)?;
        }

        Commands::List => {
            println!("\nAttachment policies");
            for (name, mode) in PolicyRegistry::global().list() {
                println!("  - {:<8} isComp {}", name, mode.flag());
            }

            println!("\nFlow provisioning (group g takes slot g)");
            for role in FlowRole::ALL {
                let bearer = provision_role(role);
                let qci = bearer.qci;
                println!(
                    "  {} {:<15} {:<20} {} prio {} delay {} ms loss {:.0e}  tft: {}",
                    role.index(),
                    role.name(),
                    qci.label(),
                    if qci.is_gbr() { "GBR " } else { "nGBR" },
                    qci.priority(),
                    qci.packet_delay_budget_ms(),
                    qci.packet_error_loss_rate(),
                    bearer.tft
                );
            }

            println!("\nUsage: lte-comp run --isComp 1 --numUes 10 (or --policy closest)");
            println!("Example: lte-comp compare --repetitions 10\n");
        }
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

fn run_single(config: ScenarioConfig, quiet: bool) -> Result<()> {
    info!("LTE CoMP: Single Run");

    let scenario = Scenario::new(config)?;
    let mut engine = DryRunEngine::new(&scenario.config().backhaul)?;

    let mut out: Box<dyn Write> = if quiet {
        Box::new(io::sink())
    } else {
        Box::new(io::stdout().lock())
    };
    let outcome = scenario.run_with_output(&mut engine, &mut out)?;
    out.flush()?;
    drop(out);

    scenario.save_results(&outcome)?;
    Ok(())
}

fn compare_modes(base: ScenarioConfig, repetitions: u64, output_dir: &Path) -> Result<()> {
    info!("LTE CoMP: Comparison");
    info!("Repetitions: {}", repetitions);
    info!("Terminals per cell: {}", base.num_ues);

    let configs: Vec<ScenarioConfig> = [AttachmentMode::Static, AttachmentMode::Nearest]
        .into_iter()
        .flat_map(|mode| {
            let base = base.clone();
            (1..=repetitions).map(move |run| base.clone().with_mode(mode).with_rng_run(run))
        })
        .collect();

    let pb = ProgressBar::new(configs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.orange/yellow} {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );

    let reports = configs
        .par_iter()
        .map(|config| -> Result<ScenarioReport> {
            let scenario = Scenario::new(config.clone())?;
            let mut engine = DryRunEngine::new(&config.backhaul)?;
            let outcome = scenario.run(&mut engine)?;
            scenario.save_results(&outcome)?;
            pb.inc(1);
            Ok(ScenarioReport::from_outcome(config, &outcome))
        })
        .collect::<Result<Vec<ScenarioReport>>>()?;

    pb.finish_with_message("Comparison complete");

    let summaries = analyzer::summarize(&reports);
    analyzer::comparison_table(&summaries);

    std::fs::create_dir_all(output_dir)?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let comparison_path = output_dir.join(format!("comparison_{}.json", timestamp));
    std::fs::write(&comparison_path, serde_json::to_string_pretty(&summaries)?)?;
    info!("Comparison saved to: {}", comparison_path.display());

    Ok(())
}

fn analyze_results(path: &Path) -> Result<()> {
    info!("Analyzing results in: {}", path.display());

    let reports = analyzer::load_reports(path)?;
    if reports.is_empty() {
        info!("No scenario reports found.");
        return Ok(());
    }

    info!("Loaded {} reports", reports.len());
    analyzer::comparison_table(&analyzer::summarize(&reports));

    Ok(())
}
