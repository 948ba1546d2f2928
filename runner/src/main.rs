#![forbid(unsafe_code)]
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use log::{debug, error};
use nddl::EmitterOptions;

mod commands;
mod config;

use config::BatchConfig;

#[derive(Debug, Parser)]
#[command(author, version)]
/// RCPSP/max to NDDL translator and benchmark driver
struct App {
    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate an RCPSP/max instance into an NDDL initial state
    Translate {
        #[arg(required = true)]
        psp_problem_file: PathBuf,
        /// Write the model here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Refuse instances with unknown successors or duplicate ids
        #[arg(long)]
        strict: bool,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Print a parsed RCPSP/max instance
    Inspect {
        #[arg(required = true)]
        psp_problem_file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Check successor references and activity ids of an instance
    Validate {
        #[arg(required = true)]
        psp_problem_file: PathBuf,
    },
    /// Run the external planner on every bounded instance of a benchmark list
    Benchmark {
        #[arg(required = true)]
        test_dir: PathBuf,
        /// Benchmark list inside test_dir, e.g. benchmarks10.txt
        #[arg(required = true)]
        benchmark_list: PathBuf,
        /// JSON batch configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Seconds per planner run
        #[arg(short, long, env = "UBO_TIMEOUT")]
        timeout: Option<u64>,
        #[arg(long, env = "UBO_LAUNCHER")]
        launcher: Option<PathBuf>,
        /// Only run these solvers (repeatable)
        #[arg(short, long = "solver")]
        solvers: Vec<String>,
        /// Model file the planner reads
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print planner invocations without running them
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Domain model included by the generated file
    #[arg(long, default_value = "UBO-model.nddl")]
    model_include: String,
    /// Latest end time of every activity
    #[arg(long, default_value_t = 1000)]
    max_duration: i64,
    /// End of the planning horizon
    #[arg(long, default_value_t = 1000)]
    horizon: i64,
}

impl From<ModelArgs> for EmitterOptions {
    fn from(args: ModelArgs) -> Self {
        EmitterOptions {
            model_include: args.model_include,
            horizon_end: args.horizon,
            max_duration: args.max_duration,
            ..Default::default()
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Translate {
            psp_problem_file,
            output,
            strict,
            model,
        } => commands::translate(&psp_problem_file, output.as_deref(), strict, model.into()),
        Commands::Inspect {
            psp_problem_file,
            json,
        } => commands::inspect(&psp_problem_file, json),
        Commands::Validate { psp_problem_file } => commands::validate(&psp_problem_file),
        Commands::Benchmark {
            test_dir,
            benchmark_list,
            config,
            timeout,
            launcher,
            solvers,
            output,
            dry_run,
            model,
        } => {
            let mut batch = match config {
                Some(path) => BatchConfig::load(&path)?,
                None => BatchConfig::default(),
            };
            if let Some(timeout) = timeout {
                batch.timeout_secs = timeout;
            }
            if let Some(launcher) = launcher {
                batch.launcher = launcher.to_string_lossy().into_owned();
            }
            if let Some(output) = output {
                batch.output = output;
            }
            batch.select_solvers(&solvers)?;
            debug!("{batch:?}");

            let options: EmitterOptions = model.into();
            commands::benchmark(&test_dir, &benchmark_list, &batch, &options, dry_run).map(|_| ())
        }
    }
}

fn main() {
    let args: App = App::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    debug!("{args:?}");

    if let Err(err) = run(args.command) {
        error!("An error occurred: {:#}", err);
        std::process::exit(1);
    }
}
