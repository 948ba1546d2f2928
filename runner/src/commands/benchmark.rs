use std::{
    fmt, fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use nddl::{emit_nddl_with, EmitterOptions};
use psp_max_parser::parse_psp_max_file;

use crate::config::{BatchConfig, SolverProfile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkEntry {
    pub test_file: String,
    pub bound: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BenchmarkSummary {
    pub instances: usize,
    pub skipped: usize,
    pub runs: usize,
    pub failed_runs: usize,
}

impl fmt::Display for BenchmarkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} instances, {} skipped, {} solver runs ({} failed)",
            self.instances, self.skipped, self.runs, self.failed_runs
        )
    }
}

/// Reads the `UBO<n>-<k> <bound> ...` lines of a benchmark list. Instances
/// without a known bound (`inf`) are left out, malformed lines are logged and
/// skipped.
pub fn parse_benchmark_list(content: &str) -> Vec<BenchmarkEntry> {
    content
        .lines()
        .filter(|line| line.starts_with("UBO"))
        .filter_map(|line| match parse_benchmark_entry(line) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping benchmark line {line:?}: {err:#}");
                None
            }
        })
        .collect()
}

fn parse_benchmark_entry(line: &str) -> Result<Option<BenchmarkEntry>> {
    let mut words = line.split_whitespace();
    let (name, bound) = match (words.next(), words.next()) {
        (Some(name), Some(bound)) => (name, bound),
        _ => anyhow::bail!("missing bound"),
    };

    let (_, index) = name
        .split_once('-')
        .with_context(|| format!("benchmark name without instance index: {name}"))?;
    let test_file = format!("psp{}.sch", index.trim_start_matches('0'));

    if bound == "inf" {
        debug!("skipping {name}: no known bound");
        return Ok(None);
    }

    let bound = bound
        .parse()
        .with_context(|| format!("invalid bound for {name}: {bound}"))?;

    Ok(Some(BenchmarkEntry { test_file, bound }))
}

/// `benchmarks<N>.txt` lists the instances found in `testset<N>`.
pub fn testset_dir(test_dir: &Path, benchmark_list: &Path) -> Result<PathBuf> {
    let name = benchmark_list
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid benchmark list name {benchmark_list:?}"))?;
    let name = name.strip_prefix("benchmarks").unwrap_or(name);
    let name = name.strip_suffix(".txt").unwrap_or(name);

    Ok(test_dir.join(format!("testset{name}")))
}

pub fn solver_command(config: &BatchConfig, solver: &SolverProfile, entry: &BenchmarkEntry) -> Command {
    let mut cmd = Command::new(&config.launcher);
    cmd.arg("-Dproject.mode=o")
        .arg(format!("-Dproject.test={}", entry.test_file))
        .arg(format!("-Dproject.bound={}", entry.bound + 2))
        .arg(format!("-Dproject.timeout={}", config.timeout_secs))
        .arg(format!("-Dproject.solver={}", solver.solver))
        .arg(format!("-Dproject.profile={}", solver.profile));
    cmd
}

pub fn command_line(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn benchmark(
    test_dir: &Path,
    benchmark_list: &Path,
    config: &BatchConfig,
    options: &EmitterOptions,
    dry_run: bool,
) -> Result<BenchmarkSummary> {
    if !test_dir.is_dir() {
        anyhow::bail!("test_dir {test_dir:?} is not a directory")
    }

    let list_path = test_dir.join(benchmark_list);
    let content = fs::read_to_string(&list_path)
        .with_context(|| format!("could not read benchmark list {list_path:?}"))?;
    let entries = parse_benchmark_list(&content);
    let data_dir = testset_dir(test_dir, benchmark_list)?;
    info!(
        "running {} instances from {data_dir:?} with {} solvers",
        entries.len(),
        config.solvers.len()
    );

    let mut summary = BenchmarkSummary::default();
    for entry in &entries {
        let problem = match parse_psp_max_file(data_dir.join(&entry.test_file)) {
            Ok(problem) => problem,
            Err(err) => {
                error!("skipping {}: {err}", entry.test_file);
                summary.skipped += 1;
                continue;
            }
        };

        let model = emit_nddl_with(&problem, options.clone());
        // trailing newline as the planner's reference scripts write it
        fs::write(&config.output, format!("{model}\n"))
            .with_context(|| format!("could not write model to {:?}", config.output))?;
        summary.instances += 1;

        for solver in &config.solvers {
            let mut cmd = solver_command(config, solver, entry);
            let line = command_line(&cmd);
            if dry_run {
                println!("{line}");
                continue;
            }

            info!("{line}");
            summary.runs += 1;
            match cmd.status() {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    warn!("{} with {} exited with {status}", entry.test_file, solver.solver);
                    summary.failed_runs += 1;
                }
                Err(err) => {
                    error!("could not launch {}: {err}", config.launcher);
                    summary.failed_runs += 1;
                }
            }
        }
    }

    info!("benchmark finished: {summary}");

    Ok(summary)
}
