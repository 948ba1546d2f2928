use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A solver of the external planner and the resource profile it runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverProfile {
    pub solver: String,
    pub profile: String,
}

impl SolverProfile {
    fn new(solver: &str, profile: &str) -> Self {
        Self {
            solver: solver.to_string(),
            profile: profile.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub solvers: Vec<SolverProfile>,
    /// Passed on to the planner, which enforces it
    pub timeout_secs: u64,
    /// Program that starts the planner
    pub launcher: String,
    /// Where each generated model is written before the planner runs
    pub output: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            solvers: vec![
                SolverProfile::new("BuiltIn", "IncrementalFlowProfile"),
                SolverProfile::new("IFIR", "TimetableProfile"),
                SolverProfile::new("Hybrid", "TimetableProfile"),
            ],
            timeout_secs: 60,
            launcher: "ant".to_string(),
            output: PathBuf::from("UBO-gen-initial-state.nddl"),
        }
    }
}

impl BatchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("could not open config file {path:?}"))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("could not parse config file {path:?}"))
    }

    /// Keeps only the named solvers, in the given order.
    pub fn select_solvers(&mut self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let solver = self
                .solvers
                .iter()
                .find(|s| &s.solver == name)
                .with_context(|| format!("unknown solver {name}"))?;
            selected.push(solver.clone());
        }
        self.solvers = selected;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profiles() {
        let config = BatchConfig::default();

        let profiles: Vec<(&str, &str)> = config
            .solvers
            .iter()
            .map(|s| (s.solver.as_str(), s.profile.as_str()))
            .collect();
        assert_eq!(
            profiles,
            vec![
                ("BuiltIn", "IncrementalFlowProfile"),
                ("IFIR", "TimetableProfile"),
                ("Hybrid", "TimetableProfile"),
            ]
        );
    }

    #[test]
    fn partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(&path, r#"{ "timeout_secs": 5, "launcher": "/opt/ant/bin/ant" }"#).unwrap();

        let config = BatchConfig::load(&path).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.launcher, "/opt/ant/bin/ant");
        assert_eq!(config.solvers, BatchConfig::default().solvers);
    }

    #[test]
    fn malformed_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(&path, "{ timeout_secs = 5 }").unwrap();

        assert!(BatchConfig::load(&path).is_err());
    }

    #[test]
    fn select_solvers() {
        let mut config = BatchConfig::default();
        config
            .select_solvers(&["IFIR".to_string(), "BuiltIn".to_string()])
            .unwrap();

        let names: Vec<&str> = config.solvers.iter().map(|s| s.solver.as_str()).collect();
        assert_eq!(names, vec!["IFIR", "BuiltIn"]);
    }

    #[test]
    fn select_unknown_solver() {
        let mut config = BatchConfig::default();

        assert!(config.select_solvers(&["Gurobi".to_string()]).is_err());
    }
}
