use std::path::Path;

use anyhow::Result;
use log::{error, info};
use psp_max_parser::{parse_psp_max_file, structs::PspMaxProblem, validation::validate_problem};

pub fn inspect(input_path: &Path, json: bool) -> Result<()> {
    let psp = parse_psp_max_file(input_path)?;
    print!("{}", render(&psp, json)?);

    Ok(())
}

fn render(psp: &PspMaxProblem, json: bool) -> Result<String> {
    if json {
        Ok(format!("{}\n", serde_json::to_string_pretty(psp)?))
    } else {
        Ok(psp.to_string())
    }
}

pub fn validate(input_path: &Path) -> Result<()> {
    let psp = parse_psp_max_file(input_path)?;

    match validate_problem(&psp) {
        Ok(()) => {
            info!(
                "{input_path:?}: {} activities, {} resources, no issues",
                psp.activities.len(),
                psp.resources.len()
            );
            Ok(())
        }
        Err(errors) => {
            for err in &errors {
                error!("{input_path:?}: {err}");
            }
            anyhow::bail!("{input_path:?} has {} issues", errors.len())
        }
    }
}
