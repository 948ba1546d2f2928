use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use anyhow::{Context, Result};
use log::{debug, error, info, trace};
use nddl::{emit_nddl_with, EmitterOptions};
use psp_max_parser::{parse_psp_max_file, validation::validate_problem};

pub fn translate(
    input_path: &Path,
    output_path: Option<&Path>,
    strict: bool,
    options: EmitterOptions,
) -> Result<()> {
    let psp = parse_psp_max_file(input_path)?;
    trace!("parsed psp: {psp:#?}");

    if strict {
        if let Err(errors) = validate_problem(&psp) {
            for err in &errors {
                error!("{err}");
            }
            anyhow::bail!("{input_path:?} failed validation with {} errors", errors.len());
        }
        debug!("{input_path:?} passed validation");
    }

    // trailing newline as the planner's reference scripts write it
    let model = format!("{}\n", emit_nddl_with(&psp, options));

    match output_path {
        Some(output_path) => {
            fs::write(output_path, model)
                .with_context(|| format!("could not write model to {output_path:?}"))?;
            info!("Wrote nddl model to: {:?}", output_path);
        }
        None => io::stdout().lock().write_all(model.as_bytes())?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use nddl::EmitterOptions;

    use super::translate;

    fn testdata(name: &str) -> String {
        format!("{}/../testdata/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    #[test]
    fn translate_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("psp1.nddl");
        let input = testdata("psp1.sch");

        translate(Path::new(&input), Some(output.as_path()), true, EmitterOptions::default()).unwrap();

        let expected = fs::read_to_string(testdata("psp1.nddl")).unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            format!("// Original file:{input}\n\n{expected}\n")
        );
    }

    #[test]
    fn strict_rejects_unknown_successor() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.sch");
        let output = dir.path().join("broken.nddl");
        fs::write(&input, "0 1\n0 1 1 7 [5]\n1 1 0\n0 1 0 0\n1 1 2 3\n10\n").unwrap();

        assert!(translate(&input, Some(output.as_path()), true, EmitterOptions::default()).is_err());
        assert!(!output.exists());

        translate(&input, Some(output.as_path()), false, EmitterOptions::default()).unwrap();
        assert!(output.exists());
    }
}
