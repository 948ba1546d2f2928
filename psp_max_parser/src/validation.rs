//! Referential checks for parsed instances.
//!
//! The parser only enforces the positional structure of the file. Successor
//! ids are taken as written, so an instance may reference activities that do
//! not exist. Model generation does not need these checks; callers that deal
//! with untrusted input run [`validate_problem`] first.

use std::collections::HashSet;

use crate::structs::PspMaxProblem;

pub type ValidationResult = Result<(), Vec<ValidationError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two activity lines declare the same id.
    DuplicateActivityId,
    /// A successor edge targets an id no activity declares.
    UnknownSuccessor,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Checks activity ids for uniqueness and every successor edge for a known
/// target. Reports all issues, not just the first.
pub fn validate_problem(problem: &PspMaxProblem) -> ValidationResult {
    let mut errors = Vec::new();

    let mut ids = HashSet::new();
    for activity in &problem.activities {
        if !ids.insert(activity.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateActivityId,
                format!("Duplicate activity ID: {}", activity.id),
            ));
        }
    }

    for activity in &problem.activities {
        for successor in &activity.successors {
            if !ids.contains(&successor.activity) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownSuccessor,
                    format!(
                        "Activity {} has a successor edge to unknown activity {}",
                        activity.id, successor.activity
                    ),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_psp_max;

    #[test]
    fn valid_instance() {
        let psp = parse_psp_max(include_str!("../../testdata/psp1.sch")).unwrap();

        assert_eq!(validate_problem(&psp), Ok(()));
    }

    #[test]
    fn unknown_successor() {
        let psp = parse_psp_max("0 1\n0 1 1 7 [5]\n1 1 0\n0 1 0 0\n1 1 2 3\n10\n").unwrap();

        let errors = validate_problem(&psp).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::UnknownSuccessor);
        assert!(errors[0].message.contains("unknown activity 7"));
    }

    #[test]
    fn duplicate_ids_are_all_reported() {
        let psp =
            parse_psp_max("1 1\n0 1 1 9 [1]\n0 1 0\n2 1 0\n0 1 0 0\n1 1 1 0\n2 1 1 0\n1\n").unwrap();

        let kinds: Vec<_> = validate_problem(&psp)
            .unwrap_err()
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ValidationErrorKind::DuplicateActivityId,
                ValidationErrorKind::UnknownSuccessor
            ]
        );
    }
}
