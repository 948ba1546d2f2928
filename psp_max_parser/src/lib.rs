// The instance grammar is positional: the header counts decide how many lines
// each block has. chumsky tokenizes the text, the counts are applied afterwards.

use std::{fs, path::Path, path::PathBuf};

use chumsky::{prelude::*, Parser};
use log::{debug, trace, warn};
use structs::{PspMaxActivity, PspMaxProblem, PspMaxResource, PspMaxSuccessor};
use thiserror::Error;

pub mod structs;
pub mod validation;

#[derive(Debug, Error)]
pub enum PspMaxParseError {
    #[error("could not read instance file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ParseError occurred: {}", first_error(.0))]
    ParseError(Vec<Simple<char>>),
    #[error("instance is empty, expected a header line")]
    MissingHeader,
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },
    #[error("line {line}: missing {field}")]
    MissingField { line: usize, field: &'static str },
    #[error("line {line}: {field} must be a plain integer, found a bracketed one")]
    UnexpectedBracket { line: usize, field: &'static str },
    #[error("line {line}: invalid {field} {value}")]
    InvalidValue {
        line: usize,
        field: &'static str,
        value: i64,
    },
    #[error("line {line}: activity index {index} out of range ({count} activities)")]
    ActivityIndexOutOfRange {
        line: usize,
        index: usize,
        count: usize,
    },
    #[error("line {line}: resource usage of activity {index} given twice")]
    DuplicateResourceUsage { line: usize, index: usize },
}

fn first_error(errors: &[Simple<char>]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}

/// Parses an RCPSP/max instance from its textual representation.
pub fn parse_psp_max(content: &str) -> Result<PspMaxProblem, PspMaxParseError> {
    let lines = crate::lines_parser()
        .parse(content)
        .map_err(PspMaxParseError::ParseError)?;
    trace!("tokenized {} lines", lines.len());

    let problem = decode(lines)?;
    debug!(
        "parsed instance with {} activities, {} resources and {} successors",
        problem.activities.len(),
        problem.resources.len(),
        problem.successor_count()
    );

    Ok(problem)
}

/// Reads and parses an instance file, remembering its path as the source.
pub fn parse_psp_max_file(path: impl AsRef<Path>) -> Result<PspMaxProblem, PspMaxParseError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| PspMaxParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut problem = parse_psp_max(&content)?;
    problem.source = Some(path.display().to_string());

    Ok(problem)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    Int(i64),
    Bracketed(i64),
}

pub(crate) fn token_parser() -> impl Parser<char, Token, Error = Simple<char>> + Clone {
    let int = just('-')
        .or_not()
        .chain::<char, _, _>(filter(|c: &char| c.is_ascii_digit()).repeated().at_least(1))
        .collect::<String>()
        .try_map(|digits, span| {
            digits
                .parse::<i64>()
                .map_err(|e| Simple::custom(span, format!("invalid integer {digits}: {e}")))
        })
        .labelled("integer");

    let bracketed = int
        .clone()
        .delimited_by(just('['), just(']'))
        .map(Token::Bracketed)
        .labelled("bracketed integer");

    int.map(Token::Int).or(bracketed)
}

pub(crate) fn lines_parser() -> impl Parser<char, Vec<Vec<Token>>, Error = Simple<char>> {
    let blank = one_of(" \t\r").repeated();

    // tokens need at least one blank between them, `1-5` is not two tokens
    let line = blank
        .clone()
        .ignore_then(
            crate::token_parser()
                .separated_by(blank.clone().at_least(1))
                .allow_trailing(),
        )
        .then_ignore(blank);

    line.separated_by(just('\n')).then_ignore(end())
}

struct LineFields<'a> {
    line: usize,
    tokens: std::slice::Iter<'a, Token>,
}

impl<'a> LineFields<'a> {
    fn new(line: usize, tokens: &'a [Token]) -> Self {
        Self {
            line,
            tokens: tokens.iter(),
        }
    }

    fn next(&mut self, field: &'static str) -> Result<Token, PspMaxParseError> {
        self.tokens
            .next()
            .copied()
            .ok_or(PspMaxParseError::MissingField {
                line: self.line,
                field,
            })
    }

    fn int(&mut self, field: &'static str) -> Result<i64, PspMaxParseError> {
        match self.next(field)? {
            Token::Int(value) => Ok(value),
            Token::Bracketed(_) => Err(PspMaxParseError::UnexpectedBracket {
                line: self.line,
                field,
            }),
        }
    }

    fn unsigned<T: TryFrom<i64>>(&mut self, field: &'static str) -> Result<T, PspMaxParseError> {
        let value = self.int(field)?;
        T::try_from(value).map_err(|_| PspMaxParseError::InvalidValue {
            line: self.line,
            field,
            value,
        })
    }

    // distances are the only fields that may carry brackets
    fn distance(&mut self, field: &'static str) -> Result<i64, PspMaxParseError> {
        match self.next(field)? {
            Token::Int(value) | Token::Bracketed(value) => Ok(value),
        }
    }

    fn remaining(&self) -> usize {
        self.tokens.len()
    }
}

fn decode(lines: Vec<Vec<Token>>) -> Result<PspMaxProblem, PspMaxParseError> {
    let mut lines = lines
        .into_iter()
        .enumerate()
        .map(|(index, tokens)| (index + 1, tokens))
        .filter(|(_, tokens)| !tokens.is_empty());

    let (line, header) = lines.next().ok_or(PspMaxParseError::MissingHeader)?;
    let mut header = LineFields::new(line, &header);
    let activity_count: usize = header.unsigned("activity count")?;
    let resource_count: usize = header.unsigned("resource count")?;
    // start and end milestones are not part of the activity count
    let total = activity_count.saturating_add(2);

    let mut activities = Vec::new();
    for _ in 0..total {
        let (line, tokens) = lines.next().ok_or(PspMaxParseError::UnexpectedEof {
            expected: "activity line",
        })?;
        activities.push(read_activity(LineFields::new(line, &tokens))?);
    }

    let mut usage_seen = vec![false; total];
    for _ in 0..total {
        let (line, tokens) = lines.next().ok_or(PspMaxParseError::UnexpectedEof {
            expected: "resource usage line",
        })?;
        let mut fields = LineFields::new(line, &tokens);

        let index: usize = fields.unsigned("activity index")?;
        let count = activities.len();
        let activity =
            activities
                .get_mut(index)
                .ok_or(PspMaxParseError::ActivityIndexOutOfRange { line, index, count })?;
        if std::mem::replace(&mut usage_seen[index], true) {
            return Err(PspMaxParseError::DuplicateResourceUsage { line, index });
        }

        fields.int("mode")?;
        // zero durations cannot be expressed downstream
        let duration = fields.int("duration")?.max(1);
        activity.duration = u32::try_from(duration).map_err(|_| PspMaxParseError::InvalidValue {
            line,
            field: "duration",
            value: duration,
        })?;

        let mut resource_usage = Vec::new();
        for _ in 0..resource_count {
            resource_usage.push(fields.unsigned("resource usage")?);
        }
        activity.resource_usage = resource_usage;
    }

    let (line, tokens) = lines.next().ok_or(PspMaxParseError::UnexpectedEof {
        expected: "resource capacity line",
    })?;
    let mut fields = LineFields::new(line, &tokens);
    let mut resources = Vec::new();
    for id in 0..resource_count {
        resources.push(PspMaxResource {
            id,
            capacity: fields.unsigned("resource capacity")?,
        });
    }

    if let Some((line, _)) = lines.next() {
        warn!("ignoring trailing input starting at line {line}");
    }

    Ok(PspMaxProblem {
        source: None,
        activities,
        resources,
    })
}

fn read_activity(mut fields: LineFields<'_>) -> Result<PspMaxActivity, PspMaxParseError> {
    let id = fields.unsigned("activity id")?;
    fields.int("mode count")?;
    let successor_count: usize = fields.unsigned("successor count")?;

    let mut targets = Vec::new();
    for _ in 0..successor_count {
        targets.push(fields.unsigned("successor id")?);
    }

    let mut successors = Vec::new();
    for activity in targets {
        successors.push(PspMaxSuccessor {
            activity,
            distance: fields.distance("successor distance")?,
        });
    }

    if fields.remaining() > 0 {
        trace!(
            "line {}: ignoring {} extra tokens",
            fields.line,
            fields.remaining()
        );
    }

    Ok(PspMaxActivity {
        id,
        duration: 1,
        resource_usage: vec![],
        successors,
    })
}
