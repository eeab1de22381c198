//! Parser for member paths with support for indexed access
//!
//! This module uses nom to parse paths like:
//! - `mass`
//! - `transform.localPosition`
//! - `renderers[0].sharedMaterial`
//! - `grid[1][2].weight`

use std::fmt;

use error_stack::Report;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, digit1};
use nom::combinator::{all_consuming, map, map_res};
use nom::multi::{many0, separated_list1};
use nom::sequence::delimited;
use nom::{IResult, Parser};

use crate::constants::PATH_SEPARATOR;
use crate::error::{Error, Result};

/// One member access, optionally followed by list indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Member name as written
    pub name:    String,
    /// Indices applied to the member's value, in order
    pub indices: Vec<usize>,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for index in &self.indices {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

/// A parsed, non-empty member path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    segments: Vec<PathSegment>,
}

impl PathExpression {
    /// Segments in traversal order
    pub fn segments(&self) -> &[PathSegment] { &self.segments }

    /// Leading segments and the terminal one
    pub fn split_last(&self) -> Option<(&PathSegment, &[PathSegment])> {
        self.segments.split_last()
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Parse a member name (anything but separators, brackets and whitespace)
fn member_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != PATH_SEPARATOR && c != '[' && c != ']' && !c.is_whitespace())(
        input,
    )
}

/// Parse a bracketed non-negative index
fn index(input: &str) -> IResult<&str, usize> {
    delimited(char('['), map_res(digit1, str::parse::<usize>), char(']')).parse(input)
}

/// Parse `name[0][1]`
fn segment(input: &str) -> IResult<&str, PathSegment> {
    map((member_name, many0(index)), |(name, indices)| PathSegment {
        name: name.to_string(),
        indices,
    })
    .parse(input)
}

fn segments(input: &str) -> IResult<&str, Vec<PathSegment>> {
    separated_list1(char(PATH_SEPARATOR), segment).parse(input)
}

/// Parse a complete member path
pub fn parse_path(input: &str) -> Result<PathExpression> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Report::new(Error::path(input, "path is empty")));
    }

    match all_consuming(segments).parse(trimmed) {
        Ok((_, segments)) => Ok(PathExpression { segments }),
        Err(_) => Err(Report::new(Error::path(input, describe_failure(trimmed)))),
    }
}

/// Best explanation for a path the grammar rejected
fn describe_failure(input: &str) -> String {
    let opens = input.matches('[').count();
    let closes = input.matches(']').count();
    if opens != closes {
        return "unbalanced brackets".to_string();
    }

    let mut rest = input;
    while let Some(start) = rest.find('[') {
        let after = &rest[start + 1..];
        let Some(end) = after.find(']') else {
            return "unbalanced brackets".to_string();
        };
        let inner = &after[..end];
        if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_digit()) {
            return format!("index '{inner}' is not a non-negative integer");
        }
        if inner.parse::<usize>().is_err() {
            return format!("index '{inner}' is too large");
        }
        rest = &after[end + 1..];
    }

    if input.starts_with(PATH_SEPARATOR)
        || input.ends_with(PATH_SEPARATOR)
        || input.contains("..")
    {
        return "empty segment".to_string();
    }
    if input.starts_with('[') || input.contains(".[") {
        return "index without a member name".to_string();
    }
    if input.contains(char::is_whitespace) {
        return "member names cannot contain whitespace".to_string();
    }
    "unexpected characters".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn reason(input: &str) -> String {
        let report = parse_path(input).unwrap_err();
        let Error::Path { reason, .. } = report.current_context() else {
            panic!("path error expected for '{input}'");
        };
        reason.clone()
    }

    #[test]
    fn test_parse_nested_indexed_path() {
        let parsed = parse_path("a.b[2].c").unwrap();
        assert_eq!(
            parsed.segments(),
            &[
                PathSegment {
                    name:    "a".to_string(),
                    indices: vec![],
                },
                PathSegment {
                    name:    "b".to_string(),
                    indices: vec![2],
                },
                PathSegment {
                    name:    "c".to_string(),
                    indices: vec![],
                },
            ]
        );
        assert_eq!(parsed.to_string(), "a.b[2].c");
    }

    #[test]
    fn test_multiple_indices() {
        let parsed = parse_path(" grid[1][0].weight ").unwrap();
        assert_eq!(parsed.segments()[0].indices, vec![1, 0]);
    }

    #[test]
    fn test_malformed_paths() {
        assert_eq!(reason("a.b[2"), "unbalanced brackets");
        assert_eq!(reason("a.b]2["), "unbalanced brackets");
        assert_eq!(reason("a.b c"), "member names cannot contain whitespace");
        assert_eq!(reason("a.b[x].c"), "index 'x' is not a non-negative integer");
        assert_eq!(reason("a.b[-1]"), "index '-1' is not a non-negative integer");
        assert_eq!(reason("a..b"), "empty segment");
        assert_eq!(reason("a.b."), "empty segment");
        assert_eq!(reason("[0].a"), "index without a member name");
        assert_eq!(reason("   "), "path is empty");
    }
}
