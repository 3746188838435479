//! Requirement tree parser.
//!
//! Turns untyped JSON objects into validated [`RequirementNode`] trees, and
//! builds [`Course`] and [`Program`] records on top of that. Parsing is purely
//! structural: no satisfaction logic runs here.
//!
//! # Accepted vocabulary
//!
//! | Key | Aliases | Used by |
//! |-----|---------|---------|
//! | `type` | | every node |
//! | `course` | `code` | COURSE |
//! | `timing` | | COURSE (default `COMPLETED`) |
//! | `level` | | LEVEL, PLACEMENT |
//! | `subject` | `placement` | PLACEMENT |
//! | `authority` | | PERMISSION (default `Instructor`) |
//! | `gpa` | `minimum` | GPA |
//! | `other` | `description` | OTHER |
//! | `requirements` | `children` | AND, OR, CREDITS_FROM, CHOOSE_N |
//! | `credits_required` | | CREDITS_FROM |
//! | `choose` | `n` | CHOOSE_N |
//! | `credited` | | CREDITS_FROM, CHOOSE_N (optional) |
//!
//! Errors carry a path to the offending node, e.g.
//! `requisite.requirements[2].choose`.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::models::{
    normalize_code, normalize_subject, Course, OfferingPattern, PlacementLevel, Program,
    RequirementKind, RequirementNode, StandingLevel, Timing,
};
use crate::validation::{ValidationError, ValidationErrorKind};

type ParseResult<T> = Result<T, ValidationError>;

const ROOT: &str = "requisite";

/// Parses one requirement node.
pub fn parse_requirement(value: &Value) -> ParseResult<RequirementNode> {
    parse_node(value, ROOT)
}

/// Parses a course requisite: an object, a list (AND-combined), or null.
pub fn parse_requisite(value: &Value) -> ParseResult<RequirementNode> {
    match value {
        Value::Null => Ok(RequirementNode::None),
        Value::Array(items) => Ok(RequirementNode::all_of(parse_list(items, ROOT)?)),
        _ => parse_node(value, ROOT),
    }
}

/// Parses a program's root requirement list.
///
/// A list is taken as is; a single node becomes a one-element list, except
/// an AND node, which is unwrapped into its children.
pub fn parse_root_requisite(value: &Value) -> ParseResult<Vec<RequirementNode>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => parse_list(items, ROOT),
        _ => match parse_node(value, ROOT)? {
            RequirementNode::And { children } => Ok(children),
            RequirementNode::None => Ok(Vec::new()),
            node => Ok(vec![node]),
        },
    }
}

/// Builds a course from an untyped catalog record.
///
/// `min_credits` is required; `max_credits` defaults to it. `requisite` may
/// be an object or a list; tags are read from `bricks` or `tags`.
pub fn parse_course(value: &Value) -> ParseResult<Course> {
    let obj = as_object(value, "course")?;

    let code = required_str(obj, &["code"], "course")?;
    let min_credits = match obj.get("min_credits") {
        Some(Value::Null) | None => return Err(missing("course", "min_credits")),
        Some(v) => number(v, "course.min_credits")?,
    };
    let max_credits = match obj.get("max_credits") {
        Some(Value::Null) | None => min_credits,
        Some(v) => number(v, "course.max_credits")?,
    };
    let offering_pattern = obj
        .get("pattern")
        .and_then(Value::as_str)
        .map(OfferingPattern::parse)
        .unwrap_or_default();
    let raw_requisite = match obj.get("requisite") {
        Some(v) => parse_requisite(v).map_err(|e| nest(e, "course"))?,
        None => RequirementNode::None,
    };
    let tags = match lookup(obj, &["bricks", "tags"]) {
        Some(v) => string_list(v, "course.bricks")?,
        None => Vec::new(),
    };

    Ok(Course {
        code: normalize_code(code),
        name: optional_str(obj, &["name"]).unwrap_or_default().to_string(),
        min_credits,
        max_credits,
        offering_pattern,
        raw_requisite,
        tags,
    })
}

/// Builds a program from an untyped program record.
pub fn parse_program(value: &Value) -> ParseResult<Program> {
    let obj = as_object(value, "program")?;

    let code = required_str(obj, &["code"], "program")?;
    let total_credits_required = match lookup(obj, &["total_credits_required", "credits"]) {
        Some(Value::Null) | None => 0.0,
        Some(v) => number(v, "program.credits")?,
    };
    let catalog_year = match obj.get("catalog_year") {
        Some(Value::Null) | None => None,
        Some(v) => Some(number(v, "program.catalog_year")? as i32),
    };
    let root_requisite = match obj.get("requisite") {
        Some(v) => parse_root_requisite(v).map_err(|e| nest(e, "program"))?,
        None => Vec::new(),
    };

    Ok(Program {
        code: code.trim().to_string(),
        name: optional_str(obj, &["name", "program_name"])
            .unwrap_or_default()
            .to_string(),
        program_type: optional_str(obj, &["program_type"])
            .unwrap_or_default()
            .to_string(),
        catalog_year,
        total_credits_required,
        root_requisite,
    })
}

fn parse_node(value: &Value, path: &str) -> ParseResult<RequirementNode> {
    let obj = as_object(value, path)?;

    let tag = required_str(obj, &["type"], path)?;
    let kind = RequirementKind::from_tag(&tag.trim().to_ascii_uppercase()).ok_or_else(|| {
        ValidationError::new(
            ValidationErrorKind::UnknownType,
            format!("{path}.type"),
            format!("unknown requirement type '{tag}'"),
        )
    })?;

    let node = match kind {
        RequirementKind::None => RequirementNode::None,
        RequirementKind::Course => {
            let code = required_str(obj, &["course", "code"], path)?;
            let timing = match optional_str(obj, &["timing"]) {
                Some(raw) => raw.parse::<Timing>().map_err(|msg| {
                    ValidationError::new(
                        ValidationErrorKind::InvalidValue,
                        format!("{path}.timing"),
                        msg,
                    )
                })?,
                None => Timing::default(),
            };
            RequirementNode::course_with_timing(code, timing)
        }
        RequirementKind::Level => {
            let raw = required_str(obj, &["level"], path)?;
            let level = raw.to_lowercase().parse::<StandingLevel>().map_err(|msg| {
                ValidationError::new(
                    ValidationErrorKind::InvalidValue,
                    format!("{path}.level"),
                    msg,
                )
            })?;
            RequirementNode::level(level)
        }
        RequirementKind::Placement => {
            let subject = required_str(obj, &["subject", "placement"], path)?;
            let level = match obj.get("level") {
                Some(v) => placement_level(v, &format!("{path}.level"))?,
                None => return Err(missing(path, "level")),
            };
            RequirementNode::Placement {
                subject: normalize_subject(subject),
                level,
            }
        }
        RequirementKind::Permission => RequirementNode::permission(
            optional_str(obj, &["authority"]).unwrap_or("Instructor"),
        ),
        RequirementKind::Gpa => {
            let v = lookup(obj, &["gpa", "minimum"]).ok_or_else(|| missing(path, "gpa"))?;
            RequirementNode::gpa(number(v, &format!("{path}.gpa"))?)
        }
        RequirementKind::Other => RequirementNode::other(
            optional_str(obj, &["other", "description"]).unwrap_or_default(),
        ),
        RequirementKind::And => RequirementNode::and(children(obj, path, kind)?),
        RequirementKind::Or => RequirementNode::or(children(obj, path, kind)?),
        RequirementKind::CreditsFrom => {
            let field = format!("{path}.credits_required");
            let v = obj
                .get("credits_required")
                .ok_or_else(|| missing(path, "credits_required"))?;
            let credits_required = number(v, &field)?;
            if credits_required < 0.0 {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidValue,
                    field,
                    format!("credits_required must be non-negative, got {credits_required}"),
                ));
            }
            RequirementNode::CreditsFrom {
                credits_required,
                children: children(obj, path, kind)?,
                credited: credited(obj, path)?,
            }
        }
        RequirementKind::ChooseN => {
            let field = format!("{path}.choose");
            let v = lookup(obj, &["choose", "n"]).ok_or_else(|| missing(path, "choose"))?;
            let n = number(v, &field)?;
            if n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidValue,
                    field,
                    format!("choose must be a non-negative integer, got {n}"),
                ));
            }
            RequirementNode::ChooseN {
                n: n as u32,
                children: children(obj, path, kind)?,
                credited: credited(obj, path)?,
            }
        }
    };

    Ok(node)
}

fn parse_list(items: &[Value], path: &str) -> ParseResult<Vec<RequirementNode>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_node(item, &format!("{path}[{i}]")))
        .collect()
}

fn children(
    obj: &Map<String, Value>,
    path: &str,
    kind: RequirementKind,
) -> ParseResult<Vec<RequirementNode>> {
    let items = match lookup(obj, &["requirements", "children"]) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ValidationError::new(
                ValidationErrorKind::MissingField,
                format!("{path}.requirements"),
                "requirements must be a list",
            ))
        }
        None => return Err(missing(path, "requirements")),
    };
    if items.is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::EmptyChildren,
            format!("{path}.requirements"),
            format!("{kind} requirement has no children"),
        ));
    }
    parse_list(items, &format!("{path}.requirements"))
}

fn credited(obj: &Map<String, Value>, path: &str) -> ParseResult<BTreeSet<String>> {
    match obj.get("credited") {
        None | Some(Value::Null) => Ok(BTreeSet::new()),
        Some(v) => Ok(string_list(v, &format!("{path}.credited"))?
            .iter()
            .map(|code| normalize_code(code))
            .collect()),
    }
}

/// Reads a number, accepting numeric strings such as `"2.5"`.
fn number(value: &Value, path: &str) -> ParseResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).ok_or_else(|| {
        ValidationError::new(
            ValidationErrorKind::NotANumber,
            path,
            format!("expected a number, got {value}"),
        )
    })
}

/// Placement tiers arrive as numbers or strings; both become canonical text.
fn placement_level(value: &Value, path: &str) -> ParseResult<PlacementLevel> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(rank) => Ok(PlacementLevel::new(rank.to_string())),
            None => Err(ValidationError::new(
                ValidationErrorKind::NotANumber,
                path,
                format!("placement level must be a non-negative integer, got {n}"),
            )),
        },
        Value::String(s) if !s.trim().is_empty() => Ok(PlacementLevel::new(s)),
        _ => Err(ValidationError::new(
            ValidationErrorKind::InvalidValue,
            path,
            format!("invalid placement level {value}"),
        )),
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> ParseResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        ValidationError::new(
            ValidationErrorKind::InvalidValue,
            path,
            format!("expected an object, got {value}"),
        )
    })
}

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn optional_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    lookup(obj, keys).and_then(Value::as_str)
}

fn required_str<'a>(obj: &'a Map<String, Value>, keys: &[&str], path: &str) -> ParseResult<&'a str> {
    optional_str(obj, keys)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| missing(path, keys[0]))
}

fn string_list(value: &Value, path: &str) -> ParseResult<Vec<String>> {
    let items = value.as_array().ok_or_else(|| {
        ValidationError::new(ValidationErrorKind::InvalidValue, path, "expected a list of strings")
    })?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                ValidationError::new(
                    ValidationErrorKind::InvalidValue,
                    format!("{path}[{i}]"),
                    format!("expected a string, got {item}"),
                )
            })
        })
        .collect()
}

fn missing(path: &str, field: &str) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::MissingField,
        format!("{path}.{field}"),
        format!("missing field '{field}'"),
    )
}

fn nest(mut error: ValidationError, prefix: &str) -> ValidationError {
    error.path = format!("{prefix}.{}", error.path);
    error
}
