//! Criteria compilation: one `name OP value` item to one compiled triplet
//!
//! Resolves the criterion, parses the typed value, enforces the
//! criterion's parsing flags, rewrites equality operators to their
//! wildcard forms when the operand carries globs, and folds the
//! criterion's attribute requirements into the caller's running mask.

use crate::params::contains_wildcards;
use crate::values;
use compact_str::CompactString;
use policykoll_syntax::ItemOp;
use policykoll_syntax::KeyValue;
use policykoll_types::AttrMask;
use policykoll_types::CompareOp;
use policykoll_types::CompareTriplet;
use policykoll_types::CompareValue;
use policykoll_types::ConfigError;
use policykoll_types::Criterion;
use policykoll_types::ErrorKind;
use policykoll_types::ParamFlags;
use policykoll_types::StatusManagerInstance;
use policykoll_types::TripletFlags;
use policykoll_types::criteria::ValueKind;

fn syntax_op(op: ItemOp) -> CompareOp {
    match op {
        ItemOp::Assign | ItemOp::Equal => CompareOp::Equal,
        ItemOp::NotEqual => CompareOp::NotEqual,
        ItemOp::Less => CompareOp::Less,
        ItemOp::LessOrEqual => CompareOp::LessOrEqual,
        ItemOp::More => CompareOp::More,
        ItemOp::MoreOrEqual => CompareOp::MoreOrEqual,
    }
}

fn criteria_error(kind: ErrorKind, kv: &KeyValue, message: String) -> ConfigError {
    ConfigError::at(kind, message, kv.line)
}

/// Interpret one condition of a policy match block.
///
/// `smi` is the status manager of the enclosing policy, when there is one;
/// `status` conditions are only legal with it in scope. The attribute
/// requirements of the compiled condition are OR-ed into `attr_mask`.
pub fn interpret_condition(
    kv: &KeyValue,
    attr_mask: &mut AttrMask,
    smi: Option<&StatusManagerInstance>,
) -> Result<CompareTriplet, ConfigError> {
    let Some(criterion) = Criterion::from_name(&kv.name) else {
        return Err(criteria_error(
            ErrorKind::UnknownCriterion,
            kv,
            format!("Unknown or unsupported criteria '{}'", kv.name),
        ));
    };
    let descr = criterion.descriptor();
    let flags = descr.parsing_flags;

    // a status criterion needs its manager in scope, and consults the
    // manager's own attribute bit instead of a generic one
    let mut status_manager = None;
    if flags.contains(ParamFlags::STATUS) {
        let Some(smi) = smi else {
            return Err(criteria_error(
                ErrorKind::ConstraintViolated,
                kv,
                format!("'{}' criteria is not expected in this context", kv.name),
            ));
        };
        *attr_mask |= smi.attr_bit();
        status_manager = Some(smi);
    } else {
        *attr_mask |= descr.attr_mask;
    }

    let mut op = syntax_op(kv.op);
    let mut triplet_flags = TripletFlags::empty();
    let mut xattr_name = None;

    let value = match descr.value_kind {
        ValueKind::Str => {
            let mut value = kv.value.clone();

            if flags.contains(ParamFlags::NOT_EMPTY) && value.is_empty() {
                return Err(criteria_error(
                    ErrorKind::ConstraintViolated,
                    kv,
                    format!("Non-empty string expected for {} criteria", kv.name),
                ));
            }
            if flags.contains(ParamFlags::NO_SLASH) && value.contains('/') {
                return Err(criteria_error(
                    ErrorKind::ConstraintViolated,
                    kv,
                    format!("No slash (/) expected in {} criteria", kv.name),
                ));
            }

            // glob operands turn equality into pattern matching
            if contains_wildcards(&value) {
                if flags.contains(ParamFlags::NO_WILDCARDS) {
                    return Err(criteria_error(
                        ErrorKind::ConstraintViolated,
                        kv,
                        format!("No wildcard is allowed in {} criteria", kv.name),
                    ));
                }
                if op == CompareOp::Equal {
                    op = CompareOp::Like;
                } else if op == CompareOp::NotEqual {
                    op = CompareOp::Unlike;
                }
            }

            if flags.contains(ParamFlags::XATTR) {
                // criterion name has the form xattr.<key>
                xattr_name = kv
                    .name
                    .split_once('.')
                    .map(|(_, key)| CompactString::from(key));
            } else if let Some(smi) = status_manager {
                if !smi.has_status(&value) {
                    return Err(criteria_error(
                        ErrorKind::ConstraintViolated,
                        kv,
                        format!(
                            "Invalid status '{}' for '{}' status manager: allowed values are {}",
                            value,
                            smi.name(),
                            smi.allowed_values()
                        ),
                    ));
                }
            } else if value.contains("**") {
                if flags.contains(ParamFlags::ALLOW_ANY_DEPTH) {
                    value = rewrite_any_level(&value, kv)?;
                    triplet_flags |= TripletFlags::ANY_LEVEL;
                } else {
                    return Err(criteria_error(
                        ErrorKind::ConstraintViolated,
                        kv,
                        format!(
                            "Double star wildcard (**) not expected in {} criteria",
                            kv.name
                        ),
                    ));
                }
            }

            CompareValue::Str(value)
        }
        ValueKind::Size => {
            let size = values::parse_size(&kv.value).map_err(|_| {
                criteria_error(
                    ErrorKind::ParseError,
                    kv,
                    format!(
                        "{} criteria: invalid format for size: '{}'",
                        kv.name, kv.value
                    ),
                )
            })?;
            check_not_null(u128::from(size), flags, kv)?;
            CompareValue::Size(size)
        }
        ValueKind::Int => {
            let int = values::parse_int(&kv.value).map_err(|_| {
                criteria_error(
                    ErrorKind::ParseError,
                    kv,
                    format!("{} criteria: integer expected: '{}'", kv.name, kv.value),
                )
            })?;
            if flags.contains(ParamFlags::POSITIVE) && int < 0 {
                return Err(criteria_error(
                    ErrorKind::ConstraintViolated,
                    kv,
                    format!("Positive value expected for {} criteria", kv.name),
                ));
            }
            check_not_null(u128::from(int.unsigned_abs()), flags, kv)?;
            CompareValue::Int(int)
        }
        ValueKind::Duration => {
            let duration = values::parse_duration(&kv.value).map_err(|_| {
                criteria_error(
                    ErrorKind::ParseError,
                    kv,
                    format!("{} criteria: duration expected: '{}'", kv.name, kv.value),
                )
            })?;
            check_not_null(u128::from(duration), flags, kv)?;
            CompareValue::Duration(duration)
        }
        ValueKind::Type => {
            let file_type = values::parse_file_type(&kv.value).map_err(|_| {
                criteria_error(
                    ErrorKind::ParseError,
                    kv,
                    "Illegal condition on type: file, directory, symlink, chr, blk, \
                     fifo or sock expected."
                        .to_owned(),
                )
            })?;
            CompareValue::Type(file_type)
        }
    };

    // ordering comparators are only legal on comparable criteria
    if !flags.contains(ParamFlags::COMPARABLE) && !op.is_equality() {
        return Err(criteria_error(
            ErrorKind::InvalidOperator,
            kv,
            format!(
                "Illegal comparator for {} criteria: == or != expected",
                kv.name
            ),
        ));
    }

    Ok(CompareTriplet {
        criterion,
        op,
        value,
        xattr_name,
        flags: triplet_flags,
    })
}

fn check_not_null(value: u128, flags: ParamFlags, kv: &KeyValue) -> Result<(), ConfigError> {
    if flags.contains(ParamFlags::NOT_NULL) && value == 0 {
        return Err(criteria_error(
            ErrorKind::ConstraintViolated,
            kv,
            format!("Null value not allowed for {} criteria", kv.name),
        ));
    }
    Ok(())
}

/// Validate and rewrite a pattern containing the `**` any-level token.
///
/// Every `**` must be flanked by `/` on each side that is not a string
/// boundary. Unescaped `?` becomes `[!/]` (single character, any but the
/// path separator) and `**` becomes `*` so the result works with plain
/// shell-glob matching; the caller marks the triplet `ANY_LEVEL`.
fn rewrite_any_level(pattern: &str, kv: &KeyValue) -> Result<CompactString, ConfigError> {
    let bytes = pattern.as_bytes();
    let mut from = 0;
    while let Some(found) = pattern[from..].find("**") {
        let pos = from + found;
        let before_ok = pos == 0 || bytes[pos - 1] == b'/';
        let after_ok = pos + 2 >= bytes.len() || bytes[pos + 2] == b'/';
        if !before_ok || !after_ok {
            return Err(criteria_error(
                ErrorKind::ConstraintViolated,
                kv,
                format!("Character before and after '**' must be a '/' in '{pattern}'"),
            ));
        }
        from = pos + 2;
    }

    if has_lone_star(pattern) {
        tracing::warn!(
            "Pattern '{pattern}' mixes '*' and '**': after rewriting, a single '*' \
             also matches any depth"
        );
    }

    let mut out = CompactString::with_capacity(pattern.len() + 8);
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push('\\');
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '?' => out.push_str("[!/]"),
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                }
                out.push('*');
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Does the pattern contain a `*` run of length exactly one?
fn has_lone_star(pattern: &str) -> bool {
    let mut run = 0usize;
    for c in pattern.chars() {
        if c == '*' {
            run += 1;
        } else {
            if run == 1 {
                return true;
            }
            run = 0;
        }
    }
    run == 1
}
