//! Render compiled expressions back to canonical text
//!
//! Used by diagnostics and by the template writers to show the effective
//! form of a policy after compilation (operator rewriting included).

use crate::values::format_duration;
use crate::values::format_size;
use policykoll_types::BoolNode;
use policykoll_types::BoolOp;
use policykoll_types::CompareTriplet;
use policykoll_types::CompareValue;
use policykoll_types::ConfigError;
use policykoll_types::Criterion;
use policykoll_types::ErrorKind;
use policykoll_types::FileClassSet;

/// Render one condition as `<criterion> <op> <value>`
#[must_use]
pub fn render_condition(triplet: &CompareTriplet) -> String {
    let name = match (triplet.criterion, &triplet.xattr_name) {
        (Criterion::Xattr, Some(key)) => format!("xattr.{key}"),
        _ => triplet.criterion.to_string(),
    };
    let value = match &triplet.value {
        // xattr values print bare, everything string-like prints quoted
        CompareValue::Str(s) if triplet.criterion == Criterion::Xattr => s.to_string(),
        CompareValue::Str(s) => format!("\"{s}\""),
        CompareValue::Type(t) => format!("\"{t}\""),
        CompareValue::Int(i) => i.to_string(),
        CompareValue::Size(s) => format_size(*s),
        CompareValue::Duration(d) => format_duration(*d),
    };
    format!("{name} {} {value}", triplet.op)
}

/// Render a whole compiled expression. Class references are expanded to
/// the referenced class's definition.
pub fn render_bool_expr(
    node: &BoolNode,
    classes: &FileClassSet,
) -> Result<String, ConfigError> {
    let mut out = String::new();
    write_expr(&mut out, node, classes)?;
    Ok(out)
}

fn write_expr(
    out: &mut String,
    node: &BoolNode,
    classes: &FileClassSet,
) -> Result<(), ConfigError> {
    match node {
        BoolNode::Condition(triplet) => {
            out.push_str(&render_condition(triplet));
            Ok(())
        }
        BoolNode::Unary {
            op: BoolOp::Not,
            child,
        } => {
            out.push_str("NOT (");
            write_expr(out, child, classes)?;
            out.push(')');
            Ok(())
        }
        BoolNode::Unary { op, .. } => Err(ConfigError::new(
            ErrorKind::InvalidOperator,
            format!("Unexpected unary operator '{op}' in expression"),
        )),
        BoolNode::Binary {
            op: op @ (BoolOp::And | BoolOp::Or),
            left,
            right,
        } => {
            out.push('(');
            write_expr(out, left, classes)?;
            out.push_str(") ");
            out.push_str(if *op == BoolOp::Or { "OR" } else { "AND" });
            out.push_str(" (");
            write_expr(out, right, classes)?;
            out.push(')');
            Ok(())
        }
        BoolNode::Binary { op, .. } => Err(ConfigError::new(
            ErrorKind::InvalidOperator,
            format!("Unexpected binary operator '{op}' in expression"),
        )),
        BoolNode::ClassRef(id) => {
            let class = classes.get(*id).ok_or_else(|| {
                ConfigError::new(
                    ErrorKind::UndefinedClass,
                    "Dangling file class reference in expression",
                )
            })?;
            write_expr(out, &class.definition, classes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policykoll_types::AttrMask;
    use policykoll_types::CompareOp;
    use policykoll_types::FileClass;
    use policykoll_types::FileType;
    use policykoll_types::TripletFlags;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_condition_values() {
        assert_eq!(
            render_condition(&CompareTriplet::new(
                Criterion::Size,
                CompareOp::More,
                CompareValue::Size(10 * 1024 * 1024),
            )),
            "size > 10.00 MB"
        );
        assert_eq!(
            render_condition(&CompareTriplet::new(
                Criterion::LastMod,
                CompareOp::MoreOrEqual,
                CompareValue::Duration(2 * 86_400 + 3 * 3600),
            )),
            "last_mod >= 2d3h"
        );
        assert_eq!(
            render_condition(&CompareTriplet::new(
                Criterion::Type,
                CompareOp::Equal,
                CompareValue::Type(FileType::Symlink),
            )),
            "type == \"symlink\""
        );
        assert_eq!(
            render_condition(&CompareTriplet::new(
                Criterion::Depth,
                CompareOp::Less,
                CompareValue::Int(4),
            )),
            "depth < 4"
        );
    }

    #[test]
    fn test_render_like_condition() {
        let triplet = CompareTriplet {
            criterion: Criterion::Path,
            op: CompareOp::Like,
            value: CompareValue::Str("/data/*/tmp".into()),
            xattr_name: None,
            flags: TripletFlags::ANY_LEVEL,
        };
        assert_eq!(render_condition(&triplet), "path  =~  \"/data/*/tmp\"");
    }

    #[test]
    fn test_render_xattr_condition() {
        let triplet = CompareTriplet {
            criterion: Criterion::Xattr,
            op: CompareOp::Equal,
            value: CompareValue::Str("apollo".into()),
            xattr_name: Some("user.project".into()),
            flags: TripletFlags::empty(),
        };
        assert_eq!(render_condition(&triplet), "xattr.user.project == apollo");
    }

    #[test]
    fn test_render_tree() {
        let classes = FileClassSet::new();
        let node = BoolNode::Binary {
            op: BoolOp::Or,
            left: Box::new(BoolNode::condition(
                Criterion::Owner,
                CompareOp::Equal,
                CompareValue::Str("root".into()),
            )),
            right: Box::new(BoolNode::Unary {
                op: BoolOp::Not,
                child: Box::new(BoolNode::condition(
                    Criterion::Size,
                    CompareOp::Less,
                    CompareValue::Size(1024),
                )),
            }),
        };
        assert_eq!(
            render_bool_expr(&node, &classes).unwrap(),
            "(owner == \"root\") OR (NOT (size < 1.00 KB))"
        );
    }

    #[test]
    fn test_render_expands_class_refs() {
        let mut classes = FileClassSet::new();
        let id = classes.add(FileClass {
            name: "hot".into(),
            definition: BoolNode::condition(
                Criterion::LastAccess,
                CompareOp::Less,
                CompareValue::Duration(3600),
            ),
            attr_mask: AttrMask::LAST_ACCESS,
        });
        let node = BoolNode::Unary {
            op: BoolOp::Not,
            child: Box::new(BoolNode::ClassRef(id)),
        };
        assert_eq!(
            render_bool_expr(&node, &classes).unwrap(),
            "NOT (last_access < 1h)"
        );
    }

    #[test]
    fn test_render_rejects_misplaced_operator() {
        let classes = FileClassSet::new();
        let node = BoolNode::Unary {
            op: BoolOp::And,
            child: Box::new(BoolNode::condition(
                Criterion::Depth,
                CompareOp::Equal,
                CompareValue::Int(1),
            )),
        };
        assert!(render_bool_expr(&node, &classes).is_err());
    }
}
