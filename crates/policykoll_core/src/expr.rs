//! Boolean and set expression builders
//!
//! [`get_bool_expr`] compiles the boolean expression of a policy match
//! block into a [`BoolNode`] tree, accumulating the attribute mask of
//! every condition. [`get_set_expr`] compiles a union/intersection/negation
//! over previously registered file classes; referenced classes enter the
//! tree as non-owning [`BoolNode::ClassRef`] nodes.

use crate::criteria::interpret_condition;
use policykoll_syntax::Block;
use policykoll_syntax::BoolExpr;
use policykoll_syntax::ConfigItem;
use policykoll_syntax::ExprOp;
use policykoll_syntax::SetExpr;
use policykoll_types::AttrMask;
use policykoll_types::BoolNode;
use policykoll_types::BoolOp;
use policykoll_types::ConfigError;
use policykoll_types::ErrorKind;
use policykoll_types::FileClassSet;
use policykoll_types::StatusManagerInstance;

/// Maximum nesting depth of a compiled expression. Deeper inputs are
/// rejected rather than risking the stack on hostile configurations.
pub const MAX_EXPR_DEPTH: usize = 64;

fn too_deep() -> ConfigError {
    ConfigError::new(
        ErrorKind::Unsupported,
        format!("Expression exceeds maximum nesting depth ({MAX_EXPR_DEPTH})"),
    )
}

/// Extract the single expression item a framing block must contain
fn single_item<'a>(block: &'a Block, expected: &str) -> Result<&'a ConfigItem, ConfigError> {
    let mut items = block.items();
    let Some(first) = items.next() else {
        return Err(ConfigError::at(
            ErrorKind::NotFound,
            format!("'{}' block is empty", block.name()),
            block.line(),
        ));
    };
    if items.next().is_some() {
        return Err(ConfigError::at(
            ErrorKind::ParseError,
            format!(
                "A single {expected} is expected in block '{}'",
                block.name()
            ),
            first.line(),
        ));
    }
    Ok(first)
}

/// Compile the boolean expression of a policy block.
///
/// `smi` is the status manager of the enclosing policy, if any; it is
/// needed to validate `status` conditions. Returns the compiled tree and
/// the mask of attributes its conditions consult.
pub fn get_bool_expr(
    block: &Block,
    smi: Option<&StatusManagerInstance>,
) -> Result<(BoolNode, AttrMask), ConfigError> {
    let item = single_item(block, "boolean expression")?;
    let ConfigItem::Bool(expr) = item else {
        return Err(ConfigError::at(
            ErrorKind::ParseError,
            format!("Boolean expression expected in block '{}'", block.name()),
            item.line(),
        ));
    };
    let mut attr_mask = AttrMask::empty();
    let node = build_bool_expr(expr, &mut attr_mask, smi, 0)
        .map_err(|e| e.with_line(expr.line()))?;
    Ok((node, attr_mask))
}

fn build_bool_expr(
    expr: &BoolExpr,
    attr_mask: &mut AttrMask,
    smi: Option<&StatusManagerInstance>,
    depth: usize,
) -> Result<BoolNode, ConfigError> {
    if depth > MAX_EXPR_DEPTH {
        return Err(too_deep());
    }
    match expr {
        BoolExpr::Condition(kv) => {
            let triplet = interpret_condition(kv, attr_mask, smi)?;
            Ok(BoolNode::Condition(Box::new(triplet)))
        }
        // a parenthesized expression: compile the wrapped expression in place
        BoolExpr::Unary {
            op: ExprOp::Identity,
            expr,
            ..
        } => build_bool_expr(expr, attr_mask, smi, depth + 1),
        BoolExpr::Unary {
            op: ExprOp::Not,
            expr,
            ..
        } => {
            let child = build_bool_expr(expr, attr_mask, smi, depth + 1)?;
            Ok(BoolNode::Unary {
                op: BoolOp::Not,
                child: Box::new(child),
            })
        }
        BoolExpr::Binary {
            op: op @ (ExprOp::And | ExprOp::Or),
            left,
            right,
            ..
        } => {
            let op = if *op == ExprOp::And {
                BoolOp::And
            } else {
                BoolOp::Or
            };
            let left = build_bool_expr(left, attr_mask, smi, depth + 1)?;
            let right = build_bool_expr(right, attr_mask, smi, depth + 1)?;
            Ok(BoolNode::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        BoolExpr::Unary { line, .. } | BoolExpr::Binary { line, .. } => Err(ConfigError::at(
            ErrorKind::InvalidOperator,
            "Unexpected boolean operator in expression",
            *line,
        )),
    }
}

/// Compile a union/intersection/negation over named file classes.
///
/// Referenced class definitions are not copied: the compiled tree holds
/// [`BoolNode::ClassRef`] indices into `classes`, and the returned mask
/// includes each referenced class's precomputed mask.
pub fn get_set_expr(
    block: &Block,
    classes: &FileClassSet,
) -> Result<(BoolNode, AttrMask), ConfigError> {
    let item = single_item(block, "expression")?;
    let ConfigItem::Set(set) = item else {
        return Err(ConfigError::at(
            ErrorKind::ParseError,
            format!(
                "Union/intersection/negation of classes expected in block '{}'",
                block.name()
            ),
            item.line(),
        ));
    };
    let mut attr_mask = AttrMask::empty();
    let node = build_set_expr(set, &mut attr_mask, classes, 0)
        .map_err(|e| e.with_line(set.line()))?;
    Ok((node, attr_mask))
}

fn build_set_expr(
    set: &SetExpr,
    attr_mask: &mut AttrMask,
    classes: &FileClassSet,
    depth: usize,
) -> Result<BoolNode, ConfigError> {
    if depth > MAX_EXPR_DEPTH {
        return Err(too_deep());
    }
    match set {
        SetExpr::Class { name, line } => {
            let Some((id, class)) = classes.lookup(name) else {
                return Err(ConfigError::at(
                    ErrorKind::UndefinedClass,
                    format!("FileClass '{name}' is undefined"),
                    *line,
                ));
            };
            *attr_mask |= class.attr_mask;
            Ok(BoolNode::ClassRef(id))
        }
        SetExpr::Not { expr, .. } => {
            let child = build_set_expr(expr, attr_mask, classes, depth + 1)?;
            Ok(BoolNode::Unary {
                op: BoolOp::Not,
                child: Box::new(child),
            })
        }
        // an entry matches the union when it matches one class OR the other
        SetExpr::Union { left, right, .. } => {
            build_set_binary(BoolOp::Or, left, right, attr_mask, classes, depth)
        }
        // and the intersection when it matches one class AND the other
        SetExpr::Inter { left, right, .. } => {
            build_set_binary(BoolOp::And, left, right, attr_mask, classes, depth)
        }
    }
}

fn build_set_binary(
    op: BoolOp,
    left: &SetExpr,
    right: &SetExpr,
    attr_mask: &mut AttrMask,
    classes: &FileClassSet,
    depth: usize,
) -> Result<BoolNode, ConfigError> {
    let left = build_set_expr(left, attr_mask, classes, depth + 1)?;
    let right = build_set_expr(right, attr_mask, classes, depth + 1)?;
    Ok(BoolNode::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}
