//! Unknown-parameter detection
//!
//! Run at the end of each module's read function to catch typos. Unknown
//! items are warnings, never errors: newer configuration files must stay
//! loadable by older binaries.

use policykoll_syntax::Block;
use policykoll_syntax::ConfigItem;

/// Warn about any key/value item or sub-block of `block` whose name is not
/// in `allowed` (case-insensitive).
pub fn check_unknown_parameters(block: &Block, block_name: &str, allowed: &[&str]) {
    let known = |name: &str| allowed.iter().any(|a| a.eq_ignore_ascii_case(name));

    for item in block.items() {
        match item {
            ConfigItem::Var(kv) => {
                if !known(&kv.name) {
                    tracing::warn!(
                        target: "config_check",
                        "unknown parameter '{}' in block '{}' line {}",
                        kv.name,
                        block_name,
                        kv.line
                    );
                }
            }
            ConfigItem::Block(sub) => {
                if !known(sub.name()) {
                    tracing::warn!(
                        target: "config_check",
                        "unknown block '{}' as sub-block of '{}' line {}",
                        sub.name(),
                        block_name,
                        sub.line()
                    );
                }
            }
            ConfigItem::Bool(_) | ConfigItem::Set(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policykoll_syntax::ItemOp;
    use policykoll_syntax::KeyValue;

    #[test]
    fn test_check_does_not_abort() {
        let block = Block::new(
            "Log",
            None,
            vec![
                ConfigItem::Var(KeyValue::new("log_file", ItemOp::Assign, "/var/log/x", 2)),
                ConfigItem::Var(KeyValue::new("log_fiel", ItemOp::Assign, "/var/log/y", 3)),
                ConfigItem::Block(Block::new("unexpected", None, vec![], 4)),
            ],
            1,
        );
        // typos only warn; this must return normally
        check_unknown_parameters(&block, "Log", &["log_file", "debug_level"]);
    }
}
