//! Syntax tree for policykoll configuration files
//!
//! This crate models the output of the configuration lexer/parser: a rooted
//! ordered tree of blocks, key/value items, boolean expressions and
//! class-set expressions. The compiler in `policykoll_core` borrows this
//! tree for the duration of a compilation and never retains references into
//! it afterwards.

mod tree;

pub use tree::Block;
pub use tree::BoolExpr;
pub use tree::ConfigFile;
pub use tree::ConfigItem;
pub use tree::ExprOp;
pub use tree::ItemOp;
pub use tree::KeyValue;
pub use tree::SetExpr;
