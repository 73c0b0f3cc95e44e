use compact_str::CompactString;
use smallvec::SmallVec;

/// A whole parsed configuration file.
///
/// The root only ever contains blocks in practice, but the parser is allowed
/// to emit any item kind at any level, so the same [`ConfigItem`] type is
/// used throughout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigFile {
    items: Vec<ConfigItem>,
}

impl ConfigFile {
    #[must_use]
    pub fn new(items: Vec<ConfigItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> impl Iterator<Item = &ConfigItem> {
        self.items.iter()
    }

    /// Iterate over top level blocks
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.items.iter().filter_map(|item| match item {
            ConfigItem::Block(block) => Some(block),
            _ => None,
        })
    }

    /// Find a top level block by name (case-insensitive)
    #[must_use]
    pub fn find_block(&self, name: &str) -> Option<&Block> {
        self.blocks()
            .find(|b| b.name().eq_ignore_ascii_case(name))
    }
}

/// One node of the configuration tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigItem {
    /// `Name [id] { ... }`
    Block(Block),
    /// `name <op> value [extra...] ;`
    Var(KeyValue),
    /// A boolean expression over file attributes (policy match blocks)
    Bool(BoolExpr),
    /// A union/intersection/negation over named file classes
    Set(SetExpr),
}

impl ConfigItem {
    /// Source line this item starts on
    #[must_use]
    pub fn line(&self) -> u32 {
        match self {
            Self::Block(block) => block.line(),
            Self::Var(kv) => kv.line,
            Self::Bool(expr) => expr.line(),
            Self::Set(expr) => expr.line(),
        }
    }
}

/// A named block, optionally tagged with an identifier
/// (`FileClass foo { ... }`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    name: CompactString,
    id: Option<CompactString>,
    items: Vec<ConfigItem>,
    line: u32,
}

impl Block {
    #[must_use]
    pub fn new(
        name: impl Into<CompactString>,
        id: Option<CompactString>,
        items: Vec<ConfigItem>,
        line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            id,
            items,
            line,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The optional block tag (e.g. the class name of a `FileClass` block)
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> impl Iterator<Item = &ConfigItem> {
        self.items.iter()
    }

    /// Iterate over the key/value items of this block
    pub fn vars(&self) -> impl Iterator<Item = &KeyValue> {
        self.items.iter().filter_map(|item| match item {
            ConfigItem::Var(kv) => Some(kv),
            _ => None,
        })
    }

    /// Iterate over the sub-blocks of this block
    pub fn sub_blocks(&self) -> impl Iterator<Item = &Block> {
        self.items.iter().filter_map(|item| match item {
            ConfigItem::Block(block) => Some(block),
            _ => None,
        })
    }

    /// Find a key/value item by name (case-insensitive)
    #[must_use]
    pub fn find_var(&self, name: &str) -> Option<&KeyValue> {
        self.vars().find(|kv| kv.name.eq_ignore_ascii_case(name))
    }

    /// Find a sub-block by name (case-insensitive)
    #[must_use]
    pub fn find_block(&self, name: &str) -> Option<&Block> {
        self.sub_blocks()
            .find(|b| b.name.eq_ignore_ascii_case(name))
    }
}

/// A `name <op> value` item, with optional trailing words
/// (`fileclass = small_files ( migrate_hints... )`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub name: CompactString,
    pub op: ItemOp,
    pub value: CompactString,
    pub extra: SmallVec<[CompactString; 2]>,
    pub line: u32,
}

impl KeyValue {
    #[must_use]
    pub fn new(
        name: impl Into<CompactString>,
        op: ItemOp,
        value: impl Into<CompactString>,
        line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            op,
            value: value.into(),
            extra: SmallVec::new(),
            line,
        }
    }

    #[must_use]
    pub fn with_extra(mut self, extra: impl IntoIterator<Item = CompactString>) -> Self {
        self.extra.extend(extra);
        self
    }

    #[must_use]
    pub fn has_extra(&self) -> bool {
        !self.extra.is_empty()
    }
}

/// The operator between a key and its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemOp {
    /// `=` (plain assignment, the only operator outside match blocks)
    Assign,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    More,
    /// `>=`
    MoreOrEqual,
}

impl std::fmt::Display for ItemOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Assign => "=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::More => ">",
            Self::MoreOrEqual => ">=",
        };
        f.write_str(s)
    }
}

/// Operator of a boolean expression node.
///
/// `Identity` is the wrapper the parser emits for a parenthesized
/// expression; the compiler flattens it away. The parser grammar cannot
/// guarantee op/arity consistency (e.g. a binary `Not`), so the compiler
/// validates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprOp {
    Identity,
    Not,
    And,
    Or,
}

/// A boolean expression over file attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolExpr {
    /// Leaf: `name <op> value`
    Condition(KeyValue),
    Unary {
        op: ExprOp,
        expr: Box<BoolExpr>,
        line: u32,
    },
    Binary {
        op: ExprOp,
        left: Box<BoolExpr>,
        right: Box<BoolExpr>,
        line: u32,
    },
}

impl BoolExpr {
    #[must_use]
    pub fn line(&self) -> u32 {
        match self {
            Self::Condition(kv) => kv.line,
            Self::Unary { line, .. } | Self::Binary { line, .. } => *line,
        }
    }
}

/// A union/intersection/negation over named file classes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetExpr {
    /// A file class referenced by name
    Class { name: CompactString, line: u32 },
    Not {
        expr: Box<SetExpr>,
        line: u32,
    },
    Union {
        left: Box<SetExpr>,
        right: Box<SetExpr>,
        line: u32,
    },
    Inter {
        left: Box<SetExpr>,
        right: Box<SetExpr>,
        line: u32,
    },
}

impl SetExpr {
    #[must_use]
    pub fn line(&self) -> u32 {
        match self {
            Self::Class { line, .. }
            | Self::Not { line, .. }
            | Self::Union { line, .. }
            | Self::Inter { line, .. } => *line,
        }
    }
}
