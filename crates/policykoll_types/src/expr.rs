//! Compiled boolean expression trees and the file-class registry
//!
//! Ownership model: a node owns its boxed children, so dropping a tree
//! releases exactly the nodes built for it. A reference to a file-class
//! definition is a [`BoolNode::ClassRef`] holding a copyable index into the
//! [`FileClassSet`] arena; dropping a referencing tree never touches the
//! class definition. The registry must outlive every tree holding a
//! `ClassRef` into it, which the policy layer guarantees by owning both.

use crate::attrs::AttrMask;
use crate::criteria::CompareOp;
use crate::criteria::CompareTriplet;
use crate::criteria::CompareValue;
use crate::criteria::Criterion;
use compact_str::CompactString;

/// Boolean operator of an interior node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    Not,
    And,
    Or,
}

impl std::fmt::Display for BoolOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Not => "NOT",
            Self::And => "AND",
            Self::Or => "OR",
        };
        f.write_str(s)
    }
}

/// Index of a file class inside a [`FileClassSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) usize);

/// A compiled boolean expression over file attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolNode {
    /// Leaf condition
    Condition(Box<CompareTriplet>),
    /// `NOT <child>`
    Unary { op: BoolOp, child: Box<BoolNode> },
    /// `<left> AND/OR <right>`
    Binary {
        op: BoolOp,
        left: Box<BoolNode>,
        right: Box<BoolNode>,
    },
    /// Non-owning reference to a file-class definition
    ClassRef(ClassId),
}

impl BoolNode {
    /// Build a single-condition leaf
    #[must_use]
    pub fn condition(criterion: Criterion, op: CompareOp, value: CompareValue) -> Self {
        Self::Condition(Box::new(CompareTriplet::new(criterion, op, value)))
    }

    /// Rewrite `self` to `AND(self, <new condition>)`; the previous
    /// expression moves under the new binary node.
    pub fn append_and(&mut self, criterion: Criterion, op: CompareOp, value: CompareValue) {
        // Transient placeholder, replaced again below.
        let prev = std::mem::replace(self, Self::ClassRef(ClassId(0)));
        *self = Self::Binary {
            op: BoolOp::And,
            left: Box::new(prev),
            right: Box::new(Self::condition(criterion, op, value)),
        };
    }
}

/// A named, reusable predicate over file attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileClass {
    /// Class name, compared case-insensitively
    pub name: CompactString,
    pub definition: BoolNode,
    /// Attributes any triplet in `definition` consults
    pub attr_mask: AttrMask,
}

/// Registry of file classes, owned by the policy layer.
///
/// Compiled rules hold [`ClassId`]s into this arena rather than pointers;
/// classes are never removed, so an id stays valid for the life of the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileClassSet {
    classes: Vec<FileClass>,
}

impl FileClassSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, class: FileClass) -> ClassId {
        self.classes.push(class);
        ClassId(self.classes.len() - 1)
    }

    /// Look a class up by name (case-insensitive)
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ClassId> {
        self.classes
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .map(ClassId)
    }

    #[must_use]
    pub fn get(&self, id: ClassId) -> Option<&FileClass> {
        self.classes.get(id.0)
    }

    /// Look a class up by name, returning its id and definition
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<(ClassId, &FileClass)> {
        self.classes
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .map(|i| (ClassId(i), &self.classes[i]))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileClass> {
        self.classes.iter()
    }
}
