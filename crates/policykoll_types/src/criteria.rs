//! Criteria: the attributes a policy condition can match on

use crate::attrs::AttrMask;
use crate::params::ParamFlags;
use compact_str::CompactString;

/// A named file attribute usable as the left-hand side of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Criterion {
    /// Entry is under the given directory
    Tree,
    /// Full path of the entry
    Path,
    /// Last component of the path
    Name,
    Owner,
    Group,
    Type,
    Size,
    Depth,
    Dircount,
    LastAccess,
    LastMod,
    Creation,
    /// Extended attribute, spelled `xattr.<key>` in conditions
    Xattr,
    /// Policy-specific status, validated against the active status manager
    Status,
}

/// Which value type a criterion compares against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Str,
    Int,
    Size,
    Duration,
    Type,
}

/// Static description of how a criterion parses and what it consults
#[derive(Debug, Clone, Copy)]
pub struct CriterionDescr {
    pub value_kind: ValueKind,
    pub attr_mask: AttrMask,
    pub parsing_flags: ParamFlags,
}

impl Criterion {
    /// Resolve a criterion name (case-insensitive). Any name starting with
    /// `xattr.` resolves to [`Criterion::Xattr`]; the key after the dot is
    /// extracted by the criteria compiler.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name.len() > 6 && name[..6].eq_ignore_ascii_case("xattr.") {
            return Some(Self::Xattr);
        }
        let known = [
            ("tree", Self::Tree),
            ("path", Self::Path),
            ("name", Self::Name),
            ("owner", Self::Owner),
            ("group", Self::Group),
            ("type", Self::Type),
            ("size", Self::Size),
            ("depth", Self::Depth),
            ("dircount", Self::Dircount),
            ("last_access", Self::LastAccess),
            ("last_mod", Self::LastMod),
            ("creation", Self::Creation),
            ("status", Self::Status),
        ];
        known
            .iter()
            .find(|(token, _)| token.eq_ignore_ascii_case(name))
            .map(|&(_, crit)| crit)
    }

    /// The static descriptor of this criterion
    #[must_use]
    pub fn descriptor(self) -> CriterionDescr {
        let (value_kind, attr_mask, parsing_flags) = match self {
            Self::Tree => (
                ValueKind::Str,
                AttrMask::PATH,
                ParamFlags::NOT_EMPTY | ParamFlags::ALLOW_ANY_DEPTH,
            ),
            Self::Path => (
                ValueKind::Str,
                AttrMask::PATH,
                ParamFlags::NOT_EMPTY | ParamFlags::ALLOW_ANY_DEPTH,
            ),
            Self::Name => (
                ValueKind::Str,
                AttrMask::NAME,
                ParamFlags::NOT_EMPTY | ParamFlags::NO_SLASH,
            ),
            Self::Owner => (ValueKind::Str, AttrMask::OWNER, ParamFlags::NOT_EMPTY),
            Self::Group => (ValueKind::Str, AttrMask::GROUP, ParamFlags::NOT_EMPTY),
            Self::Type => (ValueKind::Type, AttrMask::TYPE, ParamFlags::empty()),
            Self::Size => (ValueKind::Size, AttrMask::SIZE, ParamFlags::COMPARABLE),
            Self::Depth => (
                ValueKind::Int,
                AttrMask::DEPTH,
                ParamFlags::COMPARABLE | ParamFlags::POSITIVE,
            ),
            Self::Dircount => (
                ValueKind::Int,
                AttrMask::DIRCOUNT,
                ParamFlags::COMPARABLE | ParamFlags::POSITIVE,
            ),
            Self::LastAccess => (
                ValueKind::Duration,
                AttrMask::LAST_ACCESS,
                ParamFlags::COMPARABLE,
            ),
            Self::LastMod => (
                ValueKind::Duration,
                AttrMask::LAST_MOD,
                ParamFlags::COMPARABLE,
            ),
            Self::Creation => (
                ValueKind::Duration,
                AttrMask::CREATION,
                ParamFlags::COMPARABLE,
            ),
            Self::Xattr => (ValueKind::Str, AttrMask::XATTRS, ParamFlags::XATTR),
            Self::Status => (ValueKind::Str, AttrMask::empty(), ParamFlags::STATUS),
        };
        CriterionDescr {
            value_kind,
            attr_mask,
            parsing_flags,
        }
    }
}

/// Comparison operator of a compiled condition.
///
/// `Like`/`Unlike` never appear in configuration text; the compiler
/// produces them by rewriting `==`/`!=` when the operand carries
/// wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    More,
    MoreOrEqual,
    Like,
    Unlike,
}

impl CompareOp {
    /// True for `==`, `!=` and the wildcard forms; these are the only
    /// operators legal on non-comparable criteria.
    #[must_use]
    pub fn is_equality(self) -> bool {
        matches!(
            self,
            Self::Equal | Self::NotEqual | Self::Like | Self::Unlike
        )
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::More => ">",
            Self::MoreOrEqual => ">=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "<>",
            Self::Like => " =~ ",
            Self::Unlike => " !~ ",
        };
        f.write_str(s)
    }
}

/// The file type tokens accepted by the `type` criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FileType {
    File,
    Directory,
    Symlink,
    Chr,
    Blk,
    Fifo,
    Sock,
}

/// Typed right-hand side of a compiled condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareValue {
    Str(CompactString),
    Int(i32),
    /// Size in bytes
    Size(u64),
    /// Duration in seconds
    Duration(u64),
    Type(FileType),
}

bitflags::bitflags! {
    /// Per-triplet flags
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct TripletFlags: u32 {
        /// The pattern contained a `**` any-level token (rewritten to `*`)
        const ANY_LEVEL = 1 << 0;
    }
}

/// The compiled form of one condition: criterion, operator and typed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareTriplet {
    pub criterion: Criterion,
    pub op: CompareOp,
    pub value: CompareValue,
    /// The key of an `xattr.<key>` criterion
    pub xattr_name: Option<CompactString>,
    pub flags: TripletFlags,
}

impl CompareTriplet {
    #[must_use]
    pub fn new(criterion: Criterion, op: CompareOp, value: CompareValue) -> Self {
        Self {
            criterion,
            op,
            value,
            xattr_name: None,
            flags: TripletFlags::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn test_criterion_from_name() {
        assert_eq!(Criterion::from_name("Last_Mod"), Some(Criterion::LastMod));
        assert_eq!(Criterion::from_name("xattr.user.foo"), Some(Criterion::Xattr));
        assert_eq!(Criterion::from_name("xattr."), None);
        assert_eq!(Criterion::from_name("colour"), None);
    }

    #[test]
    fn test_criterion_display() {
        assert_eq!(Criterion::LastAccess.to_string(), "last_access");
        assert_eq!(Criterion::Path.to_string(), "path");
    }

    #[test]
    fn test_file_type_tokens() {
        assert_eq!(FileType::from_str("FILE"), Ok(FileType::File));
        assert_eq!(FileType::from_str("symlink"), Ok(FileType::Symlink));
        assert!(FileType::from_str("door").is_err());
        assert_eq!(FileType::Directory.to_string(), "directory");
    }

    #[test]
    fn test_op_display() {
        assert_eq!(CompareOp::NotEqual.to_string(), "<>");
        assert_eq!(CompareOp::Like.to_string(), " =~ ");
        assert!(CompareOp::Like.is_equality());
        assert!(!CompareOp::LessOrEqual.is_equality());
    }
}
