//! Status-manager instances
//!
//! A status manager is an external plugin owning a small, named set of
//! states for one policy. The compiler only needs enough of it to validate
//! `status` conditions: the manager name for diagnostics, the instance
//! index for the attribute-mask bit, and the legal status identifiers.

use crate::attrs::AttrMask;
use crate::attrs::MAX_STATUS_MANAGERS;
use compact_str::CompactString;
use itertools::Itertools;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusManagerInstance {
    name: CompactString,
    index: u8,
    statuses: Vec<CompactString>,
}

impl StatusManagerInstance {
    #[must_use]
    pub fn new(
        name: impl Into<CompactString>,
        index: u8,
        statuses: impl IntoIterator<Item = CompactString>,
    ) -> Self {
        debug_assert!(index < MAX_STATUS_MANAGERS);
        Self {
            name: name.into(),
            index,
            statuses: statuses.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn index(&self) -> u8 {
        self.index
    }

    /// The attribute bit rules matching on this manager's status must fetch
    #[must_use]
    pub fn attr_bit(&self) -> AttrMask {
        AttrMask::status_bit(self.index)
    }

    /// Is `value` a legal status identifier for this manager?
    /// The empty string always is (it matches entries with no status).
    #[must_use]
    pub fn has_status(&self, value: &str) -> bool {
        value.is_empty()
            || self
                .statuses
                .iter()
                .any(|s| s.eq_ignore_ascii_case(value))
    }

    /// Legal values, joined for diagnostics
    #[must_use]
    pub fn allowed_values(&self) -> String {
        self.statuses.iter().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lhsm() -> StatusManagerInstance {
        StatusManagerInstance::new(
            "lhsm",
            0,
            ["new", "archived", "released"].map(CompactString::from),
        )
    }

    #[test]
    fn test_has_status() {
        let smi = lhsm();
        assert!(smi.has_status("archived"));
        assert!(smi.has_status("Archived"));
        assert!(smi.has_status(""));
        assert!(!smi.has_status("golden"));
    }

    #[test]
    fn test_allowed_values() {
        assert_eq!(lhsm().allowed_values(), "new, archived, released");
    }
}
