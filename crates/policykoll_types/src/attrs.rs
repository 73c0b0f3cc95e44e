//! Attribute masks
//!
//! Each compiled condition consults one or more file attributes. Rule
//! evaluators use the accumulated mask to pre-fetch exactly those
//! attributes and nothing else.

bitflags::bitflags! {
    /// Bit set of file attributes a compiled expression needs
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct AttrMask: u64 {
        const PATH = 1 << 0;
        const NAME = 1 << 1;
        const TYPE = 1 << 2;
        const SIZE = 1 << 3;
        const DEPTH = 1 << 4;
        const DIRCOUNT = 1 << 5;
        const OWNER = 1 << 6;
        const GROUP = 1 << 7;
        const LAST_ACCESS = 1 << 8;
        const LAST_MOD = 1 << 9;
        const CREATION = 1 << 10;
        const XATTRS = 1 << 11;
    }
}

/// Highest number of status-manager instances a policy set can carry
pub const MAX_STATUS_MANAGERS: u8 = 16;

/// First bit used for per-status-manager attributes
const STATUS_SHIFT: u8 = 48;

impl AttrMask {
    /// The attribute bit of the status-manager instance at `index`.
    ///
    /// Status bits live above the generic attribute bits so that the two
    /// ranges can never collide.
    #[must_use]
    pub fn status_bit(index: u8) -> Self {
        debug_assert!(index < MAX_STATUS_MANAGERS);
        Self::from_bits_retain(1 << (STATUS_SHIFT + (index % MAX_STATUS_MANAGERS)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_bits_are_disjoint_from_attrs() {
        let all_attrs = AttrMask::all();
        for i in 0..MAX_STATUS_MANAGERS {
            assert_eq!(AttrMask::status_bit(i) & all_attrs, AttrMask::empty());
        }
        assert_ne!(AttrMask::status_bit(0), AttrMask::status_bit(1));
    }
}
