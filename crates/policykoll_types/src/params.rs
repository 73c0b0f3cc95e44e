//! Constraint flags for configuration parameters and criteria

bitflags::bitflags! {
    /// Constraints and parsing options for a parameter or criterion.
    ///
    /// Scalar getters check the constraint flags after parsing; the
    /// criteria compiler reads the parsing-behavior flags from the
    /// criterion descriptor.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct ParamFlags: u32 {
        /// Absence of the parameter is an error
        const MANDATORY = 1 << 0;
        /// Reject negative values (signed types)
        const POSITIVE = 1 << 1;
        /// Reject zero / empty values
        const NOT_NULL = 1 << 2;
        /// Reject the empty string
        const NOT_EMPTY = 1 << 3;
        /// String must start with `/`
        const ABSOLUTE_PATH = 1 << 4;
        /// Reject `*`, `?`, `[` in strings
        const NO_WILDCARDS = 1 << 5;
        /// Reject `/` in strings
        const NO_SLASH = 1 << 6;
        /// Permit the `**` any-level path token
        const ALLOW_ANY_DEPTH = 1 << 7;
        /// Float may carry a trailing `%`
        const ALLOW_PCT_SIGN = 1 << 8;
        /// `stdout`/`stderr`/`syslog` bypass path checks
        const STDIO_ALLOWED = 1 << 9;
        /// Value must look like a mail address
        const MAIL = 1 << 10;
        /// Strip one trailing `/` (never the root)
        const REMOVE_FINAL_SLASH = 1 << 11;
        /// Criterion name has the form `xattr.<key>`
        const XATTR = 1 << 12;
        /// Criterion only valid with a status manager in scope
        const STATUS = 1 << 13;
        /// Ordering comparators are legal for this criterion
        const COMPARABLE = 1 << 14;
    }
}
