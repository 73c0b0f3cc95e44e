//! Scalar parameter extraction
//!
//! One typed getter per parameter type, plus a descriptor-driven batch
//! reader. Getters return `Ok(None)` when the parameter is absent and not
//! mandatory, so module readers can keep their defaults.

use crate::values;
use compact_str::CompactString;
use policykoll_syntax::Block;
use policykoll_syntax::KeyValue;
use policykoll_types::ConfigError;
use policykoll_types::ErrorKind;
use policykoll_types::ParamFlags;
use smallvec::SmallVec;

/// Trailing words of a key/value item (`fileclass = foo ( hints )`)
pub type ExtraArgs = SmallVec<[CompactString; 2]>;

/// True if the string contains shell-glob wildcard characters
#[must_use]
pub fn contains_wildcards(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

fn lookup<'a>(
    block: &'a Block,
    block_name: &str,
    var_name: &str,
    flags: ParamFlags,
) -> Result<Option<&'a KeyValue>, ConfigError> {
    match block.find_var(var_name) {
        Some(kv) => Ok(Some(kv)),
        None if flags.contains(ParamFlags::MANDATORY) => Err(ConfigError::at(
            ErrorKind::Missing,
            format!("Missing mandatory parameter '{var_name}' in block '{block_name}'"),
            block.line(),
        )),
        None => Ok(None),
    }
}

fn take_extra(
    kv: &KeyValue,
    block_name: &str,
    extra: Option<&mut ExtraArgs>,
) -> Result<(), ConfigError> {
    match extra {
        Some(sink) => {
            sink.clear();
            sink.extend(kv.extra.iter().cloned());
            Ok(())
        }
        None if kv.has_extra() => Err(ConfigError::at(
            ErrorKind::ConstraintViolated,
            format!(
                "Unexpected options for parameter '{block_name}::{}'",
                kv.name
            ),
            kv.line,
        )),
        None => Ok(()),
    }
}

fn invalid_value(
    block_name: &str,
    kv: &KeyValue,
    detail: &values::ValueError,
) -> ConfigError {
    ConfigError::at(
        ErrorKind::ParseError,
        format!("Invalid value for '{block_name}::{}': {detail}", kv.name),
        kv.line,
    )
}

fn positive_expected(block_name: &str, kv: &KeyValue) -> ConfigError {
    ConfigError::at(
        ErrorKind::ConstraintViolated,
        format!("Positive value expected for '{block_name}::{}'", kv.name),
        kv.line,
    )
}

fn must_not_be_null(block_name: &str, kv: &KeyValue) -> ConfigError {
    ConfigError::at(
        ErrorKind::ConstraintViolated,
        format!("'{block_name}::{}' must not be null", kv.name),
        kv.line,
    )
}

/// Retrieve a string parameter, enforce its constraint flags and return
/// the normalized value.
pub fn get_string_param(
    block: &Block,
    block_name: &str,
    var_name: &str,
    flags: ParamFlags,
    extra: Option<&mut ExtraArgs>,
) -> Result<Option<CompactString>, ConfigError> {
    let Some(kv) = lookup(block, block_name, var_name, flags)? else {
        return Ok(None);
    };
    take_extra(kv, block_name, extra)?;

    let mut value = kv.value.clone();

    if flags.contains(ParamFlags::NOT_EMPTY) && value.is_empty() {
        return Err(ConfigError::at(
            ErrorKind::ConstraintViolated,
            format!("Unexpected empty parameter '{block_name}::{}'", kv.name),
            kv.line,
        ));
    }

    // stdio targets short-circuit the path checks
    if flags.contains(ParamFlags::STDIO_ALLOWED)
        && ["stdout", "stderr", "syslog"]
            .iter()
            .any(|t| value.eq_ignore_ascii_case(t))
    {
        return Ok(Some(value));
    }

    if flags.contains(ParamFlags::ABSOLUTE_PATH) && !value.starts_with('/') {
        return Err(ConfigError::at(
            ErrorKind::ConstraintViolated,
            format!(
                "Absolute path expected for parameter '{block_name}::{}'",
                kv.name
            ),
            kv.line,
        ));
    }

    if flags.contains(ParamFlags::NO_WILDCARDS) && contains_wildcards(&value) {
        return Err(ConfigError::at(
            ErrorKind::ConstraintViolated,
            format!("Wildcards are not allowed in '{block_name}::{}'", kv.name),
            kv.line,
        ));
    }

    if flags.contains(ParamFlags::MAIL) {
        let valid = matches!(
            value.split_once('@'),
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        );
        if !valid {
            return Err(ConfigError::at(
                ErrorKind::ConstraintViolated,
                format!("Invalid mail address in '{block_name}::{}'", kv.name),
                kv.line,
            ));
        }
    }

    if flags.contains(ParamFlags::REMOVE_FINAL_SLASH)
        && value.len() > 1
        && value.ends_with('/')
    {
        value.pop();
    }

    Ok(Some(value))
}

/// Retrieve a boolean parameter
pub fn get_bool_param(
    block: &Block,
    block_name: &str,
    var_name: &str,
    flags: ParamFlags,
    extra: Option<&mut ExtraArgs>,
) -> Result<Option<bool>, ConfigError> {
    let Some(kv) = lookup(block, block_name, var_name, flags)? else {
        return Ok(None);
    };
    take_extra(kv, block_name, extra)?;
    let value =
        values::parse_bool(&kv.value).map_err(|e| invalid_value(block_name, kv, &e))?;
    Ok(Some(value))
}

/// Retrieve a signed integer parameter
pub fn get_int_param(
    block: &Block,
    block_name: &str,
    var_name: &str,
    flags: ParamFlags,
    extra: Option<&mut ExtraArgs>,
) -> Result<Option<i32>, ConfigError> {
    let Some(kv) = lookup(block, block_name, var_name, flags)? else {
        return Ok(None);
    };
    take_extra(kv, block_name, extra)?;
    let value =
        values::parse_int(&kv.value).map_err(|e| invalid_value(block_name, kv, &e))?;
    if flags.contains(ParamFlags::POSITIVE) && value < 0 {
        return Err(positive_expected(block_name, kv));
    }
    if flags.contains(ParamFlags::NOT_NULL) && value == 0 {
        return Err(must_not_be_null(block_name, kv));
    }
    Ok(Some(value))
}

/// Retrieve an unsigned 64-bit integer parameter (decimal SI suffixes
/// `k`/`M`/`G`/`T` allowed in the configuration file).
pub fn get_int64_param(
    block: &Block,
    block_name: &str,
    var_name: &str,
    flags: ParamFlags,
    extra: Option<&mut ExtraArgs>,
) -> Result<Option<u64>, ConfigError> {
    let Some(kv) = lookup(block, block_name, var_name, flags)? else {
        return Ok(None);
    };
    take_extra(kv, block_name, extra)?;
    let value =
        values::parse_int64(&kv.value).map_err(|e| invalid_value(block_name, kv, &e))?;
    if flags.contains(ParamFlags::NOT_NULL) && value == 0 {
        return Err(must_not_be_null(block_name, kv));
    }
    Ok(Some(value))
}

/// Retrieve a float parameter
pub fn get_float_param(
    block: &Block,
    block_name: &str,
    var_name: &str,
    flags: ParamFlags,
    extra: Option<&mut ExtraArgs>,
) -> Result<Option<f64>, ConfigError> {
    let Some(kv) = lookup(block, block_name, var_name, flags)? else {
        return Ok(None);
    };
    take_extra(kv, block_name, extra)?;
    let value = values::parse_float(&kv.value, flags.contains(ParamFlags::ALLOW_PCT_SIGN))
        .map_err(|e| invalid_value(block_name, kv, &e))?;
    if flags.contains(ParamFlags::POSITIVE) && value < 0.0 {
        return Err(positive_expected(block_name, kv));
    }
    if flags.contains(ParamFlags::NOT_NULL) && value == 0.0 {
        return Err(must_not_be_null(block_name, kv));
    }
    Ok(Some(value))
}

/// Retrieve a size parameter (binary units)
pub fn get_size_param(
    block: &Block,
    block_name: &str,
    var_name: &str,
    flags: ParamFlags,
    extra: Option<&mut ExtraArgs>,
) -> Result<Option<u64>, ConfigError> {
    let Some(kv) = lookup(block, block_name, var_name, flags)? else {
        return Ok(None);
    };
    take_extra(kv, block_name, extra)?;
    let value =
        values::parse_size(&kv.value).map_err(|e| invalid_value(block_name, kv, &e))?;
    if flags.contains(ParamFlags::NOT_NULL) && value == 0 {
        return Err(must_not_be_null(block_name, kv));
    }
    Ok(Some(value))
}

/// Retrieve a duration parameter, in seconds
pub fn get_duration_param(
    block: &Block,
    block_name: &str,
    var_name: &str,
    flags: ParamFlags,
    extra: Option<&mut ExtraArgs>,
) -> Result<Option<u64>, ConfigError> {
    let Some(kv) = lookup(block, block_name, var_name, flags)? else {
        return Ok(None);
    };
    take_extra(kv, block_name, extra)?;
    let value =
        values::parse_duration(&kv.value).map_err(|e| invalid_value(block_name, kv, &e))?;
    if flags.contains(ParamFlags::NOT_NULL) && value == 0 {
        return Err(must_not_be_null(block_name, kv));
    }
    Ok(Some(value))
}

/// Typed destination of a scalar parameter
#[derive(Debug)]
pub enum ParamTarget<'a> {
    Str(&'a mut CompactString),
    Bool(&'a mut bool),
    Int(&'a mut i32),
    Int64(&'a mut u64),
    Float(&'a mut f64),
    /// Size in bytes
    Size(&'a mut u64),
    /// Duration in seconds
    Duration(&'a mut u64),
}

/// Descriptor of one expected scalar parameter
#[derive(Debug)]
pub struct CfgParam<'a> {
    pub name: &'static str,
    pub flags: ParamFlags,
    pub target: ParamTarget<'a>,
}

/// Read a whole table of scalar parameters into their typed destinations.
/// Absent non-mandatory parameters leave the destination untouched.
pub fn read_scalar_params(
    block: &Block,
    block_name: &str,
    params: &mut [CfgParam<'_>],
) -> Result<(), ConfigError> {
    for param in params {
        match &mut param.target {
            ParamTarget::Str(dst) => {
                if let Some(v) =
                    get_string_param(block, block_name, param.name, param.flags, None)?
                {
                    **dst = v;
                }
            }
            ParamTarget::Bool(dst) => {
                if let Some(v) =
                    get_bool_param(block, block_name, param.name, param.flags, None)?
                {
                    **dst = v;
                }
            }
            ParamTarget::Int(dst) => {
                if let Some(v) =
                    get_int_param(block, block_name, param.name, param.flags, None)?
                {
                    **dst = v;
                }
            }
            ParamTarget::Int64(dst) => {
                if let Some(v) =
                    get_int64_param(block, block_name, param.name, param.flags, None)?
                {
                    **dst = v;
                }
            }
            ParamTarget::Float(dst) => {
                if let Some(v) =
                    get_float_param(block, block_name, param.name, param.flags, None)?
                {
                    **dst = v;
                }
            }
            ParamTarget::Size(dst) => {
                if let Some(v) =
                    get_size_param(block, block_name, param.name, param.flags, None)?
                {
                    **dst = v;
                }
            }
            ParamTarget::Duration(dst) => {
                if let Some(v) =
                    get_duration_param(block, block_name, param.name, param.flags, None)?
                {
                    **dst = v;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use policykoll_syntax::ConfigItem;
    use policykoll_syntax::ItemOp;
    use pretty_assertions::assert_eq;

    fn var(name: &str, value: &str, line: u32) -> ConfigItem {
        ConfigItem::Var(KeyValue::new(name, ItemOp::Assign, value, line))
    }

    fn log_block() -> Block {
        Block::new(
            "Log",
            None,
            vec![
                var("log_file", "/var/log/policy.log", 2),
                var("alert_mail", "admin@example.com", 3),
                var("debug", "yes", 4),
                var("batch_size", "2M", 5),
                var("max_size", "2MB", 6),
                var("grace", "2h30m", 7),
                var("usage_target", "85%", 8),
                var("nested_depth", "-1", 9),
                var("root_dir", "/data/fs/", 10),
            ],
            1,
        )
    }

    #[test]
    fn test_missing_mandatory() {
        let block = Block::new("log", None, vec![], 1);
        let err = get_string_param(
            &block,
            "log",
            "file",
            ParamFlags::MANDATORY | ParamFlags::ABSOLUTE_PATH,
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Missing);
        assert_eq!(
            err.to_string(),
            "Missing mandatory parameter 'file' in block 'log', line 1"
        );
    }

    #[test]
    fn test_missing_optional_is_none() {
        let block = log_block();
        assert_eq!(
            get_string_param(&block, "Log", "nope", ParamFlags::empty(), None),
            Ok(None)
        );
    }

    #[test]
    fn test_string_checks() {
        let block = log_block();
        assert_eq!(
            get_string_param(
                &block,
                "Log",
                "log_file",
                ParamFlags::ABSOLUTE_PATH | ParamFlags::NO_WILDCARDS,
                None
            ),
            Ok(Some("/var/log/policy.log".into()))
        );
        let err = get_string_param(
            &block,
            "Log",
            "alert_mail",
            ParamFlags::ABSOLUTE_PATH,
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolated);
        assert_eq!(
            err.to_string(),
            "Absolute path expected for parameter 'Log::alert_mail', line 3"
        );
    }

    #[test]
    fn test_mail_check() {
        let block = log_block();
        assert_eq!(
            get_string_param(&block, "Log", "alert_mail", ParamFlags::MAIL, None),
            Ok(Some("admin@example.com".into()))
        );
        let bad = Block::new("Log", None, vec![var("alert_mail", "@nowhere", 3)], 1);
        assert!(get_string_param(&bad, "Log", "alert_mail", ParamFlags::MAIL, None).is_err());
    }

    #[test]
    fn test_stdio_bypasses_path_checks() {
        let block = Block::new("Log", None, vec![var("log_file", "stdout", 2)], 1);
        assert_eq!(
            get_string_param(
                &block,
                "Log",
                "log_file",
                ParamFlags::STDIO_ALLOWED | ParamFlags::ABSOLUTE_PATH,
                None
            ),
            Ok(Some("stdout".into()))
        );
    }

    #[test]
    fn test_remove_final_slash() {
        let block = log_block();
        assert_eq!(
            get_string_param(
                &block,
                "Log",
                "root_dir",
                ParamFlags::REMOVE_FINAL_SLASH,
                None
            ),
            Ok(Some("/data/fs".into()))
        );
        let root = Block::new("fs", None, vec![var("root", "/", 2)], 1);
        assert_eq!(
            get_string_param(&root, "fs", "root", ParamFlags::REMOVE_FINAL_SLASH, None),
            Ok(Some("/".into()))
        );
    }

    #[test]
    fn test_numeric_params() {
        let block = log_block();
        assert_eq!(
            get_bool_param(&block, "Log", "debug", ParamFlags::empty(), None),
            Ok(Some(true))
        );
        assert_eq!(
            get_int64_param(&block, "Log", "batch_size", ParamFlags::empty(), None),
            Ok(Some(2_000_000))
        );
        assert_eq!(
            get_size_param(&block, "Log", "max_size", ParamFlags::NOT_NULL, None),
            Ok(Some(2_097_152))
        );
        assert_eq!(
            get_duration_param(&block, "Log", "grace", ParamFlags::empty(), None),
            Ok(Some(9000))
        );
        assert_eq!(
            get_float_param(
                &block,
                "Log",
                "usage_target",
                ParamFlags::ALLOW_PCT_SIGN,
                None
            ),
            Ok(Some(85.0))
        );
        let err = get_int_param(&block, "Log", "nested_depth", ParamFlags::POSITIVE, None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Positive value expected for 'Log::nested_depth', line 9"
        );
    }

    #[test]
    fn test_not_null() {
        let block = Block::new("io", None, vec![var("nb_threads", "0", 2)], 1);
        let err =
            get_int_param(&block, "io", "nb_threads", ParamFlags::NOT_NULL, None).unwrap_err();
        assert_eq!(err.to_string(), "'io::nb_threads' must not be null, line 2");
    }

    #[test]
    fn test_extra_args() {
        let kv = KeyValue::new("fileclass", ItemOp::Assign, "small", 2)
            .with_extra(["migrate_hints".into()]);
        let block = Block::new("migration_rule", None, vec![ConfigItem::Var(kv)], 1);

        // no sink: configuration error
        let err = get_string_param(&block, "migration_rule", "fileclass", ParamFlags::empty(), None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unexpected options for parameter 'migration_rule::fileclass', line 2"
        );

        // with sink: extras handed over
        let mut extra = ExtraArgs::new();
        assert_eq!(
            get_string_param(
                &block,
                "migration_rule",
                "fileclass",
                ParamFlags::empty(),
                Some(&mut extra)
            ),
            Ok(Some("small".into()))
        );
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0], "migrate_hints");
    }

    #[test]
    fn test_read_scalar_params() {
        let block = log_block();
        let mut log_file = CompactString::const_new("/tmp/default.log");
        let mut debug = false;
        let mut max_size = 0u64;
        let mut grace = 0u64;
        let mut missing = CompactString::const_new("untouched");
        let mut params = [
            CfgParam {
                name: "log_file",
                flags: ParamFlags::ABSOLUTE_PATH,
                target: ParamTarget::Str(&mut log_file),
            },
            CfgParam {
                name: "debug",
                flags: ParamFlags::empty(),
                target: ParamTarget::Bool(&mut debug),
            },
            CfgParam {
                name: "max_size",
                flags: ParamFlags::NOT_NULL,
                target: ParamTarget::Size(&mut max_size),
            },
            CfgParam {
                name: "grace",
                flags: ParamFlags::empty(),
                target: ParamTarget::Duration(&mut grace),
            },
            CfgParam {
                name: "no_such_param",
                flags: ParamFlags::empty(),
                target: ParamTarget::Str(&mut missing),
            },
        ];
        read_scalar_params(&block, "Log", &mut params).unwrap();
        assert_eq!(log_file, "/var/log/policy.log");
        assert!(debug);
        assert_eq!(max_size, 2_097_152);
        assert_eq!(grace, 9000);
        assert_eq!(missing, "untouched");
    }
}
