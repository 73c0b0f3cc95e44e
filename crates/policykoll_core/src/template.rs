//! Helpers for module template and default writers

use std::io;
use std::io::Write;

const INDENT_STEP: usize = 4;

/// Open a block: `Name [id]` on one line, `{` on the next
pub fn write_begin_block(
    out: &mut dyn Write,
    indent: usize,
    name: &str,
    id: Option<&str>,
) -> io::Result<()> {
    let pad = indent * INDENT_STEP;
    match id {
        Some(id) => writeln!(out, "{:pad$}{name}\t{id}", "")?,
        None => writeln!(out, "{:pad$}{name}", "")?,
    }
    writeln!(out, "{:pad$}{{", "")
}

/// Close a block
pub fn write_end_block(out: &mut dyn Write, indent: usize) -> io::Result<()> {
    let pad = indent * INDENT_STEP;
    writeln!(out, "{:pad$}}}", "")
}

/// Write one indented line of a template
pub fn write_line(
    out: &mut dyn Write,
    indent: usize,
    args: std::fmt::Arguments<'_>,
) -> io::Result<()> {
    let pad = indent * INDENT_STEP;
    write!(out, "{:pad$}", "")?;
    out.write_fmt(args)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_block_layout() {
        let mut out = Vec::new();
        write_begin_block(&mut out, 0, "FileClass", Some("small_files")).unwrap();
        write_line(&mut out, 1, format_args!("definition {{ size < {} }}", "16MB")).unwrap();
        write_end_block(&mut out, 0).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "FileClass\tsmall_files\n{\n    definition { size < 16MB }\n}\n"
        );
    }
}
