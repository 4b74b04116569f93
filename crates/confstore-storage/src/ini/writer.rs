//! Full INI dump of a configuration.
//!
//! Each key is written as a blank line, its `[Name]` header and another blank
//! line, followed by its values in declaration order.  A name-visible value
//! becomes one `name=value` line; a hidden value becomes one raw line per
//! stored entry, which is how positional sequences round-trip.  Null renders
//! as the empty string.

use std::io::{self, Write};

use confstore_core::{ConfigKey, Configuration};

use crate::format::IniFormat;

/// Writes one key as a new section.
pub(crate) fn write_key<W: Write>(out: &mut W, key: &ConfigKey, separator: char) -> io::Result<()> {
    write!(out, "\n[{}]\n\n", key.name())?;
    for value in key.iter() {
        if value.is_name_visible() {
            let literal = value.primary_string().unwrap_or_default();
            writeln!(out, "{}{separator}{literal}", value.name())?;
        } else {
            for entry in value.stored_strings() {
                writeln!(out, "{}", entry.unwrap_or_default())?;
            }
        }
    }
    Ok(())
}

/// Writes every key of `configuration` in order, closed by a blank line.
pub(crate) fn write_configuration<W: Write>(
    out: &mut W,
    configuration: &Configuration,
    separator: char,
) -> io::Result<()> {
    for key in configuration {
        write_key(out, key, separator)?;
    }
    writeln!(out)
}

/// Renders `configuration` as INI text, exactly as a save would write it.
pub fn to_ini_string(configuration: &Configuration, format: &IniFormat) -> String {
    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_configuration(&mut buffer, configuration, format.separator);
    String::from_utf8_lossy(&buffer).into_owned()
}
