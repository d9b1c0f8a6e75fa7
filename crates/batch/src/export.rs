//! CSV export of the batch state.
//!
//! Every field is quoted so the (locale-configurable) field separator and
//! embedded quotes never break the row structure. Spreadsheet tools accept
//! doubled quotes as the escape.

use crate::collection::MediaCollection;
use crate::error::{Error, ErrorKind, Result};
use std::io::Write;

const HEADER: [&str; 8] =
    ["path", "filename", "prefix", "counter", "separator", "description", "extension", "modifiedDate"];

impl MediaCollection {
    /// Writes one header line plus one line per live record. Deleted records
    /// are not exported; they are about to stop existing.
    pub fn export_csv<W: Write>(&self, writer: &mut W, separator: char) -> Result<()> {
        write_row(writer, separator, HEADER.iter().copied())?;
        for record in self.records() {
            let parts = record.parts();
            let fields = [
                record.path().to_string_lossy().into_owned(),
                record.file_name().to_string(),
                parts.prefix.clone(),
                parts.counter.clone(),
                parts.separator.clone(),
                parts.description.clone(),
                parts.extension.clone(),
                record.modified_text().to_string(),
            ];
            write_row(writer, separator, fields.iter().map(String::as_str))?;
        }
        writer.flush().map_err(io_error)
    }
}

fn io_error(e: std::io::Error) -> Error {
    exn::Exn::from(ErrorKind::Export(e))
}

fn write_row<'a, W: Write>(
    writer: &mut W,
    separator: char,
    fields: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let mut first = true;
    for field in fields {
        if !first {
            write!(writer, "{separator}").map_err(io_error)?;
        }
        first = false;
        write!(writer, "\"{}\"", field.replace('"', "\"\"")).map_err(io_error)?;
    }
    writeln!(writer).map_err(io_error)
}
