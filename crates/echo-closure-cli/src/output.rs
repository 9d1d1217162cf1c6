// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Output formatting: JSON lines or a rendered table.

use std::io::{self, BufWriter, Write};

use comfy_table::Table;
use echo_closure::{Row, RowLayout, Value};
use serde_json::{Map, Value as Json};

/// Converts a row value to JSON without changing its kind.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Integer(v) | Value::Date(v) => Json::from(*v),
        Value::Number(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::String(v) => Json::String(v.clone()),
        Value::Boolean(v) => Json::Bool(*v),
        Value::Binary(_) => Json::String(value.to_string()),
    }
}

/// Writes each row as a JSON object keyed by the layout's field names.
///
/// Output is buffered; nothing is guaranteed to reach `W` before
/// [`flush`](Self::flush).
pub struct JsonLinesWriter<W: Write> {
    out: BufWriter<W>,
    names: Vec<String>,
}

impl<W: Write> JsonLinesWriter<W> {
    /// Writer for rows of `layout`.
    pub fn new(out: W, layout: &RowLayout) -> Self {
        Self {
            out: BufWriter::new(out),
            names: layout.iter().map(|m| m.name.clone()).collect(),
        }
    }

    /// Writes one row followed by a newline.
    pub fn write_row(&mut self, row: &Row) -> io::Result<()> {
        let object: Map<String, Json> = self
            .names
            .iter()
            .zip(row)
            .map(|(name, value)| (name.clone(), value_to_json(value)))
            .collect();
        serde_json::to_writer(&mut self.out, &Json::Object(object))?;
        self.out.write_all(b"\n")
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Renders rows as a table with the layout's field names as header.
pub fn render_table(layout: &RowLayout, rows: &[Row]) -> Table {
    let mut table = Table::new();
    table.set_header(layout.field_names());
    for row in rows {
        table.add_row(row.iter().map(ToString::to_string));
    }
    table
}
