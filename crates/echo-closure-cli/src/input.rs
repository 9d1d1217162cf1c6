// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON-lines row reader with layout inference.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use echo_closure::{Row, RowLayout, Value, ValueMeta, ValueType};
use serde_json::{Map, Number, Value as Json};

/// Rows read from a JSON-lines source, with the inferred layout.
#[derive(Debug)]
pub struct RowFile {
    /// Fields in order of first appearance.
    pub layout: RowLayout,
    /// Rows aligned with `layout`.
    pub rows: Vec<Row>,
}

/// Reads `path`, or stdin when `path` is `-`.
pub fn read_rows(path: &Path) -> Result<RowFile> {
    if path == Path::new("-") {
        return parse_rows(io::stdin().lock());
    }
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    parse_rows(BufReader::new(file)).with_context(|| format!("read {}", path.display()))
}

/// Parses one JSON object per non-blank line.
///
/// A field's type is the type of its first non-null value; fields that are
/// always null are typed `String`. Keys missing from a line read as null.
///
/// A field holding any integer outside the `i64` range is read as `String`,
/// every integer in it kept as its exact decimal text.
pub fn parse_rows(reader: impl BufRead) -> Result<RowFile> {
    let mut objects: Vec<(usize, Map<String, Json>)> = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let json: Json = serde_json::from_str(trimmed)
            .with_context(|| format!("line {}: invalid JSON", idx + 1))?;
        let Json::Object(map) = json else {
            bail!("line {}: expected a JSON object", idx + 1);
        };
        objects.push((idx + 1, map));
    }

    let wide: HashSet<String> = objects
        .iter()
        .flat_map(|(_, map)| map.iter())
        .filter(|(_, json)| matches!(json, Json::Number(n) if is_wide_integer(n)))
        .map(|(key, _)| key.clone())
        .collect();

    let mut names: Vec<String> = Vec::new();
    let mut types: HashMap<String, Option<ValueType>> = HashMap::new();
    let mut converted: Vec<HashMap<String, Value>> = Vec::with_capacity(objects.len());
    for (line_no, map) in objects {
        let mut values = HashMap::with_capacity(map.len());
        for (key, json) in map {
            let value = json_to_value(&json, wide.contains(&key))
                .with_context(|| format!("line {line_no}: field `{key}`"))?;
            let slot = types.entry(key.clone()).or_insert_with(|| {
                names.push(key.clone());
                None
            });
            if slot.is_none() {
                *slot = value.value_type();
            }
            values.insert(key, value);
        }
        converted.push(values);
    }

    let layout: RowLayout = names
        .iter()
        .map(|name| {
            let ty = types.get(name).copied().flatten().unwrap_or(ValueType::String);
            ValueMeta::new(name.clone(), ty)
        })
        .collect();
    let rows = converted
        .into_iter()
        .map(|mut values| {
            names
                .iter()
                .map(|name| values.remove(name).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Ok(RowFile { layout, rows })
}

/// Integer literal that does not fit an `i64`.
fn is_wide_integer(n: &Number) -> bool {
    n.as_i64().is_none() && is_integer_literal(n)
}

fn is_integer_literal(n: &Number) -> bool {
    n.to_string()
        .bytes()
        .all(|b| b.is_ascii_digit() || b == b'-')
}

fn json_to_value(json: &Json, wide: bool) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) if wide && is_integer_literal(n) => Value::String(n.to_string()),
        Json::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Integer(i),
            (None, Some(f)) => Value::Number(f),
            (None, None) => bail!("number {n} is not representable"),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(_) | Json::Object(_) => bail!("nested values are not supported"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_types_from_first_non_null() {
        let src = "{\"id\": 2, \"parent\": null, \"name\": \"b\"}\n\n{\"id\": 3, \"parent\": 2}\n";
        let file = parse_rows(src.as_bytes()).unwrap();
        assert_eq!(file.layout.field_names(), vec!["id", "parent", "name"]);
        assert_eq!(file.layout.get(1).unwrap().value_type, ValueType::Integer);
        assert_eq!(file.rows.len(), 2);
        assert_eq!(
            file.rows[1],
            vec![Value::Integer(3), Value::Integer(2), Value::Null]
        );
    }

    #[test]
    fn integers_beyond_i64_stay_distinct() {
        let src = "\
{\"parent_id\": 9223372036854775809, \"child_id\": 9223372036854775810}
{\"parent_id\": 9223372036854775811, \"child_id\": 9223372036854775812}
{\"parent_id\": 7, \"child_id\": 123456789012345678901234567890}
";
        let file = parse_rows(src.as_bytes()).unwrap();
        assert_eq!(file.layout.get(0).unwrap().value_type, ValueType::String);
        assert_eq!(file.layout.get(1).unwrap().value_type, ValueType::String);
        assert_eq!(
            file.rows[0],
            vec![
                Value::from("9223372036854775809"),
                Value::from("9223372036854775810")
            ]
        );
        assert_eq!(
            file.rows[2],
            vec![
                Value::from("7"),
                Value::from("123456789012345678901234567890")
            ]
        );
    }

    #[test]
    fn in_range_integers_stay_integers() {
        let file = parse_rows("{\"id\": -9223372036854775808}\n".as_bytes()).unwrap();
        assert_eq!(file.rows[0], vec![Value::Integer(i64::MIN)]);
    }

    #[test]
    fn non_object_lines_are_rejected() {
        let err = parse_rows("[1, 2]\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn nested_values_are_rejected() {
        assert!(parse_rows("{\"a\": {\"b\": 1}}\n".as_bytes()).is_err());
    }
}
