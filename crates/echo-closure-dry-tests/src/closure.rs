// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Synchronous transform driver and closure oracles.

use std::collections::{BTreeMap, BTreeSet};

use echo_closure::{ClosureError, ClosureSettings, ClosureTransform, Row, RowLayout, Value};

/// Runs a whole transform over `rows` and collects every output row.
pub fn run_transform(
    settings: ClosureSettings,
    upstream: &RowLayout,
    rows: impl IntoIterator<Item = Row>,
) -> Result<Vec<Row>, ClosureError> {
    let mut transform = ClosureTransform::new(settings, upstream)?;
    for row in rows {
        transform.process_row(row)?;
    }
    transform.finish_input()?;
    let mut out = Vec::new();
    while let Some(row) = transform.next_result_row()? {
        out.push(row);
    }
    Ok(out)
}

/// Integer `(ancestor, descendant, distance)` triples of output rows.
///
/// Rows that are not three integers are ignored.
pub fn int_triples(rows: &[Row]) -> Vec<(i64, i64, i64)> {
    rows.iter()
        .filter_map(|row| match row.as_slice() {
            [Value::Integer(a), Value::Integer(d), Value::Integer(dist)] => Some((*a, *d, *dist)),
            _ => None,
        })
        .collect()
}

/// Same as [`int_triples`], as a set.
pub fn int_triple_set(rows: &[Row]) -> BTreeSet<(i64, i64, i64)> {
    int_triples(rows).into_iter().collect()
}

/// Brute-force closure by repeated relaxation, independent of any traversal.
///
/// Pairs `(a, a)` only appear for explicit self-loops (distance 1) and, when
/// `root_id_zero` is set, for roots (distance 0).
pub fn reference_closure(edges: &[(i64, i64)], root_id_zero: bool) -> BTreeSet<(i64, i64, i64)> {
    let direct: BTreeSet<(i64, i64)> = edges.iter().copied().collect();
    let mut dist: BTreeMap<(i64, i64), i64> = BTreeMap::new();
    for &(p, c) in &direct {
        if p != c {
            dist.insert((p, c), 1);
        }
    }
    loop {
        let mut changed = false;
        let snapshot: Vec<((i64, i64), i64)> = dist.iter().map(|(k, v)| (*k, *v)).collect();
        for ((a, b), d) in snapshot {
            for &(p, c) in &direct {
                if p != b || c == a || p == c {
                    continue;
                }
                let candidate = d + 1;
                let entry = dist.entry((a, c)).or_insert(i64::MAX);
                if candidate < *entry {
                    *entry = candidate;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    let mut out: BTreeSet<(i64, i64, i64)> =
        dist.into_iter().map(|((a, b), d)| (a, b, d)).collect();
    for &(p, c) in &direct {
        if p == c {
            out.insert((p, p, 1));
        }
    }
    if root_id_zero {
        let children: BTreeSet<i64> = direct.iter().map(|&(_, c)| c).collect();
        for &(p, _) in &direct {
            if !children.contains(&p) {
                out.insert((p, p, 0));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_matches_hand_computed_cycle() {
        let got = reference_closure(&[(1, 2), (2, 3), (3, 1)], true);
        let want: BTreeSet<_> = [
            (1, 2, 1),
            (1, 3, 2),
            (2, 3, 1),
            (2, 1, 2),
            (3, 1, 1),
            (3, 2, 2),
        ]
        .into();
        assert_eq!(got, want);
    }
}
