// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! JSON merging for configuration layers

use serde_json::{Map, Value as J};

/// Merge `layer` over `base`.
///
/// Objects merge recursively. Arrays (the `repo` and `plan` collections in
/// particular) and scalars from the higher layer replace the lower value, so
/// a layer that lists repositories always defines the complete set.
pub fn merge_two_json(base: &mut J, layer: J) {
    match (base, layer) {
        (J::Object(a), J::Object(b)) => {
            for (k, v) in b {
                merge_two_json(a.entry(k).or_insert(J::Null), v);
            }
        }
        (_, J::Null) => {}
        (a, b) => *a = b,
    }
}

/// Insert a value at a dotted path, creating intermediate objects
pub fn insert_dotted(root: &mut J, dotted: &str, v: J) {
    let mut parts = dotted.split('.').peekable();
    let mut cur = root;

    while let Some(part) = parts.next() {
        if !cur.is_object() {
            *cur = J::Object(Map::new());
        }
        let Some(map) = cur.as_object_mut() else {
            return;
        };
        if parts.peek().is_none() {
            map.insert(part.to_string(), v);
            return;
        }
        cur = map.entry(part.to_string()).or_insert_with(|| J::Object(Map::new()));
    }
}
