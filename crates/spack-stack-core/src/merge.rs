//! Deep merge of nested YAML documents.
//!
//! Every layering step in an environment build goes through [`merge`]. The
//! strategy decides which side wins a leaf conflict and whether sequences
//! are combined or replaced.
//!
//! A mapping key with a trailing colon (`all::` in YAML, parsed as the key
//! `all:`) marks an override: when it appears on the winning side its value
//! replaces the other side's value instead of being merged into it.

use serde_yaml::{Mapping, Value};

/// Which side of a merge wins a leaf conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    /// The base document wins; the overlay only fills gaps.
    Base,
    /// The overlay wins.
    Overlay,
}

/// How two sequences at the same key are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMerge {
    /// Winner's items first, then the loser's items the winner lacks.
    Combine,
    /// The winner's sequence replaces the loser's.
    Replace,
}

/// Parameters of a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStrategy {
    pub precedence: Precedence,
    pub sequences: SequenceMerge,
}

impl MergeStrategy {
    /// Layer a higher-precedence document on top, combining lists.
    pub const LAYER: Self = Self {
        precedence: Precedence::Overlay,
        sequences: SequenceMerge::Combine,
    };

    /// Restore an earlier document on top, replacing whatever it defines.
    pub const RESTORE: Self = Self {
        precedence: Precedence::Overlay,
        sequences: SequenceMerge::Replace,
    };

    /// Only fill keys the base leaves undefined.
    ///
    /// The built-in environment and container flows never use it; it is
    /// for callers layering defaults underneath an existing document.
    pub const FILL: Self = Self {
        precedence: Precedence::Base,
        sequences: SequenceMerge::Replace,
    };
}

/// Merge `overlay` into `base` and return the result.
///
/// Keys only present on one side are always kept. A `null` is an ordinary
/// leaf: on the winning side it replaces the other value. Key order follows
/// `base`, with keys new in `overlay` appended.
pub fn merge(base: &Value, overlay: &Value, strategy: MergeStrategy) -> Value {
    match (base, overlay) {
        (Value::Mapping(b), Value::Mapping(o)) => Value::Mapping(merge_mappings(b, o, strategy)),
        (Value::Sequence(b), Value::Sequence(o))
            if strategy.sequences == SequenceMerge::Combine =>
        {
            let (winner, loser) = match strategy.precedence {
                Precedence::Overlay => (o, b),
                Precedence::Base => (b, o),
            };
            let mut combined = winner.clone();
            combined.extend(loser.iter().filter(|item| !winner.contains(item)).cloned());
            Value::Sequence(combined)
        }
        _ => match strategy.precedence {
            Precedence::Overlay => overlay.clone(),
            Precedence::Base => base.clone(),
        },
    }
}

/// Merge two mappings; see [`merge`].
pub fn merge_mappings(base: &Mapping, overlay: &Mapping, strategy: MergeStrategy) -> Mapping {
    let mut out = Mapping::new();

    for (key, base_value) in base {
        match find_entry(overlay, key) {
            None => {
                out.insert(key.clone(), base_value.clone());
            }
            Some((overlay_key, overlay_value)) => match strategy.precedence {
                Precedence::Overlay if is_override_key(overlay_key) => {
                    out.insert(overlay_key.clone(), overlay_value.clone());
                }
                Precedence::Base if is_override_key(key) => {
                    out.insert(key.clone(), base_value.clone());
                }
                _ => {
                    out.insert(key.clone(), merge(base_value, overlay_value, strategy));
                }
            },
        }
    }

    for (key, value) in overlay {
        if find_entry(base, key).is_none() {
            out.insert(key.clone(), value.clone());
        }
    }

    out
}

/// Whether a mapping key carries the override marker.
pub fn is_override_key(key: &Value) -> bool {
    matches!(key, Value::String(s) if s.len() > 1 && s.ends_with(':'))
}

/// Key name with any override marker removed.
pub fn key_name(key: &Value) -> Option<&str> {
    match key {
        Value::String(s) if s.len() > 1 => Some(s.trim_end_matches(':')),
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Find the entry in `map` whose key matches `key`, ignoring override markers.
pub fn find_entry<'a>(map: &'a Mapping, key: &Value) -> Option<(&'a Value, &'a Value)> {
    match key_name(key) {
        Some(name) => find_named(map, name),
        None => map.iter().find(|(k, _)| *k == key),
    }
}

/// Find the entry in `map` whose key name is `name`.
pub fn find_named<'a>(map: &'a Mapping, name: &str) -> Option<(&'a Value, &'a Value)> {
    map.iter().find(|(k, _)| key_name(k) == Some(name))
}

/// Remove override markers from every mapping key in the tree.
///
/// Idempotent: a key loses all of its trailing colons in one pass.
pub fn strip_override_markers(value: &mut Value) {
    match value {
        Value::Mapping(map) => {
            let entries = std::mem::take(map);
            for (key, mut child) in entries {
                strip_override_markers(&mut child);
                let key = match key_name(&key) {
                    Some(name) if is_override_key(&key) => Value::String(name.to_string()),
                    _ => key,
                };
                map.insert(key, child);
            }
        }
        Value::Sequence(items) => items.iter_mut().for_each(strip_override_markers),
        Value::Tagged(tagged) => strip_override_markers(&mut tagged.value),
        _ => {}
    }
}
