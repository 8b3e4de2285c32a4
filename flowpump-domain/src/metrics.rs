// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The metric field data model (spec.md §3, §4.7).
//!
//! A metric owns a `FieldSet`: a list of tag-keyed `Field` rows. The
//! concrete metric kinds (Gauge, Counter, EPSCounter, DutyCycle, Histogram)
//! and the flush behavior that operates on this data live in
//! `flowpump::infrastructure::metrics`; this crate defines only the shared
//! row shape and lookup rule (`locate_field`), grounded directly on
//! `original_source/asab/metrics/metrics.py`'s `Storage['fieldset']`.

use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// Tag set attached to a field. A `BTreeMap` gives canonical ordering so two
/// tag sets with the same entries compare equal regardless of insertion
/// order (spec.md Design Notes, "Dynamic tags as mapping keys").
pub type Tags = BTreeMap<String, String>;

/// One row in a metric's fieldset.
#[derive(Debug, Clone)]
pub struct Field {
    pub tags: Tags,
    /// Last-flushed snapshot, keyed by value name (e.g. a counter's named
    /// sub-values).
    pub values: BTreeMap<String, Value>,
    /// Live values accumulating since the last flush.
    pub actuals: BTreeMap<String, Value>,
    pub expires_at: SystemTime,
}

impl Field {
    pub fn new(tags: Tags, expiration: Duration, now: SystemTime) -> Self {
        Self {
            tags,
            values: BTreeMap::new(),
            actuals: BTreeMap::new(),
            expires_at: now + expiration,
        }
    }

    pub fn touch(&mut self, expiration: Duration, now: SystemTime) {
        self.expires_at = now + expiration;
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        now > self.expires_at
    }
}

/// A metric's set of fields, keyed by tag set. `locate_field` implements the
/// two-branch lookup rule from spec.md §4.7: exact match against
/// `static_tags` merged over the caller's tags, falling back to the single
/// field when the metric has exactly one and no tags were given.
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    pub static_tags: Tags,
    fields: Vec<Field>,
}

impl FieldSet {
    pub fn new(static_tags: Tags) -> Self {
        Self {
            static_tags,
            fields: Vec::new(),
        }
    }

    /// Resolves the field for `tags`, creating one if absent.
    pub fn locate_or_create(&mut self, tags: Option<&Tags>, expiration: Duration, now: SystemTime) -> usize {
        if tags.is_none() && self.fields.len() == 1 {
            self.fields[0].touch(expiration, now);
            return 0;
        }

        let merged = self.merge_tags(tags);
        if let Some(idx) = self.fields.iter().position(|f| f.tags == merged) {
            self.fields[idx].touch(expiration, now);
            return idx;
        }

        self.fields.push(Field::new(merged, expiration, now));
        self.fields.len() - 1
    }

    fn merge_tags(&self, tags: Option<&Tags>) -> Tags {
        let mut merged = tags.cloned().unwrap_or_default();
        for (k, v) in &self.static_tags {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }

    pub fn field(&self, idx: usize) -> &Field {
        &self.fields[idx]
    }

    pub fn field_mut(&mut self, idx: usize) -> &mut Field {
        &mut self.fields[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.iter_mut()
    }

    /// Evicts fields whose `expires_at` has passed. Called during flush.
    pub fn evict_expired(&mut self, now: SystemTime) {
        self.fields.retain(|f| !f.is_expired(now));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn locate_reuses_sole_field_when_tags_absent() {
        let mut fs = FieldSet::new(Tags::new());
        let now = SystemTime::now();
        let a = fs.locate_or_create(None, Duration::from_secs(60), now);
        let b = fs.locate_or_create(None, Duration::from_secs(60), now);
        assert_eq!(a, b);
        assert_eq!(fs.len(), 1);
    }

    #[test]
    fn locate_creates_distinct_fields_per_tag_set() {
        let mut fs = FieldSet::new(Tags::new());
        let now = SystemTime::now();
        let a = fs.locate_or_create(Some(&tags(&[("host", "a")])), Duration::from_secs(60), now);
        let b = fs.locate_or_create(Some(&tags(&[("host", "b")])), Duration::from_secs(60), now);
        assert_ne!(a, b);
        assert_eq!(fs.len(), 2);
    }

    #[test]
    fn static_tags_are_merged_over_caller_tags() {
        let mut fs = FieldSet::new(tags(&[("service", "pump")]));
        let now = SystemTime::now();
        let idx = fs.locate_or_create(Some(&tags(&[("host", "a")])), Duration::from_secs(60), now);
        assert_eq!(fs.field(idx).tags.get("service").map(String::as_str), Some("pump"));
    }

    #[test]
    fn expired_fields_are_evicted() {
        let mut fs = FieldSet::new(Tags::new());
        let now = SystemTime::now();
        fs.locate_or_create(Some(&tags(&[("a", "1")])), Duration::from_secs(0), now);
        fs.evict_expired(now + Duration::from_millis(1));
        assert!(fs.is_empty());
    }
}
