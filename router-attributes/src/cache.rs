//! `ruleToValue`: a per-[`TagValueId`](crate::dictionary::TagValueId) cache of
//! parsed numeric values, using the two-sentinel scheme from spec §4.2/§9:
//! "not yet looked up" is distinct from "looked up, failed", and neither
//! collides with a legitimate parsed number.
//!
//! Grounded on `GeneralRouter::parseValueFromTag` in `generalRouter.cpp`,
//! which grows a `vector<double>` on demand and uses `DOUBLE_MISSING` /
//! `DOUBLE_MISSING - 1` as the two sentinels. Rust lets us express the same
//! three states directly instead of relying on sentinel float values.

use std::sync::RwLock;

use crate::dictionary::{TagDictionary, TagValueId};
use crate::value::NumericType;

#[derive(Clone, Copy, Debug, PartialEq)]
enum CacheSlot {
    NotLookedUp,
    LookedUpFailed,
    Value(f64),
}

/// Memoizes `parse_value(dictionary.value_of(id).1, ty)` per [`TagValueId`].
///
/// As in the original, the cache is keyed only by id (not also by numeric
/// type): the first evaluator to resolve a given tag value fixes the
/// interpretation for every later lookup of that id. This matches
/// `generalRouter.cpp` exactly; every rule in a real rule set that
/// dereferences a given tag name does so with the same declared type, so the
/// divergence is never observable in practice.
#[derive(Default)]
pub struct ValueCache {
    slots: RwLock<Vec<CacheSlot>>,
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached parse of `id`'s tag value under `ty`, computing and
    /// memoizing it on first access.
    pub fn get_or_parse(
        &self,
        id: TagValueId,
        ty: NumericType,
        dictionary: &TagDictionary,
    ) -> Option<f64> {
        let idx = id as usize;
        if let Some(&slot) = self.slots.read().unwrap().get(idx) {
            match slot {
                CacheSlot::Value(v) => return Some(v),
                CacheSlot::LookedUpFailed => return None,
                CacheSlot::NotLookedUp => {}
            }
        }

        let parsed = dictionary
            .value_of(id)
            .and_then(|(_, value)| crate::value::parse_value(&value, ty));

        let mut slots = self.slots.write().unwrap();
        if slots.len() <= idx {
            slots.resize(idx + 1, CacheSlot::NotLookedUp);
        }
        slots[idx] = match parsed {
            Some(v) => CacheSlot::Value(v),
            None => CacheSlot::LookedUpFailed,
        };
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memoizes_successful_and_failed_lookups_distinctly() {
        let dict = TagDictionary::new();
        let ok_id = dict.register("maxspeed", "50");
        let bad_id = dict.register("name", "Main Street");

        let cache = ValueCache::new();
        assert!(
            (cache.get_or_parse(ok_id, NumericType::Speed, &dict).unwrap() - 50.0 / 3.6).abs()
                < 1e-9
        );
        assert_eq!(cache.get_or_parse(bad_id, NumericType::Plain, &dict), None);

        // Repeated lookups hit the memoized slots, not the dictionary again.
        assert!(
            (cache.get_or_parse(ok_id, NumericType::Speed, &dict).unwrap() - 50.0 / 3.6).abs()
                < 1e-9
        );
        assert_eq!(cache.get_or_parse(bad_id, NumericType::Plain, &dict), None);
    }
}
