//! Process-lifetime tag dictionary and bit-set encoder.
//!
//! Grounded on `GeneralRouter::registerTagValueAttribute` and
//! `RouteAttributeContext::convert` in the original `generalRouter.cpp`:
//! a dense `(tag, value) -> id` registry plus a per-tag bit-set index, and a
//! per-region cache translating the region's own local tag ids into
//! dictionary ids.

use std::collections::HashMap;
use std::sync::RwLock;

use bit_set::BitSet;

/// Dense, monotonically assigned id for a distinct `(tag, value)` pair.
pub type TagValueId = u32;

/// Identifies a data region (tile) whose local tag ids need translation into
/// the dictionary's global [`TagValueId`] space. Region decoding tables
/// themselves are owned by the tile layer (out of scope here); this crate
/// only caches the translation.
pub type RegionId = u64;

/// Looks up the `(tag, value)` text behind a region's local tag id.
///
/// Implemented by the tile/region layer (out of scope for this crate);
/// [`TagDictionary::encode`] calls this only on a translation-cache miss.
pub trait RegionTagDecoder {
    /// Returns the `(tag, value)` pair for `local_id`, or `None` if the
    /// region has no such id (an upstream inconsistency; see spec's
    /// "Failure" note in §4.1 — undefined only if the region's own table is
    /// broken).
    fn decode(&self, local_id: u32) -> Option<(String, String)>;
}

#[derive(Default)]
struct Inner {
    reverse: Vec<(String, String)>,
    forward: HashMap<(String, String), TagValueId>,
    tag_index: HashMap<String, BitSet>,
    region_translation: HashMap<RegionId, HashMap<u32, TagValueId>>,
}

/// Append-only registry mapping `(tag, value)` pairs to dense integer ids,
/// plus the per-tag-name bit-set index used by rule evaluation.
///
/// Bit positions are stable for the lifetime of the process and never
/// reassigned; callers must not persist a [`TagValueId`] across processes
/// (spec §5, "Ordering guarantees").
pub struct TagDictionary {
    inner: RwLock<Inner>,
}

impl Default for TagDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl TagDictionary {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Registers `(tag, value)`, returning its stable id. Idempotent: a
    /// second registration of the same pair returns the same id.
    #[allow(clippy::cast_possible_truncation)]
    pub fn register(&self, tag: &str, value: &str) -> TagValueId {
        // Fast path: check under a read lock first, since registration is
        // rare relative to lookups once a rule set has warmed the
        // dictionary up.
        let key = (tag.to_string(), value.to_string());
        if let Some(&id) = self.inner.read().unwrap().forward.get(&key) {
            return id;
        }

        let mut inner = self.inner.write().unwrap();
        if let Some(&id) = inner.forward.get(&key) {
            return id;
        }
        let id = inner.reverse.len() as TagValueId;
        inner.reverse.push(key.clone());
        inner.forward.insert(key, id);
        // `BitSet::insert` grows the underlying storage as needed, so no
        // explicit "align to dictionary size" step is required the way the
        // original's `increaseSize`/`align` helpers are for Boost's
        // dynamic_bitset (see the module doc comment on `rule.rs`).
        inner
            .tag_index
            .entry(tag.to_string())
            .or_default()
            .insert(id as usize);
        id
    }

    /// Total number of distinct `(tag, value)` pairs registered so far.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The original `(tag, value)` text behind `id`, if registered.
    pub fn value_of(&self, id: TagValueId) -> Option<(String, String)> {
        self.inner.read().unwrap().reverse.get(id as usize).cloned()
    }

    /// The bit-set of every [`TagValueId`] whose tag name equals `tag`.
    /// Returns an empty bit-set (not an error) for an unknown tag name, so
    /// callers can intersect unconditionally.
    pub fn tag_index(&self, tag: &str) -> BitSet {
        self.inner
            .read()
            .unwrap()
            .tag_index
            .get(tag)
            .cloned()
            .unwrap_or_default()
    }

    /// Encodes `local_ids` (as understood by `region`) into a dictionary-space
    /// bit-set, lazily registering and memoizing unseen local ids via
    /// `decoder`.
    pub fn encode(
        &self,
        region: RegionId,
        local_ids: &[u32],
        decoder: &dyn RegionTagDecoder,
    ) -> BitSet {
        let mut resolved = Vec::with_capacity(local_ids.len());

        for &local_id in local_ids {
            let cached = self
                .inner
                .read()
                .unwrap()
                .region_translation
                .get(&region)
                .and_then(|map| map.get(&local_id).copied());

            let id = match cached {
                Some(id) => id,
                None => {
                    let Some((tag, value)) = decoder.decode(local_id) else {
                        tracing::warn!(region, local_id, "no decoding rule for local tag id");
                        continue;
                    };
                    let id = self.register(&tag, &value);
                    self.inner
                        .write()
                        .unwrap()
                        .region_translation
                        .entry(region)
                        .or_default()
                        .insert(local_id, id);
                    id
                }
            };
            resolved.push(id);
        }

        let mut bits = BitSet::with_capacity(self.len());
        for id in resolved {
            bits.insert(id as usize);
        }
        bits
    }
}
