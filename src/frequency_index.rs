//! FrequencyIndex: open-addressed slot table threaded by a count-ordered list.

use crate::error::{IndexError, InvariantError};
use crate::hash::BuildPolynomialHasher;
use bstr::ByteSlice;
use core::fmt;
use core::hash::{BuildHasher, Hasher};
use core::iter::FusedIterator;
use core::mem;
use slotmap::{DefaultKey, SlotMap};
use std::collections::HashSet;

/// Smallest slot table; also the capacity of [`FrequencyIndex::new`].
pub const DEFAULT_CAPACITY: usize = 16;

/// The part of an entry that moves between list nodes during fix-up.
#[derive(Debug, Default)]
struct Payload {
    key: Box<[u8]>,
    count: u64,
    hash: u64,
    // Back-reference into `slots`; the slot always points at the node
    // currently holding this payload.
    slot: usize,
}

#[derive(Debug)]
struct Entry {
    payload: Payload,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

enum Probe {
    Occupied(DefaultKey),
    Vacant(usize),
}

/// Counts tokens and keeps them ordered by descending count.
///
/// Entries live in a `SlotMap` arena and are addressed by its keys; the slot
/// table and the ordering list both hold arena keys rather than references.
pub struct FrequencyIndex<S = BuildPolynomialHasher> {
    hasher: S,
    slots: Vec<Option<DefaultKey>>, // len is the capacity, always a power of two
    entries: SlotMap<DefaultKey, Entry>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

/// Triangular probe sequence `h, h+1, h+3, h+6, ...` modulo `capacity`.
///
/// For a power-of-two capacity the first `capacity` positions are a
/// permutation of all slots.
fn probe_sequence(hash: u64, capacity: usize) -> impl Iterator<Item = usize> {
    debug_assert!(capacity.is_power_of_two());
    let mask = capacity - 1;
    let mut pos = hash as usize & mask;
    (0..capacity).map(move |step| {
        let current = pos;
        pos = (pos + step + 1) & mask;
        current
    })
}

fn alloc_slots(capacity: usize) -> Result<Vec<Option<DefaultKey>>, IndexError> {
    if capacity > isize::MAX as usize / mem::size_of::<Option<DefaultKey>>() {
        return Err(IndexError::CapacityOverflow {
            requested: capacity,
        });
    }
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| IndexError::AllocationFailure { what: "slot table" })?;
    slots.resize(capacity, None);
    Ok(slots)
}

impl FrequencyIndex {
    pub fn new() -> Self {
        Self::with_hasher(BuildPolynomialHasher)
    }

    /// Create an index whose slot table holds at least `capacity` slots
    /// (rounded up to a power of two, never below [`DEFAULT_CAPACITY`]).
    pub fn try_with_capacity(capacity: usize) -> Result<Self, IndexError> {
        Self::try_with_capacity_and_hasher(capacity, BuildPolynomialHasher)
    }
}

impl Default for FrequencyIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> FrequencyIndex<S>
where
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            slots: vec![None; DEFAULT_CAPACITY],
            entries: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub fn try_with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self, IndexError> {
        let rounded = capacity
            .max(DEFAULT_CAPACITY)
            .checked_next_power_of_two()
            .ok_or(IndexError::CapacityOverflow {
                requested: capacity,
            })?;
        Ok(Self {
            hasher,
            slots: alloc_slots(rounded)?,
            entries: SlotMap::with_key(),
            head: None,
            tail: None,
        })
    }

    fn make_hash(&self, token: &[u8]) -> u64 {
        let mut h = self.hasher.build_hasher();
        h.write(token);
        h.finish()
    }

    /// Count one occurrence of `token`.
    ///
    /// A new token is appended at the tail with count 1. A known token has
    /// its count bumped and is bubbled toward the head by swapping payloads
    /// with each predecessor whose count is now strictly smaller.
    pub fn record(&mut self, token: &[u8]) -> Result<(), IndexError> {
        if self.entries.len() >= self.growth_threshold() {
            self.grow()?;
        }
        let hash = self.make_hash(token);
        match self.probe(hash, token) {
            Probe::Occupied(id) => self.promote(id),
            Probe::Vacant(slot) => self.push_back(slot, hash, token)?,
        }
        Ok(())
    }

    /// Current count of `token`, if it has been recorded.
    pub fn get(&self, token: &[u8]) -> Option<u64> {
        match self.probe(self.make_hash(token), token) {
            Probe::Occupied(id) => Some(self.entries[id].payload.count),
            Probe::Vacant(_) => None,
        }
    }

    // Largest entry count for which one more insertion keeps
    // `len <= 3/4 * capacity`.
    fn growth_threshold(&self) -> usize {
        (self.slots.len() >> 2) * 3
    }

    fn probe(&self, hash: u64, token: &[u8]) -> Probe {
        for idx in probe_sequence(hash, self.slots.len()) {
            match self.slots[idx] {
                None => return Probe::Vacant(idx),
                Some(id) => {
                    let payload = &self.entries[id].payload;
                    if payload.hash == hash && &*payload.key == token {
                        return Probe::Occupied(id);
                    }
                }
            }
        }
        panic!(
            "probe exhausted {} slots holding {} entries: load factor bound broken",
            self.slots.len(),
            self.entries.len()
        );
    }

    fn vacant_slot(&self, hash: u64) -> usize {
        probe_sequence(hash, self.slots.len())
            .find(|&idx| self.slots[idx].is_none())
            .unwrap_or_else(|| {
                panic!(
                    "no vacant slot among {} for {} entries",
                    self.slots.len(),
                    self.entries.len()
                )
            })
    }

    /// Double the slot table and re-seat every entry by its stored hash.
    ///
    /// The new table is allocated before the old one is released, so a
    /// failed growth leaves the index untouched. List links are not read
    /// except to enumerate entries.
    fn grow(&mut self) -> Result<(), IndexError> {
        let old_capacity = self.slots.len();
        let new_capacity = old_capacity
            .checked_mul(2)
            .ok_or(IndexError::CapacityOverflow {
                requested: old_capacity,
            })?;
        self.slots = alloc_slots(new_capacity)?;

        let mut cursor = self.head;
        while let Some(id) = cursor {
            let slot = self.vacant_slot(self.entries[id].payload.hash);
            self.slots[slot] = Some(id);
            let entry = &mut self.entries[id];
            entry.payload.slot = slot;
            cursor = entry.next;
        }
        log::debug!(
            "grew slot table {} -> {} ({} entries)",
            old_capacity,
            new_capacity,
            self.entries.len()
        );
        Ok(())
    }

    fn push_back(&mut self, slot: usize, hash: u64, token: &[u8]) -> Result<(), IndexError> {
        let mut key = Vec::new();
        key.try_reserve_exact(token.len())
            .map_err(|_| IndexError::AllocationFailure { what: "entry key" })?;
        key.extend_from_slice(token);

        let id = self.entries.insert(Entry {
            payload: Payload {
                key: key.into_boxed_slice(),
                count: 1,
                hash,
                slot,
            },
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.entries[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.slots[slot] = Some(id);
        Ok(())
    }

    fn promote(&mut self, id: DefaultKey) {
        let payload = &mut self.entries[id].payload;
        payload.count += 1;
        let count = payload.count;

        let mut cur = id;
        while let Some(prev) = self.entries[cur].prev {
            if self.entries[prev].payload.count >= count {
                break;
            }
            self.swap_payloads(cur, prev);
            cur = prev;
        }
    }

    fn swap_payloads(&mut self, a: DefaultKey, b: DefaultKey) {
        let moved = mem::take(&mut self.entries[a].payload);
        let displaced = mem::replace(&mut self.entries[b].payload, moved);
        self.entries[a].payload = displaced;

        let slot_a = self.entries[a].payload.slot;
        let slot_b = self.entries[b].payload.slot;
        self.slots[slot_a] = Some(a);
        self.slots[slot_b] = Some(b);
    }

    /// Walk every structural invariant; intended for tests and debugging.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let capacity = self.slots.len();
        if !capacity.is_power_of_two() {
            return Err(InvariantError::new(format!(
                "capacity {capacity} is not a power of two"
            )));
        }
        if self.entries.len() * 4 > capacity * 3 {
            return Err(InvariantError::new(format!(
                "{} entries exceed 3/4 of {capacity} slots",
                self.entries.len()
            )));
        }

        let mut keys: HashSet<&[u8]> = HashSet::with_capacity(self.entries.len());
        let mut walked = 0usize;
        let mut prev: Option<DefaultKey> = None;
        let mut prev_count = u64::MAX;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let entry = self
                .entries
                .get(id)
                .ok_or_else(|| InvariantError::new("list links to a missing entry"))?;
            let payload = &entry.payload;
            walked += 1;
            if walked > self.entries.len() {
                return Err(InvariantError::new("ordering list has a cycle"));
            }
            if entry.prev != prev {
                return Err(InvariantError::new(format!(
                    "prev link of {:?} does not match its predecessor",
                    payload.key.as_bstr()
                )));
            }
            if payload.count == 0 || payload.count > prev_count {
                return Err(InvariantError::new(format!(
                    "count {} of {:?} breaks descending order (predecessor {})",
                    payload.count,
                    payload.key.as_bstr(),
                    prev_count
                )));
            }
            if !keys.insert(&*payload.key) {
                return Err(InvariantError::new(format!(
                    "duplicate key {:?}",
                    payload.key.as_bstr()
                )));
            }
            if payload.hash != self.make_hash(&payload.key) {
                return Err(InvariantError::new(format!(
                    "stale hash stored for {:?}",
                    payload.key.as_bstr()
                )));
            }
            if self.slots.get(payload.slot) != Some(&Some(id)) {
                return Err(InvariantError::new(format!(
                    "slot {} does not point back at {:?}",
                    payload.slot,
                    payload.key.as_bstr()
                )));
            }
            let reachable = probe_sequence(payload.hash, capacity)
                .map(|idx| self.slots[idx])
                .take_while(Option::is_some)
                .any(|held| held == Some(id));
            if !reachable {
                return Err(InvariantError::new(format!(
                    "{:?} is not reachable from its hash",
                    payload.key.as_bstr()
                )));
            }
            prev = Some(id);
            prev_count = payload.count;
            cursor = entry.next;
        }

        if self.tail != prev {
            return Err(InvariantError::new("tail is not the last list node"));
        }
        if walked != self.entries.len() {
            return Err(InvariantError::new(format!(
                "list holds {walked} of {} entries",
                self.entries.len()
            )));
        }
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        if occupied != self.entries.len() {
            return Err(InvariantError::new(format!(
                "{occupied} occupied slots for {} entries",
                self.entries.len()
            )));
        }
        Ok(())
    }
}

impl<S> FrequencyIndex<S> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of slots in the table.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// `(token, count)` pairs from most to least frequent.
    ///
    /// Order among equal counts is whatever insertion and promotion left
    /// behind; it is not alphabetical.
    pub fn ordered_entries(&self) -> Iter<'_> {
        Iter {
            entries: &self.entries,
            next: self.head,
            remaining: self.entries.len(),
        }
    }
}

impl<'a, S> IntoIterator for &'a FrequencyIndex<S> {
    type Item = (&'a [u8], u64);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered_entries()
    }
}

impl<S> fmt::Debug for FrequencyIndex<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.ordered_entries().map(|(k, c)| (k.as_bstr(), c)))
            .finish()
    }
}

/// Iterator over `(token, count)` in list order. A clone continues
/// independently from the same position.
#[derive(Clone)]
pub struct Iter<'a> {
    entries: &'a SlotMap<DefaultKey, Entry>,
    next: Option<DefaultKey>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], u64);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.entries;
        let entry = &entries[self.next?];
        self.next = entry.next;
        self.remaining -= 1;
        Some((&*entry.payload.key, entry.payload.count))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // force all keys into the same home slot
    }

    fn snapshot<S>(m: &FrequencyIndex<S>) -> Vec<(String, u64)> {
        m.ordered_entries()
            .map(|(k, c)| (String::from_utf8_lossy(k).into_owned(), c))
            .collect()
    }

    /// Invariant: the triangular sequence covers every slot exactly once for
    /// each power-of-two capacity the table can take.
    #[test]
    fn probe_sequence_is_a_permutation() {
        let mut capacity = DEFAULT_CAPACITY;
        while capacity <= 1 << 14 {
            for hash in [0u64, 1, 7, 0xdead_beef, u64::MAX] {
                let mut seen = vec![false; capacity];
                for idx in probe_sequence(hash, capacity) {
                    assert!(!seen[idx], "slot {idx} visited twice at capacity {capacity}");
                    seen[idx] = true;
                }
                assert!(seen.iter().all(|&s| s));
            }
            capacity *= 2;
        }
    }

    /// Invariant: growth moves slots only; the list order and counts are
    /// exactly what they were before.
    #[test]
    fn grow_preserves_list_order() {
        let mut m = FrequencyIndex::new();
        for t in ["q", "w", "e", "w", "r", "e", "w"] {
            m.record(t.as_bytes()).unwrap();
        }
        let before = snapshot(&m);
        m.grow().unwrap();
        assert_eq!(m.capacity(), 2 * DEFAULT_CAPACITY);
        assert_eq!(snapshot(&m), before);
        m.check_invariants().unwrap();
    }

    /// Invariant: after a payload swap each key's slot still resolves to the
    /// node holding that key.
    #[test]
    fn swap_keeps_slots_pointing_at_payloads() {
        let mut m = FrequencyIndex::new();
        m.record(b"a").unwrap();
        m.record(b"b").unwrap();
        // b overtakes a: payloads swap between the two nodes.
        m.record(b"b").unwrap();
        assert_eq!(snapshot(&m), vec![("b".into(), 2), ("a".into(), 1)]);
        m.check_invariants().unwrap();
        assert_eq!(m.get(b"a"), Some(1));
        assert_eq!(m.get(b"b"), Some(2));

        // Without the slot fix-up this would insert a second "a".
        m.record(b"a").unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.get(b"a"), Some(2));
        m.check_invariants().unwrap();
    }

    /// Invariant: promotion stops at the first predecessor with an equal
    /// count, so equal-count neighbours are not reordered.
    #[test]
    fn promotion_stops_at_equal_count() {
        let mut m = FrequencyIndex::new();
        for t in ["a", "b", "c", "a", "c"] {
            m.record(t.as_bytes()).unwrap();
        }
        // c reached 2 and stopped behind a (also 2).
        assert_eq!(
            snapshot(&m),
            vec![("a".into(), 2), ("c".into(), 2), ("b".into(), 1)]
        );
    }

    /// Invariant: a single increment can carry an entry past a whole run of
    /// smaller counts.
    #[test]
    fn promotion_crosses_a_run() {
        let mut m = FrequencyIndex::new();
        for t in ["a", "b", "c", "d"] {
            m.record(t.as_bytes()).unwrap();
        }
        m.record(b"d").unwrap();
        assert_eq!(snapshot(&m)[0], ("d".into(), 2));
        m.check_invariants().unwrap();
    }

    /// Invariant: every key hashing to the same home slot is still found and
    /// counted independently, including across growth.
    #[test]
    fn collisions_with_const_hasher() {
        let mut m = FrequencyIndex::with_hasher(ConstBuildHasher);
        for i in 0..40 {
            m.record(format!("k{i}").as_bytes()).unwrap();
        }
        m.record(b"k39").unwrap();
        m.record(b"k0").unwrap();
        assert_eq!(m.len(), 40);
        assert_eq!(m.get(b"k39"), Some(2));
        assert_eq!(m.get(b"k0"), Some(2));
        assert_eq!(m.get(b"k1"), Some(1));
        assert_eq!(m.get(b"missing"), None);
        m.check_invariants().unwrap();
    }

    /// Invariant: growth triggers once the next insert could pass 3/4 load.
    #[test]
    fn growth_threshold_keeps_load_under_three_quarters() {
        let mut m = FrequencyIndex::new();
        for i in 0..12 {
            m.record(format!("t{i}").as_bytes()).unwrap();
        }
        assert_eq!(m.capacity(), 16);
        m.record(b"t12").unwrap();
        assert_eq!(m.capacity(), 32);
        m.check_invariants().unwrap();
    }

    #[test]
    fn capacity_rounding() {
        assert_eq!(FrequencyIndex::try_with_capacity(0).unwrap().capacity(), 16);
        assert_eq!(FrequencyIndex::try_with_capacity(17).unwrap().capacity(), 32);
        assert_eq!(FrequencyIndex::try_with_capacity(64).unwrap().capacity(), 64);
    }

    #[test]
    fn capacity_overflow_is_reported() {
        assert_eq!(
            FrequencyIndex::try_with_capacity(usize::MAX).unwrap_err(),
            IndexError::CapacityOverflow {
                requested: usize::MAX
            }
        );
        let huge = 1usize << (usize::BITS - 2);
        assert!(matches!(
            FrequencyIndex::try_with_capacity(huge),
            Err(IndexError::CapacityOverflow { .. })
        ));
    }

    #[test]
    fn invariant_checker_flags_corruption() {
        let mut m = FrequencyIndex::new();
        m.record(b"a").unwrap();
        m.record(b"b").unwrap();
        m.check_invariants().unwrap();

        let head = m.head.unwrap();
        m.entries[head].payload.count = 0;
        let err = m.check_invariants().unwrap_err();
        assert!(err.message().contains("descending order"), "{err}");
    }

    #[test]
    fn debug_lists_entries_in_order() {
        let mut m = FrequencyIndex::new();
        for t in ["x", "y", "y"] {
            m.record(t.as_bytes()).unwrap();
        }
        assert_eq!(format!("{m:?}"), r#"{"y": 2, "x": 1}"#);
    }
}
