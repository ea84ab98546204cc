//! A hash map specialized for [`PackedColor`] keys and non-negative `i32` values.
//!
//! Entries live in a flat arena and are chained per bucket through `u32` links,
//! so each entry costs 12 bytes plus 4 bytes per bucket.
//! Removed slots are kept on a free list and reused by later insertions.

use crate::PackedColor;
use thiserror::Error;

/// Errors returned by [`PackedColorMap`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MapError {
    /// Attempted to store a negative value.
    #[error("cannot store negative value {value} for color {color:#010x}")]
    InvalidArgument {
        /// The color being written.
        color: PackedColor,
        /// The rejected value.
        value: i64,
    },
    /// The map was structurally modified after a [`Cursor`] was created from it.
    #[error("color map was structurally modified during iteration")]
    ConcurrentModification,
    /// [`Cursor::remove`] was called without a preceding successful [`Cursor::advance`].
    #[error("cursor has no current entry to remove")]
    NoCurrentEntry,
}

/// Marks the end of a bucket chain or free list.
const NIL: u32 = u32::MAX;

/// The number of buckets in a map created by [`PackedColorMap::new`].
const DEFAULT_CAPACITY: usize = 16;

/// The smallest allowed number of buckets.
const MIN_CAPACITY: usize = 2;

/// A single slot in the entry arena.
#[derive(Debug, Clone, Copy)]
struct Entry {
    /// The key.
    color: PackedColor,
    /// The value, or `-1` if this slot is on the free list.
    value: i32,
    /// The next entry in the bucket chain (or free list).
    next: u32,
}

/// Spreads the bits of a packed color so that near-sequential colors land in different buckets.
#[inline]
fn hash(color: PackedColor) -> u32 {
    let h = color ^ (color >> 16);
    let h = h.wrapping_mul(0x045d_9f3b);
    h ^ (h >> 16)
}

/// A hash map from [`PackedColor`]s to non-negative `i32` values (e.g., counts or palette indices).
///
/// The number of buckets is always a power of two and is doubled whenever the number of entries
/// exceeds half the number of buckets.
///
/// # Examples
/// ```
/// # use packquant::{PackedColorMap, pack};
/// let mut map = PackedColorMap::new();
/// let red = pack([255, 0, 0, 255]);
/// map.increment(red);
/// map.increment(red);
/// assert_eq!(map.get(red), Some(2));
/// assert!(map.remove(red));
/// assert_eq!(map.get(red), None);
/// ```
#[derive(Debug, Clone)]
pub struct PackedColorMap {
    /// The head entry of each bucket chain.
    table: Vec<u32>,
    /// The entry arena.
    entries: Vec<Entry>,
    /// The head of the free slot list.
    free: u32,
    /// The number of live entries.
    size: usize,
    /// The size above which the table is grown.
    threshold: usize,
    /// Incremented on every structural change.
    modifications: u64,
}

impl Default for PackedColorMap {
    fn default() -> Self {
        Self::new()
    }
}

impl PackedColorMap {
    /// Creates an empty map with the default number of buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty map with at least `capacity` buckets.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY).next_power_of_two();
        Self {
            table: vec![NIL; capacity],
            entries: Vec::new(),
            free: NIL,
            size: 0,
            threshold: capacity / 2,
            modifications: 0,
        }
    }

    /// Returns the number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of buckets. This is always a power of two.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.table.len()
    }

    /// Returns the bucket index for the given color.
    #[inline]
    fn bucket(&self, color: PackedColor) -> usize {
        hash(color) as usize & (self.table.len() - 1)
    }

    /// Returns the arena index of the entry for the given color.
    #[inline]
    fn find(&self, color: PackedColor) -> Option<usize> {
        let mut i = self.table[self.bucket(color)];
        while i != NIL {
            let entry = &self.entries[i as usize];
            if entry.color == color {
                return Some(i as usize);
            }
            i = entry.next;
        }
        None
    }

    /// Returns the value stored for the given color.
    #[inline]
    #[must_use]
    pub fn get(&self, color: PackedColor) -> Option<i32> {
        self.find(color).map(|i| self.entries[i].value)
    }

    /// Returns whether the map contains the given color.
    #[must_use]
    pub fn contains(&self, color: PackedColor) -> bool {
        self.find(color).is_some()
    }

    /// Adds one to the value of the given color, inserting it with a value of `1` if absent.
    ///
    /// The value saturates at `i32::MAX`. Returns the new value.
    #[inline]
    pub fn increment(&mut self, color: PackedColor) -> i32 {
        if let Some(i) = self.find(color) {
            let entry = &mut self.entries[i];
            entry.value = entry.value.saturating_add(1);
            entry.value
        } else {
            self.insert_new(color, 1);
            1
        }
    }

    /// Adds `delta` to the value of the given color, treating an absent color as `0`.
    ///
    /// The sum saturates at `i32::MAX`. Returns the new value.
    ///
    /// # Errors
    /// Returns [`MapError::InvalidArgument`] (leaving the map unchanged)
    /// if the resulting value would be negative.
    pub fn add(&mut self, color: PackedColor, delta: i32) -> Result<i32, MapError> {
        if let Some(i) = self.find(color) {
            let entry = &mut self.entries[i];
            let value = entry.value.saturating_add(delta);
            if value < 0 {
                return Err(MapError::InvalidArgument { color, value: i64::from(value) });
            }
            entry.value = value;
            Ok(value)
        } else if delta < 0 {
            Err(MapError::InvalidArgument { color, value: i64::from(delta) })
        } else {
            self.insert_new(color, delta);
            Ok(delta)
        }
    }

    /// Stores `value` for the given color, returning the previous value (if any).
    ///
    /// # Errors
    /// Returns [`MapError::InvalidArgument`] if `value` is negative.
    pub fn put(&mut self, color: PackedColor, value: i32) -> Result<Option<i32>, MapError> {
        if value < 0 {
            return Err(MapError::InvalidArgument { color, value: i64::from(value) });
        }

        if let Some(i) = self.find(color) {
            let previous = self.entries[i].value;
            self.entries[i].value = value;
            Ok(Some(previous))
        } else {
            self.insert_new(color, value);
            Ok(None)
        }
    }

    /// Removes the given color from the map. Returns whether it was present.
    pub fn remove(&mut self, color: PackedColor) -> bool {
        let bucket = self.bucket(color);
        let mut prev = NIL;
        let mut i = self.table[bucket];
        while i != NIL {
            let Entry { color: key, next, .. } = self.entries[i as usize];
            if key == color {
                if prev == NIL {
                    self.table[bucket] = next;
                } else {
                    self.entries[prev as usize].next = next;
                }

                let entry = &mut self.entries[i as usize];
                entry.value = -1;
                entry.next = self.free;
                self.free = i;

                self.size -= 1;
                self.modifications += 1;
                return true;
            }
            prev = i;
            i = next;
        }
        false
    }

    /// Removes all entries, keeping the current number of buckets.
    pub fn clear(&mut self) {
        self.table.fill(NIL);
        self.entries.clear();
        self.free = NIL;
        self.size = 0;
        self.modifications += 1;
    }

    /// Replaces the contents of this map with the contents of `other`.
    ///
    /// Any [`Cursor`] created from this map before the reset is invalidated.
    pub fn reset(&mut self, other: Self) {
        let modifications = self.modifications.max(other.modifications) + 1;
        *self = other;
        self.modifications = modifications;
    }

    /// Returns an iterator over the `(color, value)` pairs of the map in bucket order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter { map: self, bucket: 0, entry: NIL, remaining: self.size }
    }

    /// Returns a detached cursor over the map.
    ///
    /// Unlike [`PackedColorMap::iter`], a cursor does not borrow the map,
    /// so it can be interleaved with mutations.
    /// Any structural change not made through [`Cursor::remove`]
    /// causes later cursor operations to fail with [`MapError::ConcurrentModification`].
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor {
            bucket: 0,
            entry: NIL,
            last: None,
            expected_modifications: self.modifications,
        }
    }

    /// Inserts a color known to be absent.
    fn insert_new(&mut self, color: PackedColor, value: i32) {
        let bucket = self.bucket(color);
        let entry = Entry { color, value, next: self.table[bucket] };

        let slot = if self.free == NIL {
            #[allow(clippy::cast_possible_truncation)] // the arena never holds u32::MAX entries
            let slot = self.entries.len() as u32;
            self.entries.push(entry);
            slot
        } else {
            let slot = self.free;
            self.free = self.entries[slot as usize].next;
            self.entries[slot as usize] = entry;
            slot
        };

        self.table[bucket] = slot;
        self.size += 1;
        self.modifications += 1;

        if self.size > self.threshold {
            self.grow();
        }
    }

    /// Doubles the number of buckets and relinks every live entry.
    fn grow(&mut self) {
        let capacity = self.table.len() * 2;
        self.table.clear();
        self.table.resize(capacity, NIL);
        self.threshold = capacity / 2;

        let mask = capacity - 1;
        for (i, entry) in (0..).zip(&mut self.entries) {
            if entry.value >= 0 {
                let bucket = hash(entry.color) as usize & mask;
                entry.next = self.table[bucket];
                self.table[bucket] = i;
            }
        }
    }
}

impl<'a> IntoIterator for &'a PackedColorMap {
    type Item = (PackedColor, i32);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the entries of a [`PackedColorMap`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    /// The map being iterated.
    map: &'a PackedColorMap,
    /// The next bucket to visit.
    bucket: usize,
    /// The next entry in the current chain.
    entry: u32,
    /// The number of entries not yet yielded.
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (PackedColor, i32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.entry != NIL {
                let Entry { color, value, next } = self.map.entries[self.entry as usize];
                self.entry = next;
                self.remaining -= 1;
                return Some((color, value));
            }
            if self.bucket >= self.map.table.len() {
                return None;
            }
            self.entry = self.map.table[self.bucket];
            self.bucket += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> ExactSizeIterator for Iter<'a> {}

/// A detached, fail-fast position within a [`PackedColorMap`].
///
/// Created by [`PackedColorMap::cursor`].
#[derive(Debug, Clone)]
pub struct Cursor {
    /// The next bucket to visit.
    bucket: usize,
    /// The next entry in the current chain.
    entry: u32,
    /// The color returned by the last call to `advance`.
    last: Option<PackedColor>,
    /// The modification count of the map this cursor is valid for.
    expected_modifications: u64,
}

impl Cursor {
    /// Ensures the map has not been structurally modified behind this cursor's back.
    fn check(&self, map: &PackedColorMap) -> Result<(), MapError> {
        if map.modifications == self.expected_modifications {
            Ok(())
        } else {
            Err(MapError::ConcurrentModification)
        }
    }

    /// Moves to the next entry and returns it, or `None` once all entries were visited.
    ///
    /// # Errors
    /// Returns [`MapError::ConcurrentModification`] if `map` was structurally modified
    /// after this cursor was created (other than through [`Cursor::remove`]).
    pub fn advance(
        &mut self,
        map: &PackedColorMap,
    ) -> Result<Option<(PackedColor, i32)>, MapError> {
        self.check(map)?;
        loop {
            if self.entry != NIL {
                let Entry { color, value, next } = map.entries[self.entry as usize];
                self.entry = next;
                self.last = Some(color);
                return Ok(Some((color, value)));
            }
            if self.bucket >= map.table.len() {
                self.last = None;
                return Ok(None);
            }
            self.entry = map.table[self.bucket];
            self.bucket += 1;
        }
    }

    /// Removes the entry last returned by [`Cursor::advance`] from `map`.
    ///
    /// # Errors
    /// Returns [`MapError::ConcurrentModification`] if `map` was modified behind this cursor's back,
    /// or [`MapError::NoCurrentEntry`] if there is no entry to remove.
    pub fn remove(&mut self, map: &mut PackedColorMap) -> Result<(), MapError> {
        self.check(map)?;
        let color = self.last.take().ok_or(MapError::NoCurrentEntry)?;
        map.remove(color);
        self.expected_modifications = map.modifications;
        Ok(())
    }
}
