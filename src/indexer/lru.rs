use crate::{color::pack, ColorIndexer, PackedColor, PackedColorMap, Palette};
use log::trace;
use parking_lot::Mutex;

/// Marks the end of the recency list.
const NIL: u32 = u32::MAX;

/// A cached lookup in the recency list.
#[derive(Debug, Clone, Copy)]
struct Node {
    /// The looked up color.
    color: PackedColor,
    /// The palette index found for `color`.
    index: u8,
    /// The next more recently used node.
    prev: u32,
    /// The next less recently used node.
    next: u32,
}

/// A fixed capacity least recently used map from colors to palette indices.
#[derive(Debug)]
struct LruCache {
    /// The maximum number of cached colors.
    capacity: usize,
    /// Color to node slot.
    slots: PackedColorMap,
    /// The node arena.
    nodes: Vec<Node>,
    /// The most recently used node.
    head: u32,
    /// The least recently used node.
    tail: u32,
}

impl LruCache {
    /// Creates an empty cache holding at most `capacity` colors.
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: PackedColorMap::with_capacity(capacity.min(4096) * 2),
            nodes: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    /// Removes a node from the recency list.
    fn unlink(&mut self, slot: u32) {
        let Node { prev, next, .. } = self.nodes[slot as usize];
        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev as usize].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next as usize].prev = prev;
        }
    }

    /// Makes a detached node the most recently used.
    fn push_front(&mut self, slot: u32) {
        let node = &mut self.nodes[slot as usize];
        node.prev = NIL;
        node.next = self.head;
        if self.head == NIL {
            self.tail = slot;
        } else {
            self.nodes[self.head as usize].prev = slot;
        }
        self.head = slot;
    }

    /// Returns the cached index for `color` and marks it as most recently used.
    fn get(&mut self, color: PackedColor) -> Option<u8> {
        #[allow(clippy::cast_sign_loss)]
        let slot = self.slots.get(color)? as u32;
        if slot != self.head {
            self.unlink(slot);
            self.push_front(slot);
        }
        Some(self.nodes[slot as usize].index)
    }

    /// Caches `index` for `color`, evicting the least recently used color if full.
    fn insert(&mut self, color: PackedColor, index: u8) {
        if let Some(slot) = self.slots.get(color) {
            // another thread resolved the same color first
            self.nodes[slot.unsigned_abs() as usize].index = index;
            return;
        }

        let slot = if self.nodes.len() < self.capacity {
            #[allow(clippy::cast_possible_truncation)]
            let slot = self.nodes.len() as u32;
            self.nodes.push(Node { color, index, prev: NIL, next: NIL });
            slot
        } else {
            let slot = self.tail;
            let evicted = self.nodes[slot as usize].color;
            self.unlink(slot);
            self.slots.remove(evicted);
            self.nodes[slot as usize] = Node { color, index, prev: NIL, next: NIL };
            trace!("evicted {evicted:#010x} from color lookup cache");
            slot
        };

        self.push_front(slot);
        #[allow(clippy::cast_possible_wrap)]
        let value = slot as i32;
        // slots are below the capacity, so never negative
        let _ = self.slots.put(color, value);
    }
}

/// A bounded cache of recent lookups in front of another [`ColorIndexer`].
///
/// At most `capacity` colors are remembered; the least recently looked up color
/// is forgotten first. Only the cache check and update hold the lock,
/// so lookups of uncached colors from multiple threads run in parallel.
#[derive(Debug)]
pub struct LruIndexer<I> {
    /// The indexer used on a cache miss.
    inner: I,
    /// The cached lookups.
    cache: Mutex<LruCache>,
}

impl<I: ColorIndexer> LruIndexer<I> {
    /// The largest supported capacity.
    pub const MAX_CAPACITY: usize = i32::MAX as usize;

    /// Creates a new [`LruIndexer`] remembering at most `capacity` colors.
    ///
    /// The capacity is clamped to `1..=LruIndexer::MAX_CAPACITY`.
    #[must_use]
    pub fn new(inner: I, capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Self::MAX_CAPACITY);
        Self { inner, cache: Mutex::new(LruCache::new(capacity)) }
    }

    /// The maximum number of cached colors.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.lock().capacity
    }

    /// The number of currently cached colors.
    #[must_use]
    pub fn cached_colors(&self) -> usize {
        self.cache.lock().slots.len()
    }

    /// The wrapped indexer.
    #[must_use]
    pub fn inner(&self) -> &I {
        &self.inner
    }

    /// Forgets all cached colors.
    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        let capacity = cache.capacity;
        *cache = LruCache::new(capacity);
    }
}

impl<I: ColorIndexer> ColorIndexer for LruIndexer<I> {
    fn closest_index(&self, rgba: [u8; 4]) -> u8 {
        let color = pack(rgba);

        let cached = self.cache.lock().get(color);
        if let Some(index) = cached {
            return index;
        }

        let index = self.inner.closest_index(rgba);
        self.cache.lock().insert(color, index);
        index
    }

    fn to_palette(&self) -> Palette {
        self.inner.to_palette()
    }

    fn palette_len(&self) -> usize {
        self.inner.palette_len()
    }
}
