//! LRU Map Module
//!
//! Key-indexed doubly linked list giving O(1) lookup, promotion, insertion
//! and eviction.
//!
//! Nodes live in a slab (`Vec`) and link to each other by index:
//! - Head = Most recently used
//! - Tail = Least recently used
//!
//! Freed slots are recycled through a free list.

use std::collections::HashMap;

const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Slot<V> {
    key: String,
    value: V,
    prev: usize,
    next: usize,
}

// == LRU Map ==
/// Map that remembers the order in which its keys were used.
#[derive(Debug)]
pub struct LruMap<V> {
    index: HashMap<String, usize>,
    slots: Vec<Option<Slot<V>>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
}

impl<V> Default for LruMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> LruMap<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-allocates room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    // == Lookup ==
    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Returns the value for `key` without touching recency.
    pub fn peek(&self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    // == Put ==
    /// Inserts or overwrites `key`, always making it most recently used.
    ///
    /// Returns the previous value on overwrite.
    pub fn put(&mut self, key: String, value: V) -> Option<V> {
        if let Some(&idx) = self.index.get(&key) {
            self.move_to_front(idx);
            return self.slots[idx]
                .as_mut()
                .map(|slot| std::mem::replace(&mut slot.value, value));
        }

        let slot = Slot {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };

        self.index.insert(key, idx);
        self.attach_front(idx);
        None
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.release(idx).map(|slot| slot.value)
    }

    // == Evict ==
    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(String, V)> {
        if self.tail == NIL {
            return None;
        }

        let slot = self.release(self.tail)?;
        self.index.remove(&slot.key);
        Some((slot.key, slot.value))
    }

    // == Iteration ==
    /// Keys from most to least recently used.
    pub fn keys(&self) -> Keys<'_, V> {
        Keys {
            map: self,
            cursor: self.head,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Linking ==
    fn release(&mut self, idx: usize) -> Option<Slot<V>> {
        self.detach(idx);
        let slot = self.slots.get_mut(idx)?.take()?;
        self.free.push(idx);
        Some(slot)
    }

    fn links(&self, idx: usize) -> (usize, usize) {
        match self.slots.get(idx) {
            Some(Some(slot)) => (slot.prev, slot.next),
            _ => (NIL, NIL),
        }
    }

    fn set_prev(&mut self, idx: usize, prev: usize) {
        if let Some(Some(slot)) = self.slots.get_mut(idx) {
            slot.prev = prev;
        }
    }

    fn set_next(&mut self, idx: usize, next: usize) {
        if let Some(Some(slot)) = self.slots.get_mut(idx) {
            slot.next = next;
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = self.links(idx);

        if prev == NIL {
            self.head = next;
        } else {
            self.set_next(prev, next);
        }

        if next == NIL {
            self.tail = prev;
        } else {
            self.set_prev(next, prev);
        }

        self.set_prev(idx, NIL);
        self.set_next(idx, NIL);
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        self.set_prev(idx, NIL);
        self.set_next(idx, old_head);

        if old_head == NIL {
            self.tail = idx;
        } else {
            self.set_prev(old_head, idx);
        }

        self.head = idx;
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head != idx {
            self.detach(idx);
            self.attach_front(idx);
        }
    }
}

// == Keys Iterator ==
pub struct Keys<'a, V> {
    map: &'a LruMap<V>,
    cursor: usize,
}

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let slot = self.map.slots.get(self.cursor)?.as_ref()?;
        self.cursor = slot.next;
        Some(slot.key.as_str())
    }
}
