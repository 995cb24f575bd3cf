// Connection table with O(1) allocate/free. Unlike a POD-struct slab, a
// Connection owns heap data (arena, buffers) that can't be left dirty and
// reused via raw bytes, so free slots are tracked with an explicit free
// list instead of the intrusive fd-as-next-pointer trick a flat array of
// Copy structs would allow.

use crate::conn::Connection;

pub struct ConnectionSlab {
    entries: Vec<Option<Connection>>,
    free_list: Vec<usize>,
    capacity: usize,
    active_count: usize,
}

impl ConnectionSlab {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.min(1024)),
            free_list: Vec::new(),
            capacity,
            active_count: 0,
        }
    }

    /// O(1) allocation (amortized): reuse a freed slot if one exists,
    /// otherwise grow the table. Returns None once `capacity` is reached.
    pub fn allocate(&mut self, conn: Connection) -> Option<usize> {
        if let Some(idx) = self.free_list.pop() {
            self.entries[idx] = Some(conn);
            self.active_count += 1;
            return Some(idx);
        }
        if self.entries.len() >= self.capacity {
            return None;
        }
        self.entries.push(Some(conn));
        self.active_count += 1;
        Some(self.entries.len() - 1)
    }

    /// O(1) deallocation: drop the connection and push its slot onto the
    /// free list.
    pub fn free(&mut self, index: usize) {
        if index >= self.entries.len() {
            return;
        }
        if self.entries[index].take().is_some() {
            self.free_list.push(index);
            self.active_count -= 1;
        }
    }

    pub fn get(&self, index: usize) -> Option<&Connection> {
        self.entries.get(index).and_then(|e| e.as_ref())
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Connection> {
        self.entries.get_mut(index).and_then(|e| e.as_mut())
    }

    pub fn len(&self) -> usize {
        self.active_count
    }

    pub fn is_empty(&self) -> bool {
        self.active_count == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over occupied slot indices. Used for idle-connection
    /// pruning and shutdown cleanup.
    pub fn occupied_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|_| i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_free_reuses_the_freed_slot() {
        let mut slab = ConnectionSlab::new(10);
        assert_eq!(slab.len(), 0);

        let idx1 = slab.allocate(Connection::new(100, 0)).unwrap();
        assert_eq!(idx1, 0);
        let idx2 = slab.allocate(Connection::new(101, 0)).unwrap();
        assert_eq!(idx2, 1);

        slab.free(idx1);
        assert_eq!(slab.len(), 1);

        let idx3 = slab.allocate(Connection::new(102, 0)).unwrap();
        assert_eq!(idx3, idx1);
        assert_eq!(slab.get(idx3).unwrap().fd, 102);
    }

    #[test]
    fn allocate_fails_once_capacity_is_reached() {
        let mut slab = ConnectionSlab::new(2);
        slab.allocate(Connection::new(1, 0)).unwrap();
        slab.allocate(Connection::new(2, 0)).unwrap();
        assert!(slab.allocate(Connection::new(3, 0)).is_none());
    }

    #[test]
    fn double_free_is_a_no_op() {
        let mut slab = ConnectionSlab::new(4);
        let idx = slab.allocate(Connection::new(1, 0)).unwrap();
        slab.free(idx);
        slab.free(idx);
        assert_eq!(slab.len(), 0);
        assert_eq!(slab.free_list.len(), 1);
    }
}
