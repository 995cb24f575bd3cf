// Per-connection state. A Connection owns everything tied to one
// descriptor's lifetime: its arena, its read/write buffers, and the
// bookkeeping the worker's state machine needs to drive it. Parsed
// requests are never stored here — they are parsed, dispatched, and
// serialized to completion within a single readable-handler call, so no
// self-referential borrow from `arena` ever needs to outlive that call.

use crate::arena::Arena;
use crate::buffer::Buffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    New,
    Reading,
    Dispatching,
    Responding,
    Closed,
}

pub struct Connection {
    pub fd: i32,
    pub state: ConnState,
    pub arena: Arena,
    pub read_buf: Buffer,
    pub write_buf: Buffer,
    pub keep_alive: bool,
    pub last_active: u32,
    pub requests_served: u32,
}

impl Connection {
    pub fn new(fd: i32, now: u32) -> Self {
        Self {
            fd,
            state: ConnState::New,
            arena: Arena::new(),
            read_buf: Buffer::new(),
            write_buf: Buffer::new(),
            keep_alive: true,
            last_active: now,
            requests_served: 0,
        }
    }

    /// Reset for keep-alive reuse: truncate both buffers (keeping their
    /// capacity) and recreate the arena fresh, per request.
    pub fn reset_for_next_request(&mut self) {
        self.read_buf.clear();
        self.write_buf.clear();
        self.arena.reset();
        self.state = ConnState::Reading;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_truncates_buffers_but_keeps_capacity() {
        let mut conn = Connection::new(3, 0);
        conn.read_buf.append(b"partial request line");
        conn.write_buf.append(b"HTTP/1.1 200 OK\r\n\r\n");
        let read_cap = conn.read_buf.capacity();
        let write_cap = conn.write_buf.capacity();

        conn.reset_for_next_request();

        assert_eq!(conn.read_buf.len(), 0);
        assert_eq!(conn.write_buf.len(), 0);
        assert_eq!(conn.read_buf.capacity(), read_cap);
        assert_eq!(conn.write_buf.capacity(), write_cap);
        assert_eq!(conn.state, ConnState::Reading);
    }
}
