// Thin, single-threaded readiness-notification wrapper around the
// platform epoll/kqueue backend in `syscalls`. One Reactor per worker.

use crate::error::Result;
use crate::syscalls::{self, Epoll, epoll_event, EPOLLERR, EPOLLHUP, EPOLLIN, EPOLLOUT};
use libc::c_int;

/// Readiness mask a registration is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interest(i32);

impl Interest {
    pub const READ: Interest = Interest(EPOLLIN);
    pub const WRITE: Interest = Interest(EPOLLOUT);

    pub fn read_write() -> Interest {
        Interest(EPOLLIN | EPOLLOUT)
    }

    pub fn bits(self) -> i32 {
        self.0
    }
}

impl std::ops::BitOr for Interest {
    type Output = Interest;
    fn bitor(self, rhs: Interest) -> Interest {
        Interest(self.0 | rhs.0)
    }
}

/// One readiness event returned from a `poll` call.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub token: u64,
    pub readable: bool,
    pub writable: bool,
}

pub struct Reactor {
    epoll: Epoll,
    events: Vec<epoll_event>,
}

impl Reactor {
    pub fn new(capacity: usize) -> Result<Self> {
        let epoll = Epoll::new()?;
        Ok(Self {
            epoll,
            events: vec![epoll_event { events: 0, u64: 0 }; capacity],
        })
    }

    pub fn register(&self, fd: c_int, token: u64, interest: Interest) -> Result<()> {
        self.epoll.add(fd, token, interest.bits())
    }

    pub fn reregister(&self, fd: c_int, token: u64, interest: Interest) -> Result<()> {
        self.epoll.modify(fd, token, interest.bits())
    }

    pub fn deregister(&self, fd: c_int) -> Result<()> {
        self.epoll.delete(fd)
    }

    /// Block up to `timeout_ms` for readiness. An interrupted wait (EINTR)
    /// yields zero events rather than an error. HUP/ERR are folded into
    /// `readable`: a half-closed or errored peer must still reach the
    /// readable handler so the connection gets torn down instead of
    /// leaking until the idle prune.
    pub fn poll(&mut self, timeout_ms: i32) -> Result<impl Iterator<Item = Event> + '_> {
        let n = self.epoll.wait(&mut self.events, timeout_ms)?;
        Ok(self.events[..n].iter().map(|e| {
            let hup_or_err = (e.events & (EPOLLHUP | EPOLLERR) as u32) != 0;
            Event {
                token: e.u64,
                readable: (e.events & EPOLLIN as u32) != 0 || hup_or_err,
                writable: (e.events & EPOLLOUT as u32) != 0,
            }
        }))
    }
}

/// Drain the accept queue until it would block. `on_accept` returns `false`
/// to stop accepting early (e.g. the connection slab is full).
pub fn accept_all(listen_fd: c_int, mut on_accept: impl FnMut(c_int) -> bool) {
    loop {
        match syscalls::accept_connection(listen_fd) {
            Ok(Some(client_fd)) => {
                if !on_accept(client_fd) {
                    break;
                }
            }
            Ok(None) => break,
            Err(_) => break,
        }
    }
}
