// One worker process: binds a SO_REUSEPORT listener, drives a single
// reactor, and runs the connection state machine of 4.6 until told to
// shut down. No threads; everything below `run` is single-threaded and
// non-blocking between `poll` calls.

use crate::config::Config;
use crate::conn::{ConnState, Connection};
use crate::error::Result;
use crate::module::ModuleChain;
use crate::parser::{self, ParseError};
use crate::reactor::{accept_all, Event, Interest, Reactor};
use crate::response::Response;
use crate::slab::ConnectionSlab;
use crate::syscalls;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Sentinel token identifying the listening socket's readiness events,
/// distinct from any real slab index.
const LISTEN_TOKEN: u64 = u64::MAX;

/// Idle connections with no activity for this long are pruned as a
/// resource-exhaustion guard (documented as an Open Question decision).
const IDLE_TIMEOUT_SECS: u32 = 60;

/// Scratch buffer for one non-blocking read. Sized generously; oversized
/// request lines/headers beyond this many reads accumulate in the
/// connection's own read buffer across repeated wakeups.
const READ_CHUNK: usize = 8192;

fn now_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as u32
}

pub struct Worker {
    id: usize,
    config: Config,
    modules: ModuleChain,
}

impl Worker {
    pub fn new(id: usize, config: Config, modules: ModuleChain) -> Self {
        Self { id, config, modules }
    }

    /// Drive this worker's reactor until `shutdown` is set or the process
    /// receives SIGTERM/SIGINT (checked via `signal::quit_requested()`,
    /// since the handler installed by the supervisor before `fork()` is
    /// inherited by every worker). Returns once the listening socket and
    /// all open connections have been released.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        let listen_fd = syscalls::create_listen_socket_reuseport(
            &self.config.listen_host,
            self.config.listen_port,
        )?;

        let mut reactor = Reactor::new(self.config.worker_connections)?;
        reactor.register(listen_fd, LISTEN_TOKEN, Interest::READ)?;

        let mut slab = ConnectionSlab::new(self.config.worker_connections);

        crate::logf!(
            crate::logging::Level::Info,
            "worker",
            "worker {} listening on {}:{}",
            self.id,
            self.config.listen_host,
            self.config.listen_port
        );

        let mut last_prune = now_secs();

        while !shutdown.load(Ordering::Acquire) && !crate::signal::quit_requested() {
            let events: Vec<Event> = match reactor.poll(1000) {
                Ok(iter) => iter.collect(),
                Err(_) => continue,
            };

            if crate::signal::quit_requested() {
                break;
            }

            for event in events {
                if event.token == LISTEN_TOKEN {
                    self.accept_new(listen_fd, &mut reactor, &mut slab);
                    continue;
                }

                let idx = event.token as usize;
                self.drive_connection(idx, event, &mut reactor, &mut slab);
            }

            let now = now_secs();
            if now.wrapping_sub(last_prune) >= 1 {
                self.prune_idle(now, &mut reactor, &mut slab);
                last_prune = now;
            }
        }

        unsafe { libc::close(listen_fd) };
        for idx in slab.occupied_indices().collect::<Vec<_>>() {
            if let Some(conn) = slab.get(idx) {
                let _ = reactor.deregister(conn.fd);
                unsafe { libc::close(conn.fd) };
            }
        }

        crate::logf!(
            crate::logging::Level::Info,
            "worker",
            "worker {} shut down",
            self.id
        );
        Ok(())
    }

    fn accept_new(&self, listen_fd: i32, reactor: &mut Reactor, slab: &mut ConnectionSlab) {
        let now = now_secs();
        accept_all(listen_fd, |client_fd| {
            let conn = Connection::new(client_fd, now);
            match slab.allocate(conn) {
                Some(idx) => {
                    if reactor.register(client_fd, idx as u64, Interest::READ).is_err() {
                        slab.free(idx);
                        unsafe { libc::close(client_fd) };
                    } else if let Some(conn) = slab.get_mut(idx) {
                        conn.state = ConnState::Reading;
                    }
                    true
                }
                None => {
                    unsafe { libc::close(client_fd) };
                    true
                }
            }
        });
    }

    fn prune_idle(&self, now: u32, reactor: &mut Reactor, slab: &mut ConnectionSlab) {
        let stale: Vec<usize> = slab
            .occupied_indices()
            .filter(|&i| {
                slab.get(i)
                    .map(|c| now.wrapping_sub(c.last_active) > IDLE_TIMEOUT_SECS)
                    .unwrap_or(false)
            })
            .collect();
        for idx in stale {
            if let Some(conn) = slab.get(idx) {
                let _ = reactor.deregister(conn.fd);
                unsafe { libc::close(conn.fd) };
            }
            slab.free(idx);
        }
    }

    /// Run the readable and/or writable handlers for one connection event,
    /// closing and freeing its slot on any terminal transition.
    fn drive_connection(
        &self,
        idx: usize,
        event: Event,
        reactor: &mut Reactor,
        slab: &mut ConnectionSlab,
    ) {
        if event.readable {
            self.on_readable(idx, reactor, slab);
        }
        if matches!(slab.get(idx).map(|c| c.state), Some(ConnState::Closed)) {
            self.close_connection(idx, reactor, slab);
            return;
        }
        if event.writable {
            self.on_writable(idx, reactor, slab);
        }
        if matches!(slab.get(idx).map(|c| c.state), Some(ConnState::Closed)) {
            self.close_connection(idx, reactor, slab);
        }
    }

    fn close_connection(&self, idx: usize, reactor: &mut Reactor, slab: &mut ConnectionSlab) {
        if let Some(conn) = slab.get(idx) {
            let _ = reactor.deregister(conn.fd);
            unsafe { libc::close(conn.fd) };
        }
        slab.free(idx);
    }

    /// Non-blocking read into a scratch buffer, appended to the connection's
    /// read buffer, then an incremental parse attempt. EAGAIN is success
    /// with zero bytes written to state; EOF or a read error closes the
    /// connection.
    fn on_readable(&self, idx: usize, reactor: &mut Reactor, slab: &mut ConnectionSlab) {
        let fd = match slab.get(idx) {
            Some(c) => c.fd,
            None => return,
        };

        let mut scratch = [0u8; READ_CHUNK];
        loop {
            match syscalls::read_nonblocking(fd, &mut scratch) {
                Ok(None) => break, // EAGAIN: no more data this wakeup
                Ok(Some(0)) => {
                    if let Some(conn) = slab.get_mut(idx) {
                        conn.state = ConnState::Closed;
                    }
                    return;
                }
                Ok(Some(n)) => {
                    if let Some(conn) = slab.get_mut(idx) {
                        conn.read_buf.append(&scratch[..n]);
                        conn.last_active = now_secs();
                    }
                    if n < scratch.len() {
                        break; // short read: drained the socket for now
                    }
                }
                Err(_) => {
                    if let Some(conn) = slab.get_mut(idx) {
                        conn.state = ConnState::Closed;
                    }
                    return;
                }
            }
        }

        self.try_parse_and_dispatch(idx, reactor, slab);
    }

    fn try_parse_and_dispatch(&self, idx: usize, reactor: &mut Reactor, slab: &mut ConnectionSlab) {
        let conn = match slab.get_mut(idx) {
            Some(c) => c,
            None => return,
        };
        if conn.state != ConnState::Reading {
            return;
        }

        let parsed = parser::parse_request(conn.read_buf.as_slice(), &mut conn.arena);
        match parsed {
            Err(ParseError::Incomplete) => {
                // need-more: stay in READING, nothing else to do
            }
            Err(ParseError::InvalidFormat) | Err(ParseError::TooLarge) => {
                conn.state = ConnState::Responding;
                conn.keep_alive = false;
                let mut response = Response::bad_request();
                response.serialize_into(&mut conn.write_buf);
                self.begin_write(idx, reactor, slab);
            }
            Ok((request, consumed)) => {
                conn.keep_alive = request.wants_keep_alive();
                conn.requests_served += 1;
                conn.state = ConnState::Dispatching;

                let mut response = Response::new();
                match self.modules.dispatch(&request, &mut response) {
                    crate::module::Outcome::Declined => {
                        response = Response::not_found();
                    }
                    crate::module::Outcome::Error => {
                        crate::logf!(
                            crate::logging::Level::Error,
                            "module",
                            "module chain returned error for {}",
                            request.path
                        );
                        if response.status == 200 {
                            response = Response::internal_error();
                        }
                    }
                    crate::module::Outcome::Handled => {}
                }

                crate::logf!(
                    crate::logging::Level::Info,
                    "access",
                    "{} {} -> {}",
                    request.method.as_str(),
                    request.path,
                    response.status
                );

                conn.read_buf.consume(consumed);
                conn.state = ConnState::Responding;
                response.serialize_into(&mut conn.write_buf);
                self.begin_write(idx, reactor, slab);
            }
        }
    }

    fn begin_write(&self, idx: usize, reactor: &mut Reactor, slab: &mut ConnectionSlab) {
        if let Some(conn) = slab.get(idx) {
            let _ = reactor.reregister(conn.fd, idx as u64, Interest::read_write());
        }
        self.on_writable(idx, reactor, slab);
    }

    /// Drain the write buffer with a single non-blocking write. Partial
    /// writes shift the remainder to the front and keep WRITE interest;
    /// a full drain resets for keep-alive or closes.
    fn on_writable(&self, idx: usize, reactor: &mut Reactor, slab: &mut ConnectionSlab) {
        let (fd, keep_alive) = match slab.get(idx) {
            Some(c) if c.state == ConnState::Responding => (c.fd, c.keep_alive),
            _ => return,
        };

        let pending = match slab.get(idx) {
            Some(c) => c.write_buf.as_slice().to_vec(),
            None => return,
        };
        if pending.is_empty() {
            return;
        }

        match syscalls::write_nonblocking(fd, &pending) {
            Ok(None) => {} // EAGAIN: buffer intact, wait for next writable event
            Ok(Some(n)) => {
                if let Some(conn) = slab.get_mut(idx) {
                    conn.write_buf.consume(n);
                    conn.last_active = now_secs();
                    if conn.write_buf.is_empty() {
                        if keep_alive {
                            conn.reset_for_next_request();
                            let _ = reactor.reregister(fd, idx as u64, Interest::READ);
                        } else {
                            conn.state = ConnState::Closed;
                        }
                    }
                }
            }
            Err(_) => {
                if let Some(conn) = slab.get_mut(idx) {
                    conn.state = ConnState::Closed;
                }
            }
        }
    }
}
