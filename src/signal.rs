// Async-signal-safe flag handling for the supervisor. The handler installed
// here does nothing but store into static atomics — all actual behavior
// (sending TERM to workers, reaping children, logging) happens later in the
// supervisor's main loop, which is the only async-signal-safe discipline a
// plain `fn(c_int)` handler can follow.

use libc::c_int;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIT: AtomicBool = AtomicBool::new(false);
static RELOAD: AtomicBool = AtomicBool::new(false);
static CHLD: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(sig: c_int) {
    match sig {
        libc::SIGINT | libc::SIGTERM => QUIT.store(true, Ordering::SeqCst),
        libc::SIGHUP => RELOAD.store(true, Ordering::SeqCst),
        libc::SIGCHLD => CHLD.store(true, Ordering::SeqCst),
        _ => {}
    }
}

/// Install handlers for INT, TERM, HUP, CHLD and ignore PIPE process-wide.
/// Must be called once, before any workers are forked, so children inherit
/// the same dispositions.
pub fn install() {
    unsafe {
        install_handler(libc::SIGINT, on_signal as usize);
        install_handler(libc::SIGTERM, on_signal as usize);
        install_handler(libc::SIGHUP, on_signal as usize);
        install_handler(libc::SIGCHLD, on_signal as usize);
        install_handler(libc::SIGPIPE, libc::SIG_IGN);
    }
}

unsafe fn install_handler(signum: c_int, handler: usize) {
    let mut action: libc::sigaction = std::mem::zeroed();
    action.sa_sigaction = handler;
    action.sa_flags = libc::SA_RESTART;
    libc::sigemptyset(&mut action.sa_mask);
    libc::sigaction(signum, &action, std::ptr::null_mut());
}

/// Check the quit flag. Sticky: once set it stays set, since shutdown is
/// a one-way transition.
pub fn quit_requested() -> bool {
    QUIT.load(Ordering::SeqCst)
}

/// Take and clear the reload flag so repeated polls don't re-log it.
pub fn take_reload_requested() -> bool {
    RELOAD.swap(false, Ordering::SeqCst)
}

/// Take and clear the CHLD flag: a true result means at least one child
/// exited since the last check and the caller should reap via `waitpid`.
pub fn child_exited() -> bool {
    CHLD.swap(false, Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_flag_is_consumed_once() {
        RELOAD.store(true, Ordering::SeqCst);
        assert!(take_reload_requested());
        assert!(!take_reload_requested());
    }
}
