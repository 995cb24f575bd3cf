// The master process: forks N workers off a shared listening
// configuration, reaps and respawns them by slot, and shuts everything
// down on INT/TERM. Modules are initialized once here, before the first
// fork, so read-only state built during init is inherited by every child
// rather than rebuilt N times.

use crate::config::Config;
use crate::error::{CrateError, Result};
use crate::logging::Level;
use crate::module::ModuleChain;
use crate::signal;
use crate::worker::Worker;
use std::sync::atomic::AtomicBool;

/// One slot in the supervisor's worker table. A respawned worker reuses its
/// dead predecessor's slot index, so slot identity is stable across the
/// process's lifetime even as PIDs change.
struct Slot {
    pid: Option<libc::pid_t>,
}

pub struct Supervisor {
    config: Config,
}

impl Supervisor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Explicit config value, else online CPUs, else 1.
    fn worker_count(&self) -> usize {
        if self.config.worker_processes > 0 {
            self.config.worker_processes
        } else {
            num_cpus::get().max(1)
        }
    }

    /// Run the supervisor to completion: fork workers, watch signals, reap
    /// and respawn, and on shutdown terminate every worker before
    /// returning. `build_modules` is called once here in the parent, before
    /// any fork, so `init_all` runs exactly once per process lifetime; each
    /// forked child then builds its own post-init chain instance.
    pub fn run(self, build_modules: impl Fn() -> ModuleChain) -> Result<()> {
        signal::install();

        let mut modules = build_modules();
        modules
            .init_all(&self.config)
            .map_err(|e| CrateError::Other(format!("module init failed: {e}")))?;

        let worker_count = self.worker_count();
        crate::logf!(
            Level::Info,
            "supervisor",
            "starting {} worker(s) on {}:{}",
            worker_count,
            self.config.listen_host,
            self.config.listen_port
        );

        let mut slots: Vec<Slot> = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            slots.push(self.spawn_worker(id, &build_modules)?);
        }

        loop {
            if signal::quit_requested() {
                break;
            }
            if signal::take_reload_requested() {
                crate::logf!(
                    Level::Info,
                    "supervisor",
                    "reload requested (HUP); hot-reload is not implemented, ignoring"
                );
            }
            if signal::child_exited() {
                self.reap_and_respawn(&mut slots, &build_modules)?;
            }

            std::thread::sleep(std::time::Duration::from_secs(1));
        }

        self.shutdown_all(&slots);
        modules.cleanup_all();
        crate::logf!(Level::Info, "supervisor", "shutdown complete");
        Ok(())
    }

    fn spawn_worker(&self, id: usize, build_modules: &impl Fn() -> ModuleChain) -> Result<Slot> {
        let config = self.config.clone();
        let core_ids = core_affinity::get_core_ids().unwrap_or_default();
        let core_id = core_ids.get(id % core_ids.len().max(1)).copied();
        match unsafe { libc::fork() } {
            -1 => Err(std::io::Error::last_os_error().into()),
            0 => {
                if let Some(id) = core_id {
                    core_affinity::set_for_current(id);
                }
                // Child: build a fresh chain instance. Modules were already
                // init'd once in the parent above; a child re-running
                // init_all would be redundant but harmless for modules
                // whose init is idempotent, so we skip it here entirely and
                // rely on fork's copy-on-write inheritance of parent state
                // instead where a module's init has side effects worth
                // sharing.
                let modules = build_modules();
                let shutdown = AtomicBool::new(false);
                let mut worker = Worker::new(id, config, modules);
                if let Err(e) = worker.run(&shutdown) {
                    crate::logf!(Level::Error, "worker", "worker {id} exited with error: {e}");
                    std::process::exit(1);
                }
                std::process::exit(0);
            }
            pid => Ok(Slot { pid: Some(pid) }),
        }
    }

    /// Non-blocking reap of any exited children, respawning a replacement
    /// for each slot whose worker died. Keeps slot identity stable: the
    /// respawned worker inherits the index of the one that died.
    fn reap_and_respawn(
        &self,
        slots: &mut [Slot],
        build_modules: &impl Fn() -> ModuleChain,
    ) -> Result<()> {
        loop {
            let mut status: libc::c_int = 0;
            let pid = unsafe { libc::waitpid(-1, &mut status, libc::WNOHANG) };
            if pid <= 0 {
                break;
            }
            if let Some(idx) = slots.iter().position(|s| s.pid == Some(pid)) {
                crate::logf!(
                    Level::Warn,
                    "supervisor",
                    "worker in slot {idx} (pid {pid}) exited, respawning"
                );
                slots[idx] = self.spawn_worker(idx, build_modules)?;
            }
        }
        Ok(())
    }

    fn shutdown_all(&self, slots: &[Slot]) {
        for slot in slots {
            if let Some(pid) = slot.pid {
                unsafe { libc::kill(pid, libc::SIGTERM) };
            }
        }
        for slot in slots {
            if let Some(pid) = slot.pid {
                let mut status: libc::c_int = 0;
                unsafe { libc::waitpid(pid, &mut status, 0) };
            }
        }
    }
}
