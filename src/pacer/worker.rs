use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use super::controller::Shared;

/// Cycle periods shutdown waits for the loop to acknowledge before detaching.
const SHUTDOWN_GRACE_CYCLES: u32 = 5;
const MIN_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);
const THREAD_NAME: &str = "replay-pacer";

/// Lifecycle of the controller loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not started, or start was skipped because the pacer is disabled.
    Idle,
    /// The periodic cycle is active.
    Running,
    /// Shutdown was requested and the loop has been joined or detached.
    Stopped,
}

#[derive(Debug, Default)]
struct LoopFlags {
    shutdown: bool,
    exited: bool,
}

/// Shutdown flag plus the condvar the loop sleeps on between cycles.
#[derive(Debug, Default)]
pub(crate) struct LoopSignal {
    flags: Mutex<LoopFlags>,
    wakeup: Condvar,
}

impl LoopSignal {
    fn request_shutdown(&self) {
        let mut flags = self.flags.lock();
        flags.shutdown = true;
        self.wakeup.notify_all();
    }

    /// Sleeps until `deadline` or shutdown; returns true when shutdown was
    /// requested.
    fn sleep_until(&self, deadline: Instant) -> bool {
        let mut flags = self.flags.lock();
        while !flags.shutdown {
            if self.wakeup.wait_until(&mut flags, deadline).timed_out() {
                break;
            }
        }
        flags.shutdown
    }

    fn mark_exited(&self) {
        let mut flags = self.flags.lock();
        flags.exited = true;
        self.wakeup.notify_all();
    }

    fn wait_exited(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        let mut flags = self.flags.lock();
        while !flags.exited {
            if self.wakeup.wait_until(&mut flags, deadline).timed_out() {
                break;
            }
        }
        flags.exited
    }
}

/// Marks the loop as exited even when a cycle panics.
struct ExitGuard<'a>(&'a LoopSignal);

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_exited();
    }
}

/// Owner-side handle of the loop thread.
#[derive(Debug)]
pub(crate) struct ControllerLoop {
    state: LoopState,
    handle: Option<JoinHandle<()>>,
}

impl Default for ControllerLoop {
    fn default() -> Self {
        Self {
            state: LoopState::Idle,
            handle: None,
        }
    }
}

impl ControllerLoop {
    pub(crate) fn state(&self) -> LoopState {
        self.state
    }

    /// Spawns the loop if idle. Spawn failures are logged and leave the loop
    /// idle.
    pub(crate) fn start(&mut self, shared: &Arc<Shared>) -> LoopState {
        if self.state != LoopState::Idle {
            debug!(state = ?self.state, "replay.pacer.start_ignored");
            return self.state;
        }
        match spawn_loop(Arc::clone(shared)) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state = LoopState::Running;
                info!("replay.pacer.controller_started");
            }
            Err(err) => {
                warn!(error = %err, "replay.pacer.controller_spawn_failed");
            }
        }
        self.state
    }

    /// Signals shutdown and joins the loop, waiting at most a few cycle
    /// periods before detaching it.
    pub(crate) fn stop(&mut self, shared: &Shared) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        shared.signal.request_shutdown();
        let grace =
            (shared.config.load().cycle_interval() * SHUTDOWN_GRACE_CYCLES).max(MIN_SHUTDOWN_GRACE);
        self.state = LoopState::Stopped;
        if !shared.signal.wait_exited(grace) {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "replay.pacer.shutdown_timeout"
            );
            return;
        }
        match handle.join() {
            Ok(()) => info!("replay.pacer.controller_stopped"),
            Err(_) => warn!("replay.pacer.controller_join_failed"),
        }
    }
}

fn spawn_loop(shared: Arc<Shared>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || run_loop(&shared))
}

fn run_loop(shared: &Shared) {
    let _exit = ExitGuard(&shared.signal);
    loop {
        let started = Instant::now();
        shared.run_cycle(started);
        let deadline = started + shared.config.load().cycle_interval();
        if shared.signal.sleep_until(deadline) {
            debug!("replay.pacer.loop_exit");
            break;
        }
    }
}
