// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Background process watch with per-name prompt cooldown and timed grants.
//!
//! While protection is On the loop polls process names, asks once per
//! cooldown window whether a watched app may use the camera, and on "yes"
//! turns protection Off and schedules a revert after the grant duration.
//!
//! Once a grant turns protection Off, the rest of that snapshot is skipped:
//! nothing is prompted while Off, so a second grant in the same pass could
//! only stack another revert timer.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::ProcessError;
use crate::protection::Controller;
use crate::state::ProtectionState;

// ── Capabilities ────────────────────────────────────

pub trait ProcessSource: Send + Sync {
    /// Executable names of all running processes, no paths.
    fn snapshot(&self) -> Result<Vec<String>, ProcessError>;
}

/// Blocking yes/no question shown to the user.
pub trait Prompter: Send + Sync {
    fn ask_grant(&self, exe: &str) -> bool;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ── Watch list ──────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WatchList {
    names: Vec<String>,
}

impl WatchList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { names: names.into_iter().map(|n| n.as_ref().to_ascii_lowercase()).collect() }
    }

    pub fn matches(&self, exe: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(exe))
    }
}

// ── Cooldown ────────────────────────────────────────

/// Last prompt per executable name (case-insensitive).
pub struct CooldownTable {
    window: Duration,
    last: Mutex<HashMap<String, Instant>>,
}

impl CooldownTable {
    pub fn new(window: Duration) -> Self {
        Self { window, last: Mutex::new(HashMap::new()) }
    }

    /// Read-and-mark under one lock: true if `exe` was never prompted or its
    /// last prompt is older than the window, in which case `now` is recorded.
    pub fn try_mark(&self, exe: &str, now: Instant) -> bool {
        let key = exe.to_ascii_lowercase();
        let mut last = self.last.lock();
        let due = match last.get(&key) {
            None => true,
            Some(prev) => now.saturating_duration_since(*prev) > self.window,
        };
        if due {
            last.insert(key, now);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.last.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Grant timers ────────────────────────────────────

struct PendingGrant {
    exe: String,
    token: CancelToken,
    thread: JoinHandle<()>,
}

// ── Watcher ─────────────────────────────────────────

pub struct Watcher {
    controller: Arc<Controller>,
    processes: Box<dyn ProcessSource>,
    prompter: Box<dyn Prompter>,
    clock: Box<dyn Clock>,
    watch_list: WatchList,
    cooldown: CooldownTable,
    poll_interval: Duration,
    grant_duration: Duration,
    grants: Mutex<Vec<PendingGrant>>,
}

impl Watcher {
    pub fn new(
        config: &Config,
        controller: Arc<Controller>,
        processes: Box<dyn ProcessSource>,
        prompter: Box<dyn Prompter>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            controller,
            processes,
            prompter,
            clock,
            watch_list: WatchList::new(&config.watched),
            cooldown: CooldownTable::new(config.prompt_cooldown),
            poll_interval: config.poll_interval,
            grant_duration: config.grant_duration,
            grants: Mutex::new(Vec::new()),
        }
    }

    pub fn cooldown(&self) -> &CooldownTable {
        &self.cooldown
    }

    /// One poll. Returns how many prompts were shown.
    pub fn run_iteration(&self) -> usize {
        if self.controller.state() != ProtectionState::On {
            return 0;
        }
        let names = match self.processes.snapshot() {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "process snapshot failed");
                return 0;
            }
        };

        let mut prompted = 0;
        for exe in names.iter().filter(|n| self.watch_list.matches(n)) {
            // A grant earlier in this snapshot already turned protection off.
            if self.controller.state() != ProtectionState::On {
                break;
            }
            if !self.cooldown.try_mark(exe, self.clock.now()) {
                continue;
            }
            prompted += 1;
            info!(%exe, "watched process seen, asking for exception");
            if !self.prompter.ask_grant(exe) {
                info!(%exe, "exception declined");
                continue;
            }
            if self.controller.watch_grant() {
                self.schedule_revert(exe);
            } else {
                warn!(%exe, "exception accepted but cameras could not be enabled");
            }
        }
        prompted
    }

    fn schedule_revert(&self, exe: &str) {
        let token = CancelToken::new();
        let sleeper = token.clone();
        let controller = self.controller.clone();
        let dur = self.grant_duration;
        let name = exe.to_string();
        let spawned = thread::Builder::new()
            .name("grant-expiry".into())
            .spawn(move || {
                if sleeper.sleep(dur) {
                    debug!(exe = %name, "grant revert cancelled");
                    return;
                }
                if controller.watch_revert() {
                    info!(exe = %name, "grant expired, protection back on");
                } else {
                    warn!(exe = %name, "grant expired but cameras could not be disabled");
                }
            });

        match spawned {
            Ok(thread) => {
                info!(%exe, secs = dur.as_secs(), "exception granted");
                let mut grants = self.grants.lock();
                grants.retain(|g| !g.thread.is_finished());
                grants.push(PendingGrant { exe: exe.to_string(), token, thread });
            }
            Err(e) => {
                // Without a timer the grant would never end.
                error!(error = %e, "could not start grant timer, reverting now");
                self.controller.watch_revert();
            }
        }
    }

    /// Grants whose revert has not run yet.
    pub fn pending_grants(&self) -> usize {
        let mut grants = self.grants.lock();
        grants.retain(|g| !g.thread.is_finished());
        grants.len()
    }

    /// Cancels every pending revert and waits for the timers to exit.
    /// Returns how many were cancelled.
    pub fn cancel_pending_grants(&self) -> usize {
        let drained: Vec<PendingGrant> = self.grants.lock().drain(..).collect();
        let mut cancelled = 0;
        for grant in drained {
            if !grant.thread.is_finished() {
                grant.token.cancel();
                cancelled += 1;
                debug!(exe = %grant.exe, "grant revert cancelled");
            }
            let _ = grant.thread.join();
        }
        cancelled
    }

    fn run(&self, stop: &CancelToken) {
        info!(interval_ms = self.poll_interval.as_millis() as u64, "watch loop started");
        while !stop.is_cancelled() {
            self.run_iteration();
            if stop.sleep(self.poll_interval) {
                break;
            }
        }
        info!("watch loop stopped");
    }

    pub fn spawn(self: Arc<Self>) -> std::io::Result<WatchHandle> {
        let stop = CancelToken::new();
        let token = stop.clone();
        let watcher = self.clone();
        let thread = thread::Builder::new()
            .name("watch-loop".into())
            .spawn(move || watcher.run(&token))?;
        Ok(WatchHandle { stop, thread: Some(thread), watcher: self })
    }
}

/// Running watch loop. `stop` clears the running flag and joins.
pub struct WatchHandle {
    stop: CancelToken,
    thread: Option<JoinHandle<()>>,
    watcher: Arc<Watcher>,
}

impl WatchHandle {
    /// Stops the loop after its current iteration, then drops pending grant
    /// timers since the process is going away.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("watch loop panicked");
            }
            let cancelled = self.watcher.cancel_pending_grants();
            if cancelled > 0 {
                info!(cancelled, "pending grants dropped at shutdown");
            }
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
