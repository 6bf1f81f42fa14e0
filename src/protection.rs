// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Protection state machine: Unknown / On / Off.
//!
//! Every transition runs its toggle first and stores the new state only once
//! the toggle has returned. Failed toggles leave the state untouched, except
//! for `uninstall`, which always ends in Off.

use std::sync::Arc;

use tracing::{info, warn};

use crate::autorun::AutorunStore;
use crate::elevation::CameraSwitch;
use crate::error::AutorunError;
use crate::state::{ProtectionCell, ProtectionState};

pub struct Controller {
    state: Arc<ProtectionCell>,
    switch: Arc<dyn CameraSwitch>,
    autorun: Arc<dyn AutorunStore>,
}

impl Controller {
    pub fn new(
        state: Arc<ProtectionCell>,
        switch: Arc<dyn CameraSwitch>,
        autorun: Arc<dyn AutorunStore>,
    ) -> Self {
        Self { state, switch, autorun }
    }

    pub fn state(&self) -> ProtectionState {
        self.state.load()
    }

    pub fn cell(&self) -> &Arc<ProtectionCell> {
        &self.state
    }

    /// Default-on at launch: disable the cameras, On on success, Unknown
    /// otherwise.
    pub fn startup_probe(&self) -> ProtectionState {
        match self.autorun.is_registered() {
            Ok(registered) => info!(registered, "autorun entry"),
            Err(e) => warn!(error = %e, "autorun entry unreadable"),
        }
        let next = if self.switch.set_cameras_enabled(false) {
            ProtectionState::On
        } else {
            warn!("startup probe could not disable cameras");
            ProtectionState::Unknown
        };
        self.state.store(next);
        next
    }

    pub fn user_request_on(&self) -> bool {
        self.transition(false, ProtectionState::On, "user on")
    }

    pub fn user_request_off(&self) -> bool {
        self.transition(true, ProtectionState::Off, "user off")
    }

    pub fn install(&self) -> Result<(), AutorunError> {
        self.autorun.register()?;
        info!("autorun registered");
        Ok(())
    }

    /// Removes the autorun entry and hands the cameras back. The state ends in
    /// Off no matter what the re-enable reported. The returned error only
    /// concerns the autorun entry.
    pub fn uninstall(&self) -> Result<(), AutorunError> {
        let removed = self.autorun.unregister();
        if !self.switch.set_cameras_enabled(true) {
            warn!("uninstall: re-enable failed, forcing Off");
        }
        self.state.store(ProtectionState::Off);
        match &removed {
            Ok(()) => info!("autorun removed"),
            Err(e) => warn!(error = %e, "autorun removal failed"),
        }
        removed
    }

    /// On -> Off for a temporary exception.
    pub fn watch_grant(&self) -> bool {
        self.transition(true, ProtectionState::Off, "grant")
    }

    /// Off -> On when a grant expires. Does not check whether the user
    /// changed the state in between.
    pub fn watch_revert(&self) -> bool {
        self.transition(false, ProtectionState::On, "grant expired")
    }

    fn transition(&self, enable: bool, next: ProtectionState, why: &str) -> bool {
        if self.switch.set_cameras_enabled(enable) {
            self.state.store(next);
            true
        } else {
            warn!(why, enable, prev = ?self.state.load(), "toggle failed, state unchanged");
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering::SeqCst};

    /// Counts toggle calls; succeeds while `ok` is set.
    pub struct FakeSwitch {
        pub ok: AtomicBool,
        pub enables: AtomicUsize,
        pub disables: AtomicUsize,
    }

    impl FakeSwitch {
        pub fn new(ok: bool) -> Arc<Self> {
            Arc::new(Self {
                ok: AtomicBool::new(ok),
                enables: AtomicUsize::new(0),
                disables: AtomicUsize::new(0),
            })
        }

        pub fn enables(&self) -> usize {
            self.enables.load(SeqCst)
        }

        pub fn disables(&self) -> usize {
            self.disables.load(SeqCst)
        }
    }

    impl CameraSwitch for FakeSwitch {
        fn set_cameras_enabled(&self, enable: bool) -> bool {
            if enable {
                self.enables.fetch_add(1, SeqCst);
            } else {
                self.disables.fetch_add(1, SeqCst);
            }
            self.ok.load(SeqCst)
        }
    }
}
