// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Device class enable/disable engine.
//!
//! A class succeeds only when every present instance changed. A failing
//! instance never stops its siblings, and a failing class never stops the
//! remaining classes.

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::DeviceError;

/// Stable identifier of one device setup class.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceClassId {
    pub name: &'static str,
    /// Class GUID in its canonical big-endian `u128` form.
    pub guid: u128,
}

impl DeviceClassId {
    pub const fn new(name: &'static str, guid: u128) -> Self {
        Self { name, guid }
    }
}

impl fmt::Debug for DeviceClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for DeviceClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.guid;
        write!(
            f,
            "{} {{{:08X}-{:04X}-{:04X}-{:04X}-{:012X}}}",
            self.name,
            (g >> 96) as u32,
            (g >> 80) as u16,
            (g >> 64) as u16,
            (g >> 48) as u16,
            g & 0xFFFF_FFFF_FFFF,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Enable,
    Disable,
}

impl StateChange {
    pub fn from_enable(enable: bool) -> Self {
        if enable { StateChange::Enable } else { StateChange::Disable }
    }
}

/// The present instances of one class, opened for property changes.
pub trait DeviceSet {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Submits a global-scope property change for instance `index`.
    fn apply(&mut self, index: usize, change: StateChange) -> Result<(), DeviceError>;
}

/// Access to the OS device installer.
pub trait DeviceBackend: Send + Sync {
    fn open_class(&self, class: &DeviceClassId) -> Result<Box<dyn DeviceSet + '_>, DeviceError>;
}

/// Per-class result of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub change: StateChange,
    pub classes: Vec<(DeviceClassId, bool)>,
}

impl ToggleOutcome {
    pub fn succeeded(&self) -> bool {
        self.classes.iter().all(|(_, ok)| *ok)
    }

    pub fn failed_classes(&self) -> impl Iterator<Item = &DeviceClassId> {
        self.classes.iter().filter(|(_, ok)| !ok).map(|(c, _)| c)
    }
}

pub struct ToggleEngine<B> {
    backend: B,
    classes: Vec<DeviceClassId>,
}

impl<B: DeviceBackend> ToggleEngine<B> {
    pub fn new(backend: B, classes: Vec<DeviceClassId>) -> Self {
        Self { backend, classes }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn set_class_enabled(&self, class: &DeviceClassId, enable: bool) -> bool {
        let change = StateChange::from_enable(enable);
        let mut set = match self.backend.open_class(class) {
            Ok(set) => set,
            Err(e) => {
                // No device list means nothing to change.
                debug!(%class, error = %e, "class not present, nothing to do");
                return true;
            }
        };
        if set.is_empty() {
            debug!(%class, "no present instances");
            return true;
        }

        let total = set.len();
        let mut failed = 0usize;
        for index in 0..total {
            if let Err(e) = set.apply(index, change) {
                warn!(%class, index, error = %e, "instance change failed");
                failed += 1;
            }
        }
        info!(%class, ?change, total, failed, "class processed");
        failed == 0
    }

    /// Runs every tracked class. Privileged callers only; without privilege
    /// the per-instance calls fail and this reports an overall failure.
    pub fn set_all(&self, enable: bool) -> ToggleOutcome {
        let classes = self
            .classes
            .iter()
            .map(|class| (*class, self.set_class_enabled(class, enable)))
            .collect();
        ToggleOutcome { change: StateChange::from_enable(enable), classes }
    }

    pub fn set_all_cameras_enabled(&self, enable: bool) -> bool {
        let outcome = self.set_all(enable);
        for class in outcome.failed_classes() {
            warn!(%class, change = ?outcome.change, "class failed");
        }
        outcome.succeeded()
    }
}
