// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Process-wide protection state.

use std::sync::atomic::{AtomicU8, Ordering::SeqCst};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionState {
    Unknown,
    /// Cameras disabled.
    On,
    /// Cameras enabled (also during a grant).
    Off,
}

impl ProtectionState {
    fn to_raw(self) -> u8 {
        match self {
            ProtectionState::Unknown => 0,
            ProtectionState::On => 1,
            ProtectionState::Off => 2,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => ProtectionState::On,
            2 => ProtectionState::Off,
            _ => ProtectionState::Unknown,
        }
    }

    pub fn status_text(self) -> &'static str {
        match self {
            ProtectionState::On => "Status: protection ON (camera disabled)",
            ProtectionState::Off => "Status: protection OFF (camera enabled)",
            ProtectionState::Unknown => "Status: unknown",
        }
    }
}

type Observer = Box<dyn Fn(ProtectionState) + Send + Sync>;

/// Atomic cell shared by the shell, the watch loop and grant timers.
///
/// Every transition is one store. Callers store only after the toggle they
/// depend on has returned.
pub struct ProtectionCell {
    raw: AtomicU8,
    observer: OnceLock<Observer>,
}

impl ProtectionCell {
    pub fn new() -> Self {
        Self {
            raw: AtomicU8::new(ProtectionState::Unknown.to_raw()),
            observer: OnceLock::new(),
        }
    }

    pub fn load(&self) -> ProtectionState {
        ProtectionState::from_raw(self.raw.load(SeqCst))
    }

    pub fn store(&self, state: ProtectionState) {
        let prev = ProtectionState::from_raw(self.raw.swap(state.to_raw(), SeqCst));
        if prev != state {
            tracing::info!(?prev, next = ?state, "protection state changed");
        }
        if let Some(notify) = self.observer.get() {
            notify(state);
        }
    }

    /// Installs the one observer called after every store. Later calls are
    /// ignored.
    pub fn observe(&self, f: impl Fn(ProtectionState) + Send + Sync + 'static) {
        if self.observer.set(Box::new(f)).is_err() {
            tracing::warn!("protection observer already installed");
        }
    }
}

impl Default for ProtectionCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_starts_unknown() {
        assert_eq!(ProtectionCell::new().load(), ProtectionState::Unknown);
    }

    #[test]
    fn test_store_and_load() {
        let cell = ProtectionCell::new();
        cell.store(ProtectionState::On);
        assert_eq!(cell.load(), ProtectionState::On);
        cell.store(ProtectionState::Off);
        assert_eq!(cell.load(), ProtectionState::Off);
    }

    #[test]
    fn test_observer_sees_every_store() {
        let cell = ProtectionCell::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        cell.observe(move |_| {
            seen.fetch_add(1, SeqCst);
        });
        cell.store(ProtectionState::On);
        cell.store(ProtectionState::On);
        assert_eq!(hits.load(SeqCst), 2);
    }

    #[test]
    fn test_status_text() {
        assert!(ProtectionState::On.status_text().contains("ON"));
        assert!(ProtectionState::Off.status_text().contains("OFF"));
        assert!(ProtectionState::Unknown.status_text().contains("unknown"));
    }
}
