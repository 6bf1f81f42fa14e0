// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Privilege-aware toggle path.
//!
//! Elevated callers hit the engine directly. Everyone else relaunches the
//! executable as an elevated worker and blocks until it exits.

use tracing::{info, warn};

use crate::device::{DeviceBackend, ToggleEngine};
use crate::directive::{Directive, WorkerExit};
use crate::error::ElevationError;

/// Runs privileged one-shot work on behalf of an unprivileged caller.
pub trait Elevator: Send + Sync {
    fn is_elevated(&self) -> bool;

    /// Starts the elevated worker for `directive` and returns its exit code.
    /// Blocks until the worker has terminated.
    fn run_elevated(&self, directive: Directive) -> Result<u32, ElevationError>;
}

/// The one operation the state machine and the watch loop need.
pub trait CameraSwitch: Send + Sync {
    fn set_cameras_enabled(&self, enable: bool) -> bool;
}

pub struct ElevationBridge<E, B> {
    elevator: E,
    engine: ToggleEngine<B>,
}

impl<E: Elevator, B: DeviceBackend> ElevationBridge<E, B> {
    pub fn new(elevator: E, engine: ToggleEngine<B>) -> Self {
        Self { elevator, engine }
    }

    pub fn require_elevated_toggle(&self, enable: bool) -> bool {
        if self.elevator.is_elevated() {
            return self.engine.set_all_cameras_enabled(enable);
        }

        let directive = Directive::from_enable(enable);
        info!(arg = directive.as_arg(), "not elevated, relaunching worker");
        match self.elevator.run_elevated(directive) {
            Ok(code) if code == WorkerExit::Success as u32 => true,
            Ok(code) => {
                warn!(code, arg = directive.as_arg(), "elevated worker failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "elevation did not complete");
                false
            }
        }
    }
}

impl<E: Elevator, B: DeviceBackend> CameraSwitch for ElevationBridge<E, B> {
    fn set_cameras_enabled(&self, enable: bool) -> bool {
        self.require_elevated_toggle(enable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CAMERA_CLASS;
    use crate::device::fake::FakeBackend;
    use parking_lot::Mutex;

    struct StubElevator {
        elevated: bool,
        reply: fn() -> Result<u32, ElevationError>,
        calls: Mutex<Vec<Directive>>,
    }

    impl StubElevator {
        fn new(elevated: bool, reply: fn() -> Result<u32, ElevationError>) -> Self {
            Self { elevated, reply, calls: Mutex::new(Vec::new()) }
        }
    }

    impl Elevator for StubElevator {
        fn is_elevated(&self) -> bool {
            self.elevated
        }

        fn run_elevated(&self, directive: Directive) -> Result<u32, ElevationError> {
            self.calls.lock().push(directive);
            (self.reply)()
        }
    }

    fn bridge(elevator: StubElevator, backend: FakeBackend) -> ElevationBridge<StubElevator, FakeBackend> {
        ElevationBridge::new(elevator, ToggleEngine::new(backend, vec![CAMERA_CLASS]))
    }

    #[test]
    fn test_child_exit_zero_is_success() {
        let b = bridge(StubElevator::new(false, || Ok(0)), FakeBackend::default());
        assert!(b.require_elevated_toggle(false));
        assert_eq!(*b.elevator.calls.lock(), vec![Directive::Disable]);
    }

    #[test]
    fn test_child_failure_codes() {
        for reply in [
            (|| Ok(1)) as fn() -> Result<u32, ElevationError>,
            || Ok(2),
            || Ok(3),
        ] {
            let b = bridge(StubElevator::new(false, reply), FakeBackend::default());
            assert!(!b.require_elevated_toggle(true));
        }
    }

    #[test]
    fn test_declined_elevation_is_failure() {
        let b = bridge(
            StubElevator::new(false, || Err(ElevationError::Launch("cancelled by user".into()))),
            FakeBackend::default(),
        );
        assert!(!b.set_cameras_enabled(true));
    }

    #[test]
    fn test_elevated_caller_uses_engine_directly() {
        let mut backend = FakeBackend::default();
        backend.tree.insert(CAMERA_CLASS.guid, vec![true, false]);
        let b = bridge(StubElevator::new(true, || Ok(0)), backend);

        assert!(!b.require_elevated_toggle(false));
        assert!(b.elevator.calls.lock().is_empty());
        assert_eq!(b.engine.backend().applied.lock().len(), 2);
    }
}
