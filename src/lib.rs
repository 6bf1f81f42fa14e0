// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Invisible keeps the imaging/camera device classes disabled, relaunches
//! itself elevated when it lacks the rights to do so, and watches for
//! capture-capable apps to offer five-minute exceptions.

pub mod autorun;
pub mod cancel;
pub mod config;
pub mod device;
pub mod directive;
pub mod elevation;
pub mod error;
pub mod protection;
pub mod state;
pub mod watch;

#[cfg(windows)]
pub mod win;

pub use config::Config;
pub use device::{DeviceBackend, DeviceClassId, DeviceSet, StateChange, ToggleEngine, ToggleOutcome};
pub use directive::{parse_invocation, run_worker, Directive, Invocation, WorkerExit};
pub use elevation::{CameraSwitch, ElevationBridge, Elevator};
pub use protection::Controller;
pub use state::{ProtectionCell, ProtectionState};
pub use watch::{Clock, CooldownTable, ProcessSource, Prompter, SystemClock, WatchHandle, WatchList, Watcher};

/// Installs the global subscriber.
///
/// The GUI subsystem has no console, so output goes to an append-only log
/// file under the data dir; stderr is the fallback. `INVISIBLE_LOG` sets the
/// filter (default `info`).
pub fn init_logging(mode: &str) {
    use std::fs::{self, OpenOptions};
    use std::sync::Mutex;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env(config::LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let path = Config::log_path();
    let file = path
        .parent()
        .map(fs::create_dir_all)
        .transpose()
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));

    let installed = match file {
        Ok(file) => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        Err(_) => fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).try_init(),
    };
    if installed.is_ok() {
        tracing::info!(mode, pid = std::process::id(), "=== Invisible START ===");
    }
}
