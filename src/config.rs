// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Fixed parameters of the guard.

use std::path::PathBuf;
use std::time::Duration;

use crate::device::DeviceClassId;

// ── App identity ────────────────────────────────────
pub const APP_TITLE: &str = "Invisible - Camera Guard";
pub const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";
pub const RUN_VALUE: &str = "Invisible";
pub const INSTANCE_MUTEX: &str = "Invisible_SingleInstance_Mutex";
pub const LOG_ENV: &str = "INVISIBLE_LOG";
pub const LOG_FILE: &str = "invisible.log";

// ── Timing ──────────────────────────────────────────
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const PROMPT_COOLDOWN: Duration = Duration::from_secs(5 * 60);
pub const GRANT_DURATION: Duration = Duration::from_secs(5 * 60);

// ── Device classes ──────────────────────────────────
/// GUID_DEVCLASS_IMAGE
pub const IMAGE_CLASS: DeviceClassId =
    DeviceClassId::new("image", 0x6bdd1fc6_810f_11d0_bec7_08002be2cfb6);
/// GUID_DEVCLASS_CAMERA
pub const CAMERA_CLASS: DeviceClassId =
    DeviceClassId::new("camera", 0xca3e7ab9_b4c3_4ae6_8251_579ef933890f);

// ── Capture-capable executables ─────────────────────
pub const WATCHED_EXES: [&str; 11] = [
    "chrome.exe", "msedge.exe", "firefox.exe",
    "zoom.exe", "teams.exe", "skype.exe", "discord.exe",
    "obs64.exe", "obs32.exe", "vlc.exe", "camera.exe",
];

/// Runtime knobs handed to the watch loop and controller.
///
/// Everything defaults to the constants above; tests shrink the durations.
#[derive(Debug, Clone)]
pub struct Config {
    pub poll_interval: Duration,
    pub prompt_cooldown: Duration,
    pub grant_duration: Duration,
    pub classes: Vec<DeviceClassId>,
    pub watched: Vec<String>,
}

impl Config {
    /// Directory holding the log file: `%LOCALAPPDATA%\Invisible`.
    pub fn data_dir() -> PathBuf {
        std::env::var_os("LOCALAPPDATA")
            .map(|d| PathBuf::from(d).join(RUN_VALUE))
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn log_path() -> PathBuf {
        Self::data_dir().join(LOG_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            prompt_cooldown: PROMPT_COOLDOWN,
            grant_duration: GRANT_DURATION,
            classes: vec![IMAGE_CLASS, CAMERA_CLASS],
            watched: WATCHED_EXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
