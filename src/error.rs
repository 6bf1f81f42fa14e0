// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types. None of these cross the UI boundary; callers log them and
//! collapse to a boolean outcome.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("device class {class} could not be opened: {reason}")]
    ClassUnavailable { class: &'static str, reason: String },

    #[error("setting class install params failed for instance {index}: {reason}")]
    InstallParams { index: usize, reason: String },

    #[error("class installer failed for instance {index}: {reason}")]
    Installer { index: usize, reason: String },
}

#[derive(Error, Debug)]
pub enum ElevationError {
    #[error("could not resolve own executable path")]
    ExePath,

    #[error("elevated launch refused or failed: {0}")]
    Launch(String),

    #[error("elevated child produced no process handle")]
    NoProcess,

    #[error("exit code of elevated child unavailable: {0}")]
    ExitCode(String),
}

#[derive(Error, Debug)]
pub enum AutorunError {
    #[error("opening run key failed: {0}")]
    OpenKey(String),

    #[error("writing run value failed: {0}")]
    Write(String),

    #[error("deleting run value failed: {0}")]
    Delete(String),

    #[error("could not resolve own executable path")]
    ExePath,
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("process snapshot failed: {0}")]
    Snapshot(String),
}
