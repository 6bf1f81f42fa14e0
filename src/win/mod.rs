// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Win32 implementations of the capability traits, plus the window shell.

mod autorun;
mod devices;
mod elevate;
mod instance;
mod processes;
mod prompt;
pub mod shell;

pub use autorun::RunKeyAutorun;
pub use devices::SetupApiBackend;
pub use elevate::ShellElevator;
pub use instance::SingleInstance;
pub use processes::ToolhelpProcesses;
pub use prompt::MessageBoxPrompter;

use std::path::PathBuf;

use windows::Win32::Foundation::HMODULE;
use windows::Win32::System::LibraryLoader::GetModuleFileNameW;

/// Absolute path of the running executable.
pub(crate) fn exe_path() -> Option<PathBuf> {
    let mut buf = [0u16; 1024];
    let len = unsafe { GetModuleFileNameW(HMODULE::default(), &mut buf) } as usize;
    if len == 0 || len >= buf.len() {
        return None;
    }
    Some(PathBuf::from(String::from_utf16_lossy(&buf[..len])))
}

/// NUL-terminated UTF-16 copy of `s`.
pub(crate) fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Reads a fixed-size UTF-16 buffer up to its first NUL.
pub(crate) fn from_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

/// Copies `s` into a fixed UTF-16 field, truncating and terminating it.
pub(crate) fn copy_wide(dst: &mut [u16], s: &str) {
    let src = wide(s);
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    if let Some(last) = dst.last_mut() {
        if n == dst.len() {
            *last = 0;
        }
    }
}
