// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::mem::size_of;

use windows::Win32::Foundation::CloseHandle;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W, TH32CS_SNAPPROCESS,
};

use crate::error::ProcessError;
use crate::watch::ProcessSource;

/// Toolhelp32 process snapshot, executable names only.
pub struct ToolhelpProcesses;

impl ProcessSource for ToolhelpProcesses {
    fn snapshot(&self) -> Result<Vec<String>, ProcessError> {
        unsafe {
            let snap = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
                .map_err(|e| ProcessError::Snapshot(e.to_string()))?;
            let mut entry = PROCESSENTRY32W {
                dwSize: size_of::<PROCESSENTRY32W>() as u32,
                ..Default::default()
            };
            let mut names = Vec::new();
            let mut more = Process32FirstW(snap, &mut entry).is_ok();
            while more {
                names.push(super::from_wide(&entry.szExeFile));
                more = Process32NextW(snap, &mut entry).is_ok();
            }
            let _ = CloseHandle(snap);
            Ok(names)
        }
    }
}
