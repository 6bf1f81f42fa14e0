// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! UAC: token elevation check and `runas` relaunch.

use std::mem::size_of;

use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0};
use windows::Win32::Security::{GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY};
use windows::Win32::System::Threading::{
    GetCurrentProcess, GetExitCodeProcess, OpenProcessToken, WaitForSingleObject, INFINITE,
};
use windows::Win32::UI::Shell::{ShellExecuteExW, SEE_MASK_NOCLOSEPROCESS, SHELLEXECUTEINFOW};
use windows::Win32::UI::WindowsAndMessaging::SW_HIDE;
use windows_core::HSTRING;

use crate::directive::Directive;
use crate::elevation::Elevator;
use crate::error::ElevationError;

pub struct ShellElevator;

impl Elevator for ShellElevator {
    fn is_elevated(&self) -> bool {
        unsafe {
            let mut token = HANDLE::default();
            if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token).is_err() {
                return false;
            }
            let mut elevation = TOKEN_ELEVATION::default();
            let mut len = 0u32;
            let ok = GetTokenInformation(
                token,
                TokenElevation,
                Some(&mut elevation as *mut _ as *mut _),
                size_of::<TOKEN_ELEVATION>() as u32,
                &mut len,
            )
            .is_ok();
            let _ = CloseHandle(token);
            ok && elevation.TokenIsElevated != 0
        }
    }

    fn run_elevated(&self, directive: Directive) -> Result<u32, ElevationError> {
        let exe = super::exe_path().ok_or(ElevationError::ExePath)?;
        let file = HSTRING::from(exe.as_path());
        let args = HSTRING::from(directive.as_arg());

        let mut sei = SHELLEXECUTEINFOW {
            cbSize: size_of::<SHELLEXECUTEINFOW>() as u32,
            fMask: SEE_MASK_NOCLOSEPROCESS,
            lpVerb: w!("runas"),
            lpFile: PCWSTR(file.as_ptr()),
            lpParameters: PCWSTR(args.as_ptr()),
            nShow: SW_HIDE.0,
            ..Default::default()
        };

        // Fails when the consent prompt is declined.
        unsafe { ShellExecuteExW(&mut sei) }.map_err(|e| ElevationError::Launch(e.to_string()))?;
        let child = sei.hProcess;
        if child.is_invalid() {
            return Err(ElevationError::NoProcess);
        }
        tracing::debug!(arg = directive.as_arg(), "elevated worker started, waiting");

        unsafe {
            let waited = WaitForSingleObject(child, INFINITE);
            let mut code = 1u32;
            let read = GetExitCodeProcess(child, &mut code);
            let _ = CloseHandle(child);
            if waited != WAIT_OBJECT_0 {
                return Err(ElevationError::ExitCode(format!("wait returned {:#x}", waited.0)));
            }
            read.map_err(|e| ElevationError::ExitCode(e.to_string()))?;
            Ok(code)
        }
    }
}
