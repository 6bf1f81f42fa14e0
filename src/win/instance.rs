// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use windows::core::PCWSTR;
use windows::Win32::Foundation::{CloseHandle, GetLastError, ERROR_ALREADY_EXISTS, FALSE, HANDLE};
use windows::Win32::System::Threading::CreateMutexW;

use crate::config::INSTANCE_MUTEX;

/// Named mutex held for the life of the interactive instance.
pub struct SingleInstance(HANDLE);

impl SingleInstance {
    /// `None` if another interactive instance already holds the mutex.
    pub fn acquire() -> Option<Self> {
        let name = super::wide(INSTANCE_MUTEX);
        unsafe {
            let handle = CreateMutexW(None, FALSE, PCWSTR(name.as_ptr())).ok()?;
            if GetLastError() == ERROR_ALREADY_EXISTS {
                let _ = CloseHandle(handle);
                return None;
            }
            Some(Self(handle))
        }
    }
}

impl Drop for SingleInstance {
    fn drop(&mut self) {
        let _ = unsafe { CloseHandle(self.0) };
    }
}
