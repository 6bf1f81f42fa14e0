// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! HKCU Run key registration.

use windows::core::PCWSTR;
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_SUCCESS};
use windows::Win32::System::Registry::{
    RegCloseKey, RegCreateKeyExW, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW,
    HKEY, HKEY_CURRENT_USER, KEY_QUERY_VALUE, KEY_SET_VALUE, REG_OPTION_NON_VOLATILE, REG_SZ,
};

use crate::autorun::AutorunStore;
use crate::config::{RUN_KEY, RUN_VALUE};
use crate::error::AutorunError;

pub struct RunKeyAutorun;

/// Open Run key, closed on drop.
struct RunKey(HKEY);

impl Drop for RunKey {
    fn drop(&mut self) {
        let _ = unsafe { RegCloseKey(self.0) };
    }
}

impl RunKey {
    /// Opens the key for writing, creating it if missing.
    fn writable() -> Result<Self, AutorunError> {
        let subkey = super::wide(RUN_KEY);
        let mut key = HKEY::default();
        unsafe {
            RegCreateKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR(subkey.as_ptr()),
                0,
                PCWSTR::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_SET_VALUE,
                None,
                &mut key,
                None,
            )
        }
        .ok()
        .map_err(|e| AutorunError::OpenKey(e.to_string()))?;
        Ok(Self(key))
    }

    /// `None` when the key itself does not exist.
    fn readable() -> Result<Option<Self>, AutorunError> {
        let subkey = super::wide(RUN_KEY);
        let mut key = HKEY::default();
        let status = unsafe {
            RegOpenKeyExW(HKEY_CURRENT_USER, PCWSTR(subkey.as_ptr()), 0, KEY_QUERY_VALUE, &mut key)
        };
        match status {
            ERROR_SUCCESS => Ok(Some(Self(key))),
            ERROR_FILE_NOT_FOUND => Ok(None),
            other => Err(AutorunError::OpenKey(format!("{other:?}"))),
        }
    }
}

impl AutorunStore for RunKeyAutorun {
    fn register(&self) -> Result<(), AutorunError> {
        let exe = super::exe_path().ok_or(AutorunError::ExePath)?;
        let key = RunKey::writable()?;
        let name = super::wide(RUN_VALUE);
        let data: Vec<u8> = super::wide(&exe.to_string_lossy())
            .iter()
            .flat_map(|c| c.to_le_bytes())
            .collect();
        unsafe { RegSetValueExW(key.0, PCWSTR(name.as_ptr()), 0, REG_SZ, Some(&data)) }
            .ok()
            .map_err(|e| AutorunError::Write(e.to_string()))?;
        tracing::debug!(path = %exe.display(), "run value written");
        Ok(())
    }

    fn unregister(&self) -> Result<(), AutorunError> {
        let key = RunKey::writable()?;
        let name = super::wide(RUN_VALUE);
        match unsafe { RegDeleteValueW(key.0, PCWSTR(name.as_ptr())) } {
            ERROR_SUCCESS | ERROR_FILE_NOT_FOUND => Ok(()),
            other => Err(AutorunError::Delete(format!("{other:?}"))),
        }
    }

    fn is_registered(&self) -> Result<bool, AutorunError> {
        let Some(key) = RunKey::readable()? else {
            return Ok(false);
        };
        let name = super::wide(RUN_VALUE);
        let status = unsafe { RegQueryValueExW(key.0, PCWSTR(name.as_ptr()), None, None, None, None) };
        Ok(status == ERROR_SUCCESS)
    }
}
