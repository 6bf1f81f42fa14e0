// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! SetupAPI device backend.

use std::mem::size_of;

use windows::core::{GUID, PCWSTR};
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiCallClassInstaller, SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInfo,
    SetupDiGetClassDevsW, SetupDiSetClassInstallParamsW, DICS_DISABLE, DICS_ENABLE,
    DICS_FLAG_GLOBAL, DIF_PROPERTYCHANGE, DIGCF_PRESENT, HDEVINFO, SP_CLASSINSTALL_HEADER,
    SP_DEVINFO_DATA, SP_PROPCHANGE_PARAMS,
};
use windows::Win32::Foundation::HWND;

use crate::device::{DeviceBackend, DeviceClassId, DeviceSet, StateChange};
use crate::error::DeviceError;

pub struct SetupApiBackend;

/// Present members of one class. The info list is destroyed on drop.
struct ClassDevices {
    info: HDEVINFO,
    members: Vec<SP_DEVINFO_DATA>,
}

impl Drop for ClassDevices {
    fn drop(&mut self) {
        let _ = unsafe { SetupDiDestroyDeviceInfoList(self.info) };
    }
}

impl DeviceSet for ClassDevices {
    fn len(&self) -> usize {
        self.members.len()
    }

    fn apply(&mut self, index: usize, change: StateChange) -> Result<(), DeviceError> {
        let member: *const SP_DEVINFO_DATA = &self.members[index];
        let params = SP_PROPCHANGE_PARAMS {
            ClassInstallHeader: SP_CLASSINSTALL_HEADER {
                cbSize: size_of::<SP_CLASSINSTALL_HEADER>() as u32,
                InstallFunction: DIF_PROPERTYCHANGE,
            },
            StateChange: match change {
                StateChange::Enable => DICS_ENABLE,
                StateChange::Disable => DICS_DISABLE,
            },
            // All hardware profiles, not just the current one.
            Scope: DICS_FLAG_GLOBAL,
            HwProfile: 0,
        };

        unsafe {
            SetupDiSetClassInstallParamsW(
                self.info,
                Some(member),
                Some(&params.ClassInstallHeader as *const SP_CLASSINSTALL_HEADER),
                size_of::<SP_PROPCHANGE_PARAMS>() as u32,
            )
        }
        .map_err(|e| DeviceError::InstallParams { index, reason: e.to_string() })?;

        unsafe { SetupDiCallClassInstaller(DIF_PROPERTYCHANGE, self.info, Some(member)) }
            .map_err(|e| DeviceError::Installer { index, reason: e.to_string() })
    }
}

impl DeviceBackend for SetupApiBackend {
    fn open_class(&self, class: &DeviceClassId) -> Result<Box<dyn DeviceSet + '_>, DeviceError> {
        let guid = GUID::from_u128(class.guid);
        let info = unsafe {
            SetupDiGetClassDevsW(Some(&guid as *const GUID), PCWSTR::null(), HWND::default(), DIGCF_PRESENT)
        }
        .map_err(|e| DeviceError::ClassUnavailable { class: class.name, reason: e.to_string() })?;

        let mut members = Vec::new();
        for index in 0u32.. {
            let mut data = SP_DEVINFO_DATA {
                cbSize: size_of::<SP_DEVINFO_DATA>() as u32,
                ..Default::default()
            };
            if unsafe { SetupDiEnumDeviceInfo(info, index, &mut data) }.is_err() {
                break;
            }
            members.push(data);
        }
        tracing::debug!(%class, present = members.len(), "class opened");
        Ok(Box::new(ClassDevices { info, members }))
    }
}
