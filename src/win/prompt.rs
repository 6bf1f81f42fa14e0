// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::time::Duration;

use windows::core::PCWSTR;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::{
    MessageBoxW, IDYES, MB_ICONQUESTION, MB_SYSTEMMODAL, MB_YESNO,
};

use crate::config::APP_TITLE;
use crate::watch::Prompter;

/// System-modal yes/no box, shown from the watch thread without an owner.
pub struct MessageBoxPrompter {
    grant: Duration,
}

impl MessageBoxPrompter {
    pub fn new(grant: Duration) -> Self {
        Self { grant }
    }
}

impl Prompter for MessageBoxPrompter {
    fn ask_grant(&self, exe: &str) -> bool {
        let minutes = (self.grant.as_secs() / 60).max(1);
        let text = super::wide(&format!(
            "\"{exe}\" is about to use the camera.\nAllow it temporarily? ({minutes} min)"
        ));
        let title = super::wide(APP_TITLE);
        let answer = unsafe {
            MessageBoxW(
                HWND::default(),
                PCWSTR(text.as_ptr()),
                PCWSTR(title.as_ptr()),
                MB_YESNO | MB_ICONQUESTION | MB_SYSTEMMODAL,
            )
        };
        answer == IDYES
    }
}
