// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Main window, tray icon and button handlers.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;
use std::sync::Arc;

use windows::core::{w, Result, PCWSTR};
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Gdi::{UpdateWindow, COLOR_WINDOW, HBRUSH};
use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NIM_MODIFY,
    NOTIFYICONDATAW,
};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::config::APP_TITLE;
use crate::protection::Controller;
use crate::watch::{WatchHandle, Watcher};

// ── Control IDs ─────────────────────────────────────
const IDC_BTN_ON: u16 = 1001;
const IDC_BTN_OFF: u16 = 1002;
const IDC_BTN_INSTALL: u16 = 1003;
const IDC_BTN_UNINSTALL: u16 = 1004;
const IDC_LBL_STATUS: u16 = 1101;
const IDM_SHOW: u16 = 2001;
const IDM_ON: u16 = 2002;
const IDM_OFF: u16 = 2003;
const IDM_EXIT: u16 = 2004;
const WM_TRAYICON: u32 = WM_APP + 1;
const WM_STATE_CHANGED: u32 = WM_APP + 2;  // posted from watch/grant threads
const TRAY_ID: u32 = 1;

// ── Layout ──────────────────────────────────────────
const MARGIN: i32 = 30;
const INIT_W: i32 = 700;
const INIT_H: i32 = 480;
/// (id, top, height) of each child, top to bottom.
const ROWS: [(u16, i32, i32); 5] = [
    (IDC_LBL_STATUS, 20, 30),
    (IDC_BTN_ON, 70, 80),
    (IDC_BTN_OFF, 170, 80),
    (IDC_BTN_INSTALL, 270, 70),
    (IDC_BTN_UNINSTALL, 350, 70),
];

struct Shell {
    controller: Arc<Controller>,
    watcher: Arc<Watcher>,
    watch: RefCell<Option<WatchHandle>>,
}

thread_local! {
    // Owned by the UI thread; wndproc has no other way in.
    static SHELL: RefCell<Option<Rc<Shell>>> = const { RefCell::new(None) };
}

/// Clones the context out so message boxes can re-enter wndproc.
fn shell() -> Option<Rc<Shell>> {
    SHELL.with(|s| s.borrow().clone())
}

// ── Dialogs ─────────────────────────────────────────

unsafe fn message(hwnd: HWND, text: &str, style: MESSAGEBOX_STYLE) {
    let text = super::wide(text);
    let title = super::wide(APP_TITLE);
    MessageBoxW(hwnd, PCWSTR(text.as_ptr()), PCWSTR(title.as_ptr()), style);
}

// ── Tray icon ───────────────────────────────────────

fn tray_data(hwnd: HWND) -> NOTIFYICONDATAW {
    let mut nid: NOTIFYICONDATAW = unsafe { mem::zeroed() };
    nid.cbSize = mem::size_of::<NOTIFYICONDATAW>() as u32;
    nid.hWnd = hwnd;
    nid.uID = TRAY_ID;
    nid
}

unsafe fn add_tray_icon(hwnd: HWND) {
    let mut nid = tray_data(hwnd);
    nid.uFlags = NIF_MESSAGE | NIF_ICON | NIF_TIP;
    nid.uCallbackMessage = WM_TRAYICON;
    nid.hIcon = LoadIconW(HINSTANCE::default(), IDI_SHIELD).unwrap_or_default();
    super::copy_wide(&mut nid.szTip, APP_TITLE);
    if !Shell_NotifyIconW(NIM_ADD, &nid).as_bool() {
        tracing::warn!("tray icon could not be added");
    }
}

unsafe fn set_tray_tip(hwnd: HWND, tip: &str) {
    let mut nid = tray_data(hwnd);
    nid.uFlags = NIF_TIP;
    super::copy_wide(&mut nid.szTip, tip);
    let _ = Shell_NotifyIconW(NIM_MODIFY, &nid);
}

unsafe fn remove_tray_icon(hwnd: HWND) {
    let nid = tray_data(hwnd);
    let _ = Shell_NotifyIconW(NIM_DELETE, &nid);
}

unsafe fn show_tray_menu(hwnd: HWND) -> u16 {
    let Ok(menu) = CreatePopupMenu() else { return 0 };
    let items: [(MENU_ITEM_FLAGS, u16, &str); 5] = [
        (MF_STRING, IDM_SHOW, "Show"),
        (MF_STRING, IDM_ON, "Protection ON"),
        (MF_STRING, IDM_OFF, "Protection OFF"),
        (MF_SEPARATOR, 0, ""),
        (MF_STRING, IDM_EXIT, "Exit"),
    ];
    for (flags, id, label) in items {
        let label = super::wide(label);
        let _ = AppendMenuW(menu, flags, id as usize, PCWSTR(label.as_ptr()));
    }

    // Menu only dismisses on outside click if we own the foreground.
    let _ = SetForegroundWindow(hwnd);
    let mut pt = POINT::default();
    let _ = GetCursorPos(&mut pt);
    let cmd = TrackPopupMenu(menu, TPM_RETURNCMD | TPM_RIGHTBUTTON, pt.x, pt.y, 0, hwnd, None);
    let _ = DestroyMenu(menu);
    cmd.0 as u16
}

// ── Status ──────────────────────────────────────────

unsafe fn refresh_status(hwnd: HWND, shell: &Shell) {
    let text = shell.controller.state().status_text();
    if let Ok(label) = GetDlgItem(hwnd, IDC_LBL_STATUS as i32) {
        let wide = super::wide(text);
        let _ = SetWindowTextW(label, PCWSTR(wide.as_ptr()));
    }
    set_tray_tip(hwnd, text);
}

unsafe fn show_window(hwnd: HWND) {
    let _ = ShowWindow(hwnd, SW_SHOWNORMAL);
    let _ = SetForegroundWindow(hwnd);
}

// ── Commands ────────────────────────────────────────

unsafe fn on_command(hwnd: HWND, shell: &Shell, id: u16) {
    let c = &shell.controller;
    match id {
        IDC_BTN_ON | IDM_ON => {
            if !c.user_request_on() {
                message(hwnd, "Failed to turn protection ON.", MB_ICONERROR);
            }
        }
        IDC_BTN_OFF | IDM_OFF => {
            if !c.user_request_off() {
                message(hwnd, "Failed to turn protection OFF.", MB_ICONERROR);
            }
        }
        IDC_BTN_INSTALL => match c.install() {
            Ok(()) => message(
                hwnd,
                "Installed. Invisible will start automatically at next logon.",
                MB_OK | MB_ICONINFORMATION,
            ),
            Err(e) => {
                tracing::error!(error = %e, "install failed");
                message(hwnd, "Install failed.", MB_ICONERROR);
            }
        },
        IDC_BTN_UNINSTALL => match c.uninstall() {
            Ok(()) => message(
                hwnd,
                "Uninstalled. The camera has been re-enabled.",
                MB_OK | MB_ICONINFORMATION,
            ),
            Err(_) => message(hwnd, "Uninstall failed.", MB_OK | MB_ICONWARNING),
        },
        IDM_SHOW => show_window(hwnd),
        IDM_EXIT => {
            tracing::info!("tray: exit requested");
            let _ = DestroyWindow(hwnd);
            return;
        }
        _ => return,
    }
    refresh_status(hwnd, shell);
}

// ── Layout ──────────────────────────────────────────

unsafe fn create_controls(hwnd: HWND, hinst: HINSTANCE) {
    let labels = [
        "Status: initializing",
        "Protection ON (disable camera)",
        "Protection OFF (enable camera)",
        "Install (start at logon)",
        "Uninstall (remove)",
    ];
    for ((id, top, height), text) in ROWS.into_iter().zip(labels) {
        let (class, style) = if id == IDC_LBL_STATUS {
            (w!("STATIC"), WINDOW_STYLE(SS_CENTER.0))
        } else {
            (w!("BUTTON"), WINDOW_STYLE(BS_PUSHBUTTON as u32))
        };
        let text = super::wide(text);
        let created = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            class,
            PCWSTR(text.as_ptr()),
            WS_VISIBLE | WS_CHILD | style,
            MARGIN, top, INIT_W - 2 * MARGIN, height,
            hwnd,
            HMENU(id as usize as *mut _),
            hinst,
            None,
        );
        if let Err(e) = created {
            tracing::error!(id, error = %e, "control creation failed");
        }
    }
}

unsafe fn layout(hwnd: HWND) {
    let mut rc = RECT::default();
    let _ = GetClientRect(hwnd, &mut rc);
    let width = (rc.right - rc.left - 2 * MARGIN).max(0);
    for (id, top, height) in ROWS {
        if let Ok(child) = GetDlgItem(hwnd, id as i32) {
            let _ = MoveWindow(child, MARGIN, top, width, height, TRUE);
        }
    }
}

// ── Window Procedure ────────────────────────────────
unsafe extern "system" fn wndproc(hwnd: HWND, msg: u32, wp: WPARAM, lp: LPARAM) -> LRESULT {
    let Some(shell) = shell() else {
        return DefWindowProcW(hwnd, msg, wp, lp);
    };
    match msg {
        WM_COMMAND => {
            on_command(hwnd, &shell, (wp.0 & 0xFFFF) as u16);
            LRESULT(0)
        }

        WM_SIZE => {
            layout(hwnd);
            LRESULT(0)
        }

        x if x == WM_STATE_CHANGED => {
            refresh_status(hwnd, &shell);
            LRESULT(0)
        }

        x if x == WM_TRAYICON => {
            match (lp.0 & 0xFFFF) as u32 {
                WM_LBUTTONUP => show_window(hwnd),
                WM_RBUTTONUP | WM_CONTEXTMENU => {
                    let cmd = show_tray_menu(hwnd);
                    if cmd != 0 {
                        on_command(hwnd, &shell, cmd);
                    }
                }
                _ => {}
            }
            LRESULT(0)
        }

        // Closing hides to tray; exit lives in the tray menu.
        WM_CLOSE => {
            let _ = ShowWindow(hwnd, SW_HIDE);
            LRESULT(0)
        }

        WM_DESTROY => {
            if let Some(watch) = shell.watch.borrow_mut().take() {
                watch.stop();
            }
            remove_tray_icon(hwnd);
            PostQuitMessage(0);
            LRESULT(0)
        }

        _ => DefWindowProcW(hwnd, msg, wp, lp),
    }
}

/// Builds the window, runs the startup probe, starts the watch loop and pumps
/// messages until exit.
pub fn run(controller: Arc<Controller>, watcher: Arc<Watcher>) -> Result<()> {
    unsafe {
        let _ = CoInitializeEx(None, COINIT_APARTMENTTHREADED);

        let shell = Rc::new(Shell {
            controller: controller.clone(),
            watcher,
            watch: RefCell::new(None),
        });
        SHELL.with(|s| *s.borrow_mut() = Some(shell.clone()));

        let inst = GetModuleHandleW(None)?;
        let hinst: HINSTANCE = inst.into();
        let cls = w!("InvisibleMainWnd");
        let icon = LoadIconW(HINSTANCE::default(), IDI_SHIELD).unwrap_or_default();
        let wc = WNDCLASSEXW {
            cbSize: mem::size_of::<WNDCLASSEXW>() as u32,
            lpfnWndProc: Some(wndproc),
            hInstance: hinst,
            hCursor: LoadCursorW(None, IDC_ARROW)?,
            hbrBackground: HBRUSH((COLOR_WINDOW.0 + 1) as usize as *mut _),
            lpszClassName: cls,
            hIcon: icon,
            hIconSm: icon,
            ..Default::default()
        };
        if RegisterClassExW(&wc) == 0 {
            return Err(windows::core::Error::from_win32());
        }

        let title = super::wide(APP_TITLE);
        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            cls,
            PCWSTR(title.as_ptr()),
            WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU | WS_MINIMIZEBOX | WS_SIZEBOX,
            CW_USEDEFAULT, CW_USEDEFAULT, INIT_W, INIT_H,
            HWND::default(), HMENU::default(), hinst, None,
        )?;
        tracing::info!("window created: 0x{:X}", hwnd.0 as usize);

        create_controls(hwnd, hinst);
        layout(hwnd);
        add_tray_icon(hwnd);

        // Background threads only post; the UI thread re-renders.
        let raw = hwnd.0 as isize;
        controller.cell().observe(move |_| {
            let _ = PostMessageW(HWND(raw as *mut _), WM_STATE_CHANGED, WPARAM(0), LPARAM(0));
        });

        controller.startup_probe();
        refresh_status(hwnd, &shell);

        match shell.watcher.clone().spawn() {
            Ok(handle) => *shell.watch.borrow_mut() = Some(handle),
            Err(e) => tracing::error!(error = %e, "watch loop could not start"),
        }

        let _ = ShowWindow(hwnd, SW_SHOWNORMAL);
        let _ = UpdateWindow(hwnd);

        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).into() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        SHELL.with(|s| s.borrow_mut().take());
        tracing::info!("=== Invisible EXIT ===");
        CoUninitialize();
        Ok(())
    }
}
