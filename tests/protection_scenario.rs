// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! End-to-end runs of the guard against in-memory devices and a scripted user.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use invisible::error::{AutorunError, DeviceError, ElevationError, ProcessError};
use invisible::{
    autorun::AutorunStore, CameraSwitch, Clock, Config, Controller, DeviceBackend, DeviceClassId,
    DeviceSet, Directive, ElevationBridge, Elevator, ProcessSource, Prompter, ProtectionCell,
    ProtectionState, StateChange, ToggleEngine, Watcher, WorkerExit,
};

// ── Fakes ───────────────────────────────────────────

/// Device tree keyed by class GUID; each entry is one instance's enabled flag.
struct MemoryDevices {
    tree: Mutex<HashMap<u128, Vec<bool>>>,
}

impl MemoryDevices {
    fn with(classes: &[(DeviceClassId, usize)]) -> Arc<Self> {
        let tree = classes.iter().map(|(c, n)| (c.guid, vec![true; *n])).collect();
        Arc::new(Self { tree: Mutex::new(tree) })
    }

    fn all_enabled(&self) -> bool {
        self.tree.lock().values().flatten().all(|on| *on)
    }

    fn all_disabled(&self) -> bool {
        self.tree.lock().values().flatten().all(|on| !*on)
    }
}

struct MemorySet<'a> {
    devices: &'a MemoryDevices,
    guid: u128,
    len: usize,
}

impl DeviceSet for MemorySet<'_> {
    fn len(&self) -> usize {
        self.len
    }

    fn apply(&mut self, index: usize, change: StateChange) -> Result<(), DeviceError> {
        let mut tree = self.devices.tree.lock();
        let slot = tree
            .get_mut(&self.guid)
            .and_then(|v| v.get_mut(index))
            .ok_or(DeviceError::Installer { index, reason: "gone".into() })?;
        *slot = change == StateChange::Enable;
        Ok(())
    }
}

/// Borrowed view so the test keeps a handle on the tree after moving the
/// backend into the engine.
struct SharedDevices(Arc<MemoryDevices>);

impl DeviceBackend for SharedDevices {
    fn open_class(&self, class: &DeviceClassId) -> Result<Box<dyn DeviceSet + '_>, DeviceError> {
        let len = self.0.tree.lock().get(&class.guid).map_or(0, Vec::len);
        Ok(Box::new(MemorySet { devices: self.0.as_ref(), guid: class.guid, len }))
    }
}

/// Stands in for UAC: runs the directive against the same engine the worker
/// would build, then reports the worker's exit code.
struct InProcessElevator {
    engine: ToggleEngine<SharedDevices>,
}

impl Elevator for InProcessElevator {
    fn is_elevated(&self) -> bool {
        false
    }

    fn run_elevated(&self, directive: Directive) -> Result<u32, ElevationError> {
        let exit = invisible::run_worker(Ok(directive), &self.engine);
        Ok(exit.code() as u32)
    }
}

#[derive(Default)]
struct MemoryAutorun(Mutex<bool>);

impl AutorunStore for MemoryAutorun {
    fn register(&self) -> Result<(), AutorunError> {
        *self.0.lock() = true;
        Ok(())
    }

    fn unregister(&self) -> Result<(), AutorunError> {
        *self.0.lock() = false;
        Ok(())
    }

    fn is_registered(&self) -> Result<bool, AutorunError> {
        Ok(*self.0.lock())
    }
}

struct Processes(Arc<Mutex<Vec<String>>>);

impl ProcessSource for Processes {
    fn snapshot(&self) -> Result<Vec<String>, ProcessError> {
        Ok(self.0.lock().clone())
    }
}

/// Scripted answers; asking with an empty script is a test failure.
struct User(Arc<Mutex<VecDeque<bool>>>, Arc<Mutex<Vec<String>>>);

impl Prompter for User {
    fn ask_grant(&self, exe: &str) -> bool {
        self.1.lock().push(exe.to_string());
        self.0.lock().pop_front().expect("unexpected prompt")
    }
}

struct ManualClock(Arc<Mutex<Instant>>);

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock()
    }
}

// ── Harness ─────────────────────────────────────────

struct Guard {
    devices: Arc<MemoryDevices>,
    controller: Arc<Controller>,
    watcher: Arc<Watcher>,
    running: Arc<Mutex<Vec<String>>>,
    answers: Arc<Mutex<VecDeque<bool>>>,
    asked: Arc<Mutex<Vec<String>>>,
    now: Arc<Mutex<Instant>>,
}

impl Guard {
    fn new(grant: Duration) -> Self {
        let config = Config { grant_duration: grant, ..Config::default() };
        let devices = MemoryDevices::with(&[
            (invisible::config::IMAGE_CLASS, 1),
            (invisible::config::CAMERA_CLASS, 2),
        ]);
        let elevator = InProcessElevator {
            engine: ToggleEngine::new(SharedDevices(devices.clone()), config.classes.clone()),
        };
        let bridge = ElevationBridge::new(
            elevator,
            ToggleEngine::new(SharedDevices(devices.clone()), config.classes.clone()),
        );
        let switch: Arc<dyn CameraSwitch> = Arc::new(bridge);
        let controller = Arc::new(Controller::new(
            Arc::new(ProtectionCell::new()),
            switch,
            Arc::new(MemoryAutorun::default()),
        ));

        let running = Arc::new(Mutex::new(Vec::new()));
        let answers = Arc::new(Mutex::new(VecDeque::new()));
        let asked = Arc::new(Mutex::new(Vec::new()));
        let now = Arc::new(Mutex::new(Instant::now()));
        let watcher = Arc::new(Watcher::new(
            &config,
            controller.clone(),
            Box::new(Processes(running.clone())),
            Box::new(User(answers.clone(), asked.clone())),
            Box::new(ManualClock(now.clone())),
        ));
        Self { devices, controller, watcher, running, answers, asked, now }
    }

    fn launch(&self, exe: &str) {
        self.running.lock().push(exe.to_string());
    }

    fn answer(&self, yes: bool) {
        self.answers.lock().push_back(yes);
    }

    fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    fn prompts(&self) -> usize {
        self.asked.lock().len()
    }
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

// ── Scenarios ───────────────────────────────────────

#[test]
fn test_startup_turns_protection_on() {
    let guard = Guard::new(Duration::from_secs(300));
    assert_eq!(guard.controller.state(), ProtectionState::Unknown);

    assert_eq!(guard.controller.startup_probe(), ProtectionState::On);
    assert_eq!(
        guard.controller.state().status_text(),
        "Status: protection ON (camera disabled)"
    );
    assert!(guard.devices.all_disabled());
}

#[test]
fn test_declined_app_is_not_asked_again_within_cooldown() {
    let guard = Guard::new(Duration::from_secs(300));
    guard.controller.startup_probe();
    guard.launch("Zoom.exe");

    guard.answer(false);
    assert_eq!(guard.watcher.run_iteration(), 1);
    assert_eq!(guard.controller.state(), ProtectionState::On);

    // Polls keep finding it for the next five minutes.
    for _ in 0..10 {
        guard.advance(Duration::from_secs(3));
        assert_eq!(guard.watcher.run_iteration(), 0);
    }
    guard.advance(Duration::from_secs(300));
    guard.answer(false);
    assert_eq!(guard.watcher.run_iteration(), 1);
    assert_eq!(guard.prompts(), 2);
    assert!(guard.devices.all_disabled());
}

#[test]
fn test_granted_app_gets_camera_until_expiry() {
    let guard = Guard::new(Duration::from_millis(80));
    guard.controller.startup_probe();
    guard.launch("chrome.exe");
    guard.launch("notepad.exe");

    guard.answer(true);
    assert_eq!(guard.watcher.run_iteration(), 1);
    assert_eq!(guard.controller.state(), ProtectionState::Off);
    assert!(guard.devices.all_enabled());

    // No prompts while Off, even for a fresh watched app.
    guard.launch("teams.exe");
    assert_eq!(guard.watcher.run_iteration(), 0);

    assert!(wait_for(|| guard.controller.state() == ProtectionState::On));
    assert!(guard.devices.all_disabled());
    assert!(wait_for(|| guard.watcher.pending_grants() == 0));
}

#[test]
fn test_manual_off_suppresses_prompts() {
    let guard = Guard::new(Duration::from_secs(300));
    guard.controller.startup_probe();
    assert!(guard.controller.user_request_off());
    assert!(guard.devices.all_enabled());

    guard.launch("discord.exe");
    assert_eq!(guard.watcher.run_iteration(), 0);
    assert_eq!(guard.prompts(), 0);

    assert!(guard.controller.user_request_on());
    guard.answer(false);
    assert_eq!(guard.watcher.run_iteration(), 1);
}

#[test]
fn test_uninstall_removes_autorun_and_releases_cameras() {
    let guard = Guard::new(Duration::from_secs(300));
    guard.controller.startup_probe();
    guard.controller.install().unwrap();

    guard.controller.uninstall().unwrap();
    assert_eq!(guard.controller.state(), ProtectionState::Off);
    assert!(guard.devices.all_enabled());
}

#[test]
fn test_worker_exit_codes_are_stable() {
    assert_eq!(WorkerExit::Success.code(), 0);
    assert_eq!(WorkerExit::UnknownDirective.code(), 1);
    assert_eq!(WorkerExit::DisableFailed.code(), 2);
    assert_eq!(WorkerExit::EnableFailed.code(), 3);
}
