// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

#![cfg_attr(windows, windows_subsystem = "windows")]

use invisible::{parse_invocation, Invocation};

#[cfg(windows)]
fn main() {
    use std::sync::Arc;

    use invisible::win::{
        MessageBoxPrompter, RunKeyAutorun, SetupApiBackend, ShellElevator, SingleInstance,
        ToolhelpProcesses,
    };
    use invisible::{
        run_worker, Config, Controller, ElevationBridge, ProtectionCell, SystemClock, ToggleEngine,
        Watcher,
    };

    let config = Config::default();

    // ── Elevated worker: `--do=enable|disable` ──────────────────────
    // Bypasses the single-instance gate; only ever started by the bridge.
    if let Invocation::Worker(directive) = parse_invocation(std::env::args().skip(1)) {
        invisible::init_logging("worker");
        let engine = ToggleEngine::new(SetupApiBackend, config.classes.clone());
        std::process::exit(run_worker(directive, &engine).code());
    }

    // ── Single-Instance Guard ────────────────────────────────────────
    let Some(_instance) = SingleInstance::acquire() else {
        std::process::exit(0);
    };
    invisible::init_logging("interactive");

    let state = Arc::new(ProtectionCell::new());
    let engine = ToggleEngine::new(SetupApiBackend, config.classes.clone());
    let bridge = Arc::new(ElevationBridge::new(ShellElevator, engine));
    let controller = Arc::new(Controller::new(state, bridge, Arc::new(RunKeyAutorun)));
    let watcher = Arc::new(Watcher::new(
        &config,
        controller.clone(),
        Box::new(ToolhelpProcesses),
        Box::new(MessageBoxPrompter::new(config.grant_duration)),
        Box::new(SystemClock),
    ));

    if let Err(e) = invisible::win::shell::run(controller, watcher) {
        tracing::error!(error = %e, "shell failed");
        std::process::exit(1);
    }
}

#[cfg(not(windows))]
fn main() {
    invisible::init_logging("unsupported");
    // Worker directives are still classified so misuse reports exit code 1.
    let code = match parse_invocation(std::env::args().skip(1)) {
        Invocation::Worker(Err(_)) => invisible::WorkerExit::UnknownDirective.code(),
        _ => 1,
    };
    tracing::error!("Invisible drives Windows device classes and only runs on Windows");
    eprintln!("Invisible only runs on Windows.");
    std::process::exit(code);
}
