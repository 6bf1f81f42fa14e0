// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Command line surface: interactive launch vs. elevated worker.

use tracing::info;

use crate::device::{DeviceBackend, ToggleEngine};

const DIRECTIVE_PREFIX: &str = "do=";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Enable,
    Disable,
}

impl Directive {
    pub fn from_enable(enable: bool) -> Self {
        if enable { Directive::Enable } else { Directive::Disable }
    }

    /// Argument passed to the elevated child.
    pub fn as_arg(self) -> &'static str {
        match self {
            Directive::Enable => "--do=enable",
            Directive::Disable => "--do=disable",
        }
    }
}

/// Exit codes of the elevated worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    Success = 0,
    UnknownDirective = 1,
    DisableFailed = 2,
    EnableFailed = 3,
}

impl WorkerExit {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Interactive,
    /// `Err` carries the unrecognized directive value.
    Worker(Result<Directive, String>),
}

/// Classifies the process arguments (without argv[0]). Only the first
/// argument is inspected; anything that is not a directive launches the UI.
pub fn parse_invocation<I, S>(args: I) -> Invocation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let Some(first) = args.into_iter().next() else {
        return Invocation::Interactive;
    };
    let arg = first.as_ref().trim();
    let arg = arg.trim_start_matches('-');
    let Some(value) = arg.strip_prefix(DIRECTIVE_PREFIX) else {
        return Invocation::Interactive;
    };
    Invocation::Worker(match value {
        "enable" => Ok(Directive::Enable),
        "disable" => Ok(Directive::Disable),
        other => Err(other.to_string()),
    })
}

/// Body of the elevated worker process.
pub fn run_worker<B: DeviceBackend>(
    directive: Result<Directive, String>,
    engine: &ToggleEngine<B>,
) -> WorkerExit {
    let exit = match directive {
        Ok(Directive::Disable) => {
            if engine.set_all_cameras_enabled(false) {
                WorkerExit::Success
            } else {
                WorkerExit::DisableFailed
            }
        }
        Ok(Directive::Enable) => {
            if engine.set_all_cameras_enabled(true) {
                WorkerExit::Success
            } else {
                WorkerExit::EnableFailed
            }
        }
        Err(value) => {
            tracing::error!(%value, "unrecognized directive");
            WorkerExit::UnknownDirective
        }
    };
    info!(?exit, code = exit.code(), "worker finished");
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CAMERA_CLASS, IMAGE_CLASS};
    use crate::device::fake::FakeBackend;

    #[test]
    fn test_no_args_is_interactive() {
        assert_eq!(parse_invocation(Vec::<String>::new()), Invocation::Interactive);
        assert_eq!(parse_invocation(["--minimized"]), Invocation::Interactive);
    }

    #[test]
    fn test_directive_forms() {
        assert_eq!(parse_invocation(["--do=enable"]), Invocation::Worker(Ok(Directive::Enable)));
        assert_eq!(parse_invocation(["do=disable"]), Invocation::Worker(Ok(Directive::Disable)));
        assert_eq!(
            parse_invocation(["--do=reboot"]),
            Invocation::Worker(Err("reboot".to_string()))
        );
    }

    #[test]
    fn test_as_arg_parses_back() {
        for d in [Directive::Enable, Directive::Disable] {
            assert_eq!(parse_invocation([d.as_arg()]), Invocation::Worker(Ok(d)));
        }
    }

    #[test]
    fn test_worker_exit_codes() {
        let ok = ToggleEngine::new(FakeBackend::default(), vec![IMAGE_CLASS]);
        assert_eq!(run_worker(Ok(Directive::Disable), &ok), WorkerExit::Success);
        assert_eq!(run_worker(Err("x".into()), &ok).code(), 1);

        let mut backend = FakeBackend::default();
        backend.tree.insert(CAMERA_CLASS.guid, vec![false]);
        let bad = ToggleEngine::new(backend, vec![CAMERA_CLASS]);
        assert_eq!(run_worker(Ok(Directive::Disable), &bad).code(), 2);
        assert_eq!(run_worker(Ok(Directive::Enable), &bad).code(), 3);
    }
}
