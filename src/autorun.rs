// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::error::AutorunError;

/// Per-user logon registration. Presence of the entry is the whole
/// "installed" concept.
pub trait AutorunStore: Send + Sync {
    /// Points the entry at the running executable.
    fn register(&self) -> Result<(), AutorunError>;

    /// Removes the entry. Removing a missing entry succeeds.
    fn unregister(&self) -> Result<(), AutorunError>;

    fn is_registered(&self) -> Result<bool, AutorunError>;
}
