// Invisible - Camera protection with timed exceptions
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    // Resource compilation only makes sense for Windows targets.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }
    let mut res = winresource::WindowsResource::new();
    res.set("FileDescription", "Invisible - Camera Guard");
    res.set("ProductName", "Invisible");
    res.set("OriginalFilename", "invisible.exe");
    if let Err(e) = res.compile() {
        println!("cargo:warning=winresource: resource compile failed: {e}");
    }
}
