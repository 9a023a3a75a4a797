// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use image_sorter::paths::display_path;
use image_sorter::{PathResolver, PlatformProfile};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    raw: String,
    drive_mount: bool,
}

fuzz_target!(|input: Input| {
    let profile = if input.drive_mount {
        PlatformProfile::DriveMount { prefix: "/mnt".to_string() }
    } else {
        PlatformProfile::Native
    };
    let resolver = PathResolver::new(profile);

    let resolved = resolver.resolve(&input.raw);
    let rendered = display_path(&resolved);

    // Normalizing a normalized path changes nothing
    assert_eq!(resolver.normalize(&rendered), rendered.as_str());
});
