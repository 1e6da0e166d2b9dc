// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT license.

/// Only emits anything when the `link` feature is on. TORQUE installations
/// frequently ship without a pkg-config file, so we fall back to linking by
/// name, optionally with a search path from `TORQUE_LIB_DIR`.

extern crate pkg_config;

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=TORQUE_LIB_DIR");

    if env::var_os("CARGO_FEATURE_LINK").is_none() {
        return;
    }

    if pkg_config::Config::new().atleast_version("2.5").probe("torque").is_ok() {
        return;
    }

    if let Some(dir) = env::var_os("TORQUE_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
    }

    println!("cargo:rustc-link-lib=torque");
}
