use std::{env, path::PathBuf};

use atmega328p_config::PlatformConfig;
use cinder_config::buildtime;
use miette::{IntoDiagnostic, Result, WrapErr};

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    let config_dir = {
        let root = env::var("CARGO_MANIFEST_DIR")
            .into_diagnostic()
            .context("No CARGO_MANIFEST_DIR")?;
        PathBuf::from(root).join("board-configs")
    };
    buildtime::render_all::<PlatformConfig>(config_dir)
}
