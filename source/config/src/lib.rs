//! # cinder board configuration
//!
//! Board configuration is written in TOML, checked and serialized to
//! [`postcard`] by the platform crate's build script, and embedded in the
//! firmware image. Firmware never parses TOML at runtime.
//!
//! ## In a `build.rs` script
//!
//! ```toml
//! [build-dependencies]
//! cinder-config = { path = "../../source/config", features = ["use-std"] }
//! ```
//!
//! ```rust,no_run
//! # #![allow(clippy::needless_doctest_main)]
//! # #[derive(serde::Serialize, serde::Deserialize)]
//! # struct Board { led: u8 }
//! fn main() -> miette::Result<()> {
//!     // renders every `*.toml` file in `board-configs/`.
//!     cinder_config::buildtime::render_all::<Board>("board-configs")
//! }
//! ```
//!
//! Rendering fails, with a diagnostic pointing at the offending file, if a
//! file does not parse or if its settings cannot be produced by the hardware
//! (for example, a baud rate that no divisor reaches).
//!
//! ## In the firmware
//!
//! ```rust,ignore
//! let config = cinder_config::include_config!(Board, "uno")?;
//! ```
//!
//! Board-specific types should live in a small separate crate, so that the
//! platform crate and its build script can share them.

#![cfg_attr(not(any(feature = "use-std", test)), no_std)]

use hal::{
    settings::ConfigError,
    tick::TickSetup,
    twi::ClockDivisor,
    uart::BaudSetup,
    HalSettings,
};
use serde::{Deserialize, Serialize};

/// A complete board configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CinderConfig<Platform> {
    #[serde(default)]
    pub hal: HalSettings,
    pub platform: Platform,
}

/// Set by the build script to the directory containing rendered configs.
pub const CONFIG_DIR_VAR: &str = "CINDER_CONFIG_DIR";
/// Set by the build script to the most recently rendered config.
pub const CONFIG_FILE_VAR: &str = "CINDER_CONFIG";

impl<Platform> CinderConfig<Platform> {
    /// Check that every peripheral can be clocked as configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let HalSettings {
            clock,
            twi,
            uart,
            tick,
        } = &self.hal;
        ClockDivisor::from_settings(clock, twi)?;
        BaudSetup::from_settings(clock, uart)?;
        TickSetup::from_settings(clock, tick)?;
        Ok(())
    }
}

/// Rendering board configs from a build script.
#[cfg(feature = "use-std")]
pub mod buildtime {
    use super::*;
    use miette::{Context, IntoDiagnostic, Result};
    use serde::de::DeserializeOwned;
    use std::{env, fs, path::Path};

    const OUT_DIR: &str = "OUT_DIR";
    const TAG: &str = concat!(module_path!(), ":");

    /// Render every `*.toml` file in `config_dir`.
    ///
    /// Rendered configs are written to `OUT_DIR` and can be loaded by name
    /// with [`include_config!`](crate::include_config).
    pub fn render_all<Platform>(config_dir: impl AsRef<Path>) -> Result<()>
    where
        Platform: Serialize + DeserializeOwned + 'static,
    {
        let config_dir = config_dir.as_ref();
        let dir_disp = config_dir.display();
        let out_dir = out_dir()?;

        println!("cargo:rerun-if-changed={dir_disp}");
        println!("cargo:rustc-env={CONFIG_DIR_VAR}={out_dir}");
        eprintln!("{TAG} rendering configs in '{dir_disp}' to '{out_dir}'");

        let entries = fs::read_dir(config_dir)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config directory '{dir_disp}'"))?;

        let mut rendered = 0;
        let mut skipped = 0;
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(error) => {
                    println!("cargo:warning=Error reading config dir entry: {error}");
                    continue;
                }
            };

            if path.is_dir() || path.extension().map_or(true, |ext| ext != "toml") {
                eprintln!("{TAG}   skipping '{}'", path.display());
                skipped += 1;
                continue;
            }

            render_file_to::<Platform>(&path, &out_dir)?;
            rendered += 1;
        }

        if rendered == 0 {
            return Err(miette::MietteDiagnostic::new("No board configs were rendered")
                .with_help(format!(
                    "'{dir_disp}' contains no TOML files ({skipped} other entries)"
                ))
                .into());
        }

        Ok(())
    }

    /// Render a single config file. The result is loaded with
    /// `include_config!(Platform)`.
    pub fn render_file<Platform>(path: impl AsRef<Path>) -> Result<()>
    where
        Platform: Serialize + DeserializeOwned + 'static,
    {
        let out_dir = out_dir()?;
        render_file_to::<Platform>(path, out_dir)
    }

    /// Parse and check a TOML board config.
    pub fn from_toml<Platform>(toml: &str) -> Result<CinderConfig<Platform>>
    where
        Platform: DeserializeOwned,
    {
        let config: CinderConfig<Platform> = toml::from_str(toml).into_diagnostic()?;
        config.validate().map_err(|error| {
            miette::MietteDiagnostic::new(error.to_string()).with_help("check the [hal] section")
        })?;
        Ok(config)
    }

    fn out_dir() -> Result<String> {
        env::var(OUT_DIR)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read '{OUT_DIR}' env variable"))
    }

    fn render_file_to<Platform>(path: impl AsRef<Path>, out_dir: impl AsRef<Path>) -> Result<()>
    where
        Platform: Serialize + DeserializeOwned + 'static,
    {
        let path = path.as_ref();
        let path_disp = path.display();

        (|| {
            let filename = path
                .file_name()
                .ok_or_else(|| miette::miette!("Path has no filename"))?;
            eprintln!("{TAG} rendering '{path_disp}'");

            let toml = fs::read_to_string(path).into_diagnostic()?;
            let config = from_toml::<Platform>(&toml)?;
            let bytes = postcard::to_stdvec(&config).into_diagnostic()?;

            let mut out = out_dir.as_ref().join(filename);
            out.set_extension("postcard");
            fs::write(&out, bytes).into_diagnostic()?;

            println!("cargo:rustc-env={CONFIG_FILE_VAR}={}", out.display());
            println!("cargo:rerun-if-changed={path_disp}");
            Ok::<_, miette::Report>(())
        })()
        .wrap_err_with(|| format!("Failed to render board config '{path_disp}'"))
    }
}

/// Loading rendered configs in firmware.
pub mod runtime {
    use crate::CinderConfig;
    use core::fmt;
    use serde::de::DeserializeOwned;

    #[derive(Debug, PartialEq)]
    pub enum Error {
        Postcard(postcard::Error),
    }

    pub fn from_postcard<Platform>(bytes: &[u8]) -> Result<CinderConfig<Platform>, Error>
    where
        Platform: DeserializeOwned + 'static,
    {
        postcard::from_bytes(bytes).map_err(Error::Postcard)
    }

    impl fmt::Display for Error {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Postcard(error) => write!(f, "malformed board config: {error}"),
            }
        }
    }
}

/// Load a board config rendered by the build script.
///
/// With a name, loads `board-configs/<name>.toml` as rendered by
/// [`buildtime::render_all`]. Without one, loads the config rendered by
/// [`buildtime::render_file`].
#[macro_export]
macro_rules! include_config {
    ($platform: ty, $name: literal) => {{
        const CINDER_CONFIG: &[u8] =
            include_bytes!(concat!(env!("CINDER_CONFIG_DIR"), "/", $name, ".postcard"));
        $crate::runtime::from_postcard::<$platform>(CINDER_CONFIG)
    }};
    ($platform: ty) => {{
        const CINDER_CONFIG: &[u8] = include_bytes!(env!("CINDER_CONFIG"));
        $crate::runtime::from_postcard::<$platform>(CINDER_CONFIG)
    }};
}
