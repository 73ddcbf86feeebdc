//! The provisioning sequence
//!
//! ```text
//! resolve tag -> check dependencies -> install ESP-IDF -> clone firmware
//!     -> build -> [build only: stop] -> wait for device -> elevate -> flash
//! ```
//!
//! Every step is fatal on failure. Steps whose result is already on disk are
//! skipped, so re-running after a failure resumes where it stopped. The
//! [CleanupGuard] taken at the start runs on every way out of [provision].

use log::info;

use crate::{
    build,
    cleanup::CleanupGuard,
    context::Context,
    depends::{check_dependencies, parse_dependency_list},
    device::{self, Operator},
    flash,
    remote::Remote,
    source,
    toolchain,
    Error,
};

/// Choices made before the run starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Firmware tag to install instead of the latest release
    pub tag: Option<String>,
    /// Stop after building, without touching the device
    pub build_only: bool,
}

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The firmware was built but not flashed
    Built { version: String },
    /// The firmware was built and written to the device
    Flashed { version: String },
}

/// Run the whole sequence
pub fn provision(
    ctx: Context,
    remote: &dyn Remote,
    operator: &mut dyn Operator,
    options: &Options,
) -> Result<Outcome, Error> {
    let mut ctx = CleanupGuard::new(ctx);

    let tag = match &options.tag {
        Some(tag) => tag.clone(),
        None => remote.latest_tag(&ctx.config.firmware.release_api)?,
    };
    info!("Installing Yadigar {tag}");
    ctx.checkpoint()?;

    let depends = remote.dependency_list(&ctx.config.depends_url)?;
    ctx.checkpoint()?;
    check_dependencies(ctx.runner(), &parse_dependency_list(&depends))?;

    toolchain::install(&ctx)?;
    source::prepare(&ctx, &tag)?;
    let version = build::build(&ctx, &tag)?;

    if options.build_only {
        println!("Exiting the script for CI runners.");
        return Ok(Outcome::Built { version });
    }

    device::wait_for_device(&ctx.config.device, ctx.interrupt(), operator)?;
    device::elevate_permissions(&mut ctx)?;
    flash::flash(&ctx)?;

    println!(
        "\nSUCCESS! Yadigar {version} is now installed on your {}.",
        ctx.config.device.name
    );
    println!("You can close this window.");

    Ok(Outcome::Flashed { version })
}
