//! Firmware configuration and build

use std::{fs, io::ErrorKind};

use log::{debug, warn};

use crate::{
    context::Context,
    error::{ResultExt, Step},
    process::{Invocation, Output},
    Error,
};

/// Configuration file `idf.py` picks up from the project root
pub const DEFAULTS_FILE: &str = "sdkconfig.defaults";

/// Lines containing this marker enable the firmware's debug mode
const DEBUG_MARKER: &str = "CONFIG_DEBUG_MODE";
/// Silences all logging in release builds
const LOG_LEVEL_NONE: &str = "CONFIG_LOG_DEFAULT_LEVEL_NONE=y";

/// Strip debug mode from a defaults file and disable default logging
pub fn patch_defaults(contents: &str) -> String {
    let mut patched = String::with_capacity(contents.len() + LOG_LEVEL_NONE.len() + 1);
    patched.push_str(LOG_LEVEL_NONE);
    patched.push('\n');

    for line in contents.lines().filter(|line| !line.contains(DEBUG_MARKER)) {
        patched.push_str(line);
        patched.push('\n');
    }

    patched
}

/// Version of the checked out firmware, as reported by `git describe`
///
/// Falls back to `tag` when the checkout has no usable git metadata.
pub fn describe_version(ctx: &Context, tag: &str) -> Result<String, Error> {
    let describe = Invocation::new("git")
        .args(["describe", "--tags"])
        .current_dir(&ctx.paths.firmware)
        .output(Output::Capture);
    let output = ctx.runner().run(&describe, Step::DescribeVersion)?;
    ctx.checkpoint()?;

    let version = output.stdout.trim();
    if output.is_success() && !version.is_empty() {
        Ok(version.to_owned())
    } else {
        warn!(
            "Unable to describe the firmware checkout, assuming {tag}: {}",
            output.stderr.trim()
        );
        Ok(tag.to_owned())
    }
}

/// Configure the firmware for the board and build it, returning its version
pub fn build(ctx: &Context, tag: &str) -> Result<String, Error> {
    let firmware = &ctx.paths.firmware;
    let version = describe_version(ctx, tag)?;

    let defaults = firmware.join(DEFAULTS_FILE);
    fs::copy(firmware.join(&ctx.config.firmware.defaults), &defaults)
        .for_step(Step::PatchConfig)?;
    let contents = fs::read_to_string(&defaults).for_step(Step::PatchConfig)?;
    fs::write(&defaults, patch_defaults(&contents)).for_step(Step::PatchConfig)?;

    // Left behind by in-place edits of earlier installer versions.
    let backup = firmware.join(format!("{DEFAULTS_FILE}.bak"));
    match fs::remove_file(&backup) {
        Ok(()) => debug!("Removed {}", backup.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e).for_step(Step::PatchConfig),
    }

    println!("Building Yadigar {version}...");
    let build = Invocation::sourced(&ctx.paths.export_script(), "idf.py build")
        .current_dir(firmware);
    ctx.run(&build, Step::Build)?;

    Ok(version)
}
