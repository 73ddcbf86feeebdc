//! ESP-IDF installation

use std::fs;

use log::{debug, info};

use crate::{
    context::Context,
    error::{ResultExt, Step},
    process::{Invocation, Output},
    Error,
};

/// Install ESP-IDF unless it is already present, then run its install script
/// once more so the Python environment and tools match the checkout.
pub fn install(ctx: &Context) -> Result<(), Error> {
    let paths = &ctx.paths;
    let toolchain = &ctx.config.toolchain;

    if paths.toolchain_installed() {
        info!("ESP-IDF found in {}", paths.toolchain.display());
    } else {
        println!("Installing ESP-IDF {}...", toolchain.tag);

        let staging = &paths.toolchain_staging;
        if staging.exists() {
            debug!("Removing stale {}", staging.display());
            fs::remove_dir_all(staging).for_step(Step::CloneToolchain)?;
        }
        fs::create_dir_all(&paths.temp).for_step(Step::CloneToolchain)?;

        let clone = Invocation::new("git")
            .args(["clone", "--branch", toolchain.tag.as_str(), "--single-branch"])
            .args(["--depth", "1", toolchain.repository.as_str()])
            .arg(staging.display().to_string());
        ctx.run(&clone, Step::CloneToolchain)?;

        let submodules = Invocation::new("git")
            .args(["submodule", "update", "--depth", "1", "--init", "--recursive"])
            .current_dir(staging);
        ctx.run(&submodules, Step::ToolchainSubmodules)?;

        let install = Invocation::new(staging.join("install.sh").display().to_string())
            .arg(&toolchain.target)
            .current_dir(staging)
            .output(Output::Silence);
        ctx.run(&install, Step::InstallToolchain)?;

        fs::rename(staging, &paths.toolchain).for_step(Step::MoveToolchain)?;
    }

    let install = Invocation::new(paths.toolchain.join("install.sh").display().to_string())
        .arg(&toolchain.target)
        .current_dir(&paths.toolchain);
    ctx.run(&install, Step::InstallToolchain)?;

    Ok(())
}
