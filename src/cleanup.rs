//! Cleanup that runs when a provisioning run ends, however it ends

use std::{
    fs,
    ops::{Deref, DerefMut},
};

use log::{debug, error, warn};

use crate::{context::Context, device::permission_bits, error::Step, process::Invocation};

/// Owns the [Context] for the duration of a run and cleans up after it when
/// dropped.
pub struct CleanupGuard {
    ctx: Context,
}

impl CleanupGuard {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

impl Deref for CleanupGuard {
    type Target = Context;

    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

impl DerefMut for CleanupGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ctx
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        cleanup(&self.ctx);
    }
}

/// Remove the temp directory and put the device's permissions back
///
/// Failures are logged and otherwise ignored, the outcome of the run has
/// already been decided.
pub fn cleanup(ctx: &Context) {
    let temp = &ctx.paths.temp;
    if temp.exists() {
        debug!("Removing {}", temp.display());
        if let Err(e) = fs::remove_dir_all(temp) {
            warn!("Failed to remove {}: {e}", temp.display());
        }
    }

    restore_permissions(ctx);
}

fn restore_permissions(ctx: &Context) {
    let Some(original) = ctx.snapshot.original() else {
        return;
    };

    let path = &ctx.config.device.path;
    let current = match permission_bits(path) {
        Ok(current) => current,
        Err(e) => {
            debug!("Not restoring permissions of {}: {e}", path.display());
            return;
        }
    };

    if current == original {
        return;
    }

    debug!(
        "Restoring permissions of {} from {current:o} to {original:o}",
        path.display()
    );

    let chmod = Invocation::new("sudo")
        .arg("chmod")
        .arg(format!("{original:o}"))
        .arg(path.display().to_string());

    // The interrupt flag may be set here, so bypass the context's checkpoints.
    let result = ctx
        .runner()
        .run(&chmod, Step::RestorePermissions)
        .and_then(|output| output.check(Step::RestorePermissions));

    if let Err(e) = result {
        error!("{e}");
    }
}
