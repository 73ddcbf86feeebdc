//! Firmware checkout

use std::fs;

use log::info;

use crate::{
    context::Context,
    error::{ResultExt, Step},
    process::{Invocation, Output},
    Error,
};

/// Clone the firmware at `tag` unless a checkout already exists
pub fn prepare(ctx: &Context, tag: &str) -> Result<(), Error> {
    let paths = &ctx.paths;

    if paths.firmware_prepared() {
        info!("Yadigar source found in {}", paths.firmware.display());
        return Ok(());
    }

    println!("Downloading Yadigar {tag}...");
    fs::create_dir_all(&paths.work).for_step(Step::CloneFirmware)?;

    let clone = Invocation::new("git")
        .args(["clone", "--branch", tag, "--single-branch", "--depth", "1"])
        .arg(&ctx.config.firmware.repository)
        .arg(paths.firmware.display().to_string());
    ctx.run(&clone, Step::CloneFirmware)?;

    let submodules = Invocation::new("git")
        .args(["submodule", "update", "--depth", "1", "--init", "--recursive"])
        .current_dir(&paths.firmware)
        .output(Output::Silence);
    ctx.run(&submodules, Step::FirmwareSubmodules)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        context::testing::context,
        process::{testing::RecordingRunner, ProcessOutput},
    };

    #[test]
    fn clones_at_tag_with_submodules() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Rc::new(RecordingRunner::new());
        let ctx = context(dir.path(), &runner);

        prepare(&ctx, "v1.0.4").unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![
                format!(
                    "git clone --branch v1.0.4 --single-branch --depth 1 \
                     https://github.com/sukunetsiz/yadigar.git {}",
                    ctx.paths.firmware.display()
                ),
                "git submodule update --depth 1 --init --recursive".to_string(),
            ]
        );
        assert_eq!(runner.calls.borrow()[1].output, Output::Silence);
    }

    #[test]
    fn existing_checkout_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Rc::new(RecordingRunner::new());
        let ctx = context(dir.path(), &runner);
        fs::create_dir_all(&ctx.paths.firmware).unwrap();

        prepare(&ctx, "v1.0.4").unwrap();

        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn failed_submodule_update_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Rc::new(RecordingRunner::scripted([
            ProcessOutput::success(),
            ProcessOutput::failure(1),
        ]));
        let ctx = context(dir.path(), &runner);

        let err = prepare(&ctx, "v1.0.4").unwrap_err();

        assert_eq!(err.to_string(), "Failed to update Yadigar submodules");
    }
}
