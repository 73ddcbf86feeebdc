//! Waiting for the board and making its device node writable

use std::{
    fs, io,
    os::unix::fs::{FileTypeExt, PermissionsExt},
    path::Path,
};

use log::{debug, info};
use serialport::{available_ports, SerialPortType};

use crate::{
    config::Device,
    context::Context,
    error::{ResultExt, Step},
    interrupt::Interrupt,
    process::Invocation,
    Error,
};

/// Something that can ask the operator to press a key
pub trait Operator {
    /// Show `prompt` and block until a key is pressed
    fn wait_for_key(&mut self, prompt: &str) -> Result<(), Error>;
}

/// The device's permission bits as they were before the first elevation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionSnapshot(Option<u32>);

impl PermissionSnapshot {
    /// Remember `mode`, unless a mode was already captured
    pub fn capture(&mut self, mode: u32) {
        if self.0.is_none() {
            self.0 = Some(mode);
        }
    }

    pub fn original(&self) -> Option<u32> {
        self.0
    }
}

/// The `0o777` permission bits of `path`
pub fn permission_bits(path: &Path) -> io::Result<u32> {
    Ok(fs::metadata(path)?.permissions().mode() & 0o777)
}

/// Whether the "others" class may both read and write
pub fn others_can_read_write(mode: u32) -> bool {
    mode & 0o7 >= 6
}

/// Whether `path` exists and is a character device
pub fn is_ready(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.file_type().is_char_device())
        .unwrap_or(false)
}

/// Block until the device node appears, prompting the operator each time it
/// is not there yet
///
/// A key press may follow a signal that did not reach the prompt itself, so
/// the interrupt flag is checked after every one.
pub fn wait_for_device(
    device: &Device,
    interrupt: &Interrupt,
    operator: &mut dyn Operator,
) -> Result<(), Error> {
    let prompt = format!(
        "Connect your {} and PRESS ANY KEY to continue... ",
        device.name
    );

    while !is_ready(&device.path) {
        debug!("{} is not a character device yet", device.path.display());
        log_usb_serial_ports(&device.path);
        operator.wait_for_key(&prompt)?;
        interrupt.checkpoint()?;
    }
    interrupt.checkpoint()?;

    debug!("Found {}", device.path.display());

    Ok(())
}

/// Mention other USB serial ports, in case the board shows up under a
/// different name than the configured one
fn log_usb_serial_ports(expected: &Path) {
    let ports = match available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            debug!("Unable to list serial ports: {e}");
            return;
        }
    };

    for port in ports
        .iter()
        .filter(|port| matches!(port.port_type, SerialPortType::UsbPort(_)))
        .filter(|port| Path::new(&port.port_name) != expected)
    {
        info!(
            "Detected USB serial port {}, use `--device {}` if this is your board",
            port.port_name, port.port_name
        );
    }
}

/// Grant "others" read and write access to the device if they lack it,
/// remembering the original bits in the context
pub fn elevate_permissions(ctx: &mut Context) -> Result<(), Error> {
    let device = &ctx.config.device;
    let mode = permission_bits(&device.path).for_step(Step::ElevatePermissions)?;

    if others_can_read_write(mode) {
        debug!("{} is already accessible ({mode:o})", device.path.display());
        return Ok(());
    }

    println!("\nElevating write permissions for {}", device.name);

    let chmod = Invocation::new("sudo")
        .args(["chmod", "o+rw"])
        .arg(device.path.display().to_string());
    ctx.snapshot.capture(mode);
    ctx.run(&chmod, Step::ElevatePermissions)?;
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, rc::Rc};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        context::testing::context,
        process::{testing::RecordingRunner, ProcessOutput},
    };

    struct CountingOperator {
        presses: usize,
        give_up_after: usize,
    }

    impl Operator for CountingOperator {
        fn wait_for_key(&mut self, prompt: &str) -> Result<(), Error> {
            assert!(prompt.starts_with("Connect your TTGO T-Display"));
            self.presses += 1;
            if self.presses >= self.give_up_after {
                Err(Error::Cancelled)
            } else {
                Ok(())
            }
        }
    }

    fn device(path: impl Into<PathBuf>) -> Device {
        Device {
            path: path.into(),
            ..Device::default()
        }
    }

    #[test]
    fn others_digit_threshold() {
        assert!(others_can_read_write(0o666));
        assert!(others_can_read_write(0o667));
        assert!(!others_can_read_write(0o660));
        assert!(!others_can_read_write(0o664));
        assert!(!others_can_read_write(0o665));
    }

    #[test]
    fn snapshot_keeps_first_capture() {
        let mut snapshot = PermissionSnapshot::default();
        assert_eq!(snapshot.original(), None);

        snapshot.capture(0o660);
        snapshot.capture(0o666);
        assert_eq!(snapshot.original(), Some(0o660));
    }

    #[test]
    fn character_device_is_ready_immediately() {
        let mut operator = CountingOperator {
            presses: 0,
            give_up_after: 1,
        };

        wait_for_device(&device("/dev/null"), &Interrupt::default(), &mut operator).unwrap();
        assert_eq!(operator.presses, 0);
    }

    #[test]
    fn regular_file_keeps_prompting() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut operator = CountingOperator {
            presses: 0,
            give_up_after: 3,
        };

        let err = wait_for_device(&device(file.path()), &Interrupt::default(), &mut operator)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(operator.presses, 3);
    }

    #[test]
    fn interrupt_during_prompt_stops_waiting() {
        struct TriggeringOperator {
            interrupt: Interrupt,
            presses: usize,
        }

        impl Operator for TriggeringOperator {
            fn wait_for_key(&mut self, _prompt: &str) -> Result<(), Error> {
                self.presses += 1;
                self.interrupt.trigger();
                Ok(())
            }
        }

        let file = tempfile::NamedTempFile::new().unwrap();
        let interrupt = Interrupt::default();
        let mut operator = TriggeringOperator {
            interrupt: interrupt.clone(),
            presses: 0,
        };

        let err = wait_for_device(&device(file.path()), &interrupt, &mut operator).unwrap_err();
        assert!(matches!(err, Error::Interrupted));
        assert_eq!(operator.presses, 1);
    }

    #[test]
    fn ready_device_still_honours_a_pending_interrupt() {
        let interrupt = Interrupt::default();
        interrupt.trigger();
        let mut operator = CountingOperator {
            presses: 0,
            give_up_after: 1,
        };

        let err = wait_for_device(&device("/dev/null"), &interrupt, &mut operator).unwrap_err();
        assert!(matches!(err, Error::Interrupted));
        assert_eq!(operator.presses, 0);
    }

    #[test]
    fn accessible_device_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("ttyACM0");
        fs::write(&node, "").unwrap();
        fs::set_permissions(&node, fs::Permissions::from_mode(0o666)).unwrap();

        let runner = Rc::new(RecordingRunner::new());
        let mut ctx = context(dir.path(), &runner);
        ctx.config.device.path = node;

        elevate_permissions(&mut ctx).unwrap();

        assert!(runner.calls.borrow().is_empty());
        assert_eq!(ctx.snapshot.original(), None);
    }

    #[test]
    fn restricted_device_is_elevated_and_snapshotted() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("ttyACM0");
        fs::write(&node, "").unwrap();
        fs::set_permissions(&node, fs::Permissions::from_mode(0o660)).unwrap();

        let runner = Rc::new(RecordingRunner::new());
        let mut ctx = context(dir.path(), &runner);
        ctx.config.device.path = node.clone();

        elevate_permissions(&mut ctx).unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![format!("sudo chmod o+rw {}", node.display())]
        );
        assert_eq!(ctx.snapshot.original(), Some(0o660));
    }

    #[test]
    fn failed_chmod_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("ttyACM0");
        fs::write(&node, "").unwrap();
        fs::set_permissions(&node, fs::Permissions::from_mode(0o600)).unwrap();

        let runner = Rc::new(RecordingRunner::scripted([ProcessOutput::failure(1)]));
        let mut ctx = context(dir.path(), &runner);
        ctx.config.device.path = node;

        let err = elevate_permissions(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            Error::StepFailed {
                step: Step::ElevatePermissions,
                ..
            }
        ));
    }
}
