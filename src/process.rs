//! Invocation of external programs
//!
//! Every external tool (git, the ESP-IDF installer, `idf.py`, `sudo`) is
//! started through a [Runner], which returns a structured [ProcessOutput]
//! instead of a bare success flag. Call sites decide what a failure means by
//! attaching a [Step] with [ProcessOutput::check].

use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use log::debug;

use crate::error::{Error, Step};

/// What to do with the standard streams of a child process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Output {
    /// Forward to the terminal
    #[default]
    Inherit,
    /// Collect stdout and stderr into the returned [ProcessOutput]
    Capture,
    /// Discard both streams
    Silence,
}

/// A single external program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub output: Output,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            output: Output::default(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    /// Run `script` with `sh -c`
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    /// Run `command` with `bash -c` after sourcing `env_script`
    pub fn sourced(env_script: &Path, command: &str) -> Self {
        Self::new("bash")
            .arg("-c")
            .arg(format!("source {} && {command}", env_script.display()))
    }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Result of a finished child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    pub fn failure(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into an error carrying `step`
    pub fn check(self, step: Step) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::StepFailed {
                step,
                code: self.code,
            })
        }
    }
}

/// Something that can start external programs and wait for them
pub trait Runner {
    /// Run the invocation to completion
    ///
    /// Only failing to start the program is an error here; a non-zero exit
    /// code is reported through the returned [ProcessOutput].
    fn run(&self, invocation: &Invocation, step: Step) -> Result<ProcessOutput, Error>;
}

/// [Runner] backed by [std::process::Command]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, invocation: &Invocation, step: Step) -> Result<ProcessOutput, Error> {
        debug!("Running command: {invocation}");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }

        let output = match invocation.output {
            Output::Inherit => cmd
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map(|status| ProcessOutput {
                    code: status.code(),
                    ..Default::default()
                }),
            Output::Silence => cmd
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| ProcessOutput {
                    code: status.code(),
                    ..Default::default()
                }),
            Output::Capture => cmd.output().map(|output| ProcessOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
        }
        .map_err(|source| Error::Spawn { step, source })?;

        debug!("Command exit code: {:?}", output.code);

        Ok(output)
    }
}
