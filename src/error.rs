//! Library and application errors

use std::io;

use miette::Diagnostic;
use strum::Display;
use thiserror::Error;

/// Every external call site of the provisioning sequence
///
/// The display string of each variant is the message shown to the user when
/// that call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Step {
    #[strum(to_string = "Failed to probe for dependency")]
    ProbeDependency,
    #[strum(to_string = "Failed to clone ESP-IDF repository")]
    CloneToolchain,
    #[strum(to_string = "Failed to update ESP-IDF submodules")]
    ToolchainSubmodules,
    #[strum(to_string = "Failed to run ESP-IDF install script")]
    InstallToolchain,
    #[strum(to_string = "Failed to move ESP-IDF directory")]
    MoveToolchain,
    #[strum(to_string = "Failed to clone Yadigar repository")]
    CloneFirmware,
    #[strum(to_string = "Failed to update Yadigar submodules")]
    FirmwareSubmodules,
    #[strum(to_string = "Failed to read the Yadigar version")]
    DescribeVersion,
    #[strum(to_string = "Failed to modify sdkconfig.defaults")]
    PatchConfig,
    #[strum(to_string = "Failed to build the project")]
    Build,
    #[strum(to_string = "Failed to change tty device permissions")]
    ElevatePermissions,
    #[strum(to_string = "Failed to flash the device")]
    Flash,
    #[strum(to_string = "Failed to restore tty device permissions")]
    RestorePermissions,
}

/// All possible errors returned by yadigar-diy
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to create the HTTP client")]
    #[diagnostic(code(yadigar_diy::http_client))]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to fetch latest Yadigar tag")]
    #[diagnostic(
        code(yadigar_diy::fetch_tag),
        help("Check your internet connection, or pass the firmware tag with `--tag`")
    )]
    FetchTag(#[source] reqwest::Error),

    #[error("Failed to fetch dependencies list")]
    #[diagnostic(
        code(yadigar_diy::fetch_dependencies),
        help("Check your internet connection and try again")
    )]
    FetchDependencies(#[source] reqwest::Error),

    #[error("{name} was not found on your system")]
    #[diagnostic(
        code(yadigar_diy::missing_dependency),
        help("Please install {name} by running:\n\n{install_command}\n")
    )]
    MissingDependency {
        name: String,
        install_command: String,
    },

    #[error("{step}")]
    #[diagnostic(code(yadigar_diy::step_failed))]
    StepFailed { step: Step, code: Option<i32> },

    #[error("{step}")]
    #[diagnostic(
        code(yadigar_diy::spawn_failed),
        help("Make sure the program is installed and on your PATH")
    )]
    Spawn {
        step: Step,
        #[source]
        source: io::Error,
    },

    #[error("{step}")]
    #[diagnostic(code(yadigar_diy::io))]
    StepIo {
        step: Step,
        #[source]
        source: io::Error,
    },

    #[error("Unable to determine the home directory")]
    #[diagnostic(
        code(yadigar_diy::no_home),
        help("Set the HOME environment variable or pass `--work-dir`")
    )]
    NoHomeDirectory,

    #[error("Failed to parse configuration file {path}")]
    #[diagnostic(code(yadigar_diy::invalid_config))]
    InvalidConfig {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Operation was cancelled by the user")]
    #[diagnostic(code(yadigar_diy::cancelled))]
    Cancelled,

    #[error("Interrupted")]
    #[diagnostic(code(yadigar_diy::interrupted))]
    Interrupted,

    #[error("Failed to install the interrupt handler")]
    #[diagnostic(code(yadigar_diy::interrupt_handler))]
    InterruptHandler(#[source] ctrlc::Error),

    #[error(transparent)]
    #[diagnostic(code(yadigar_diy::io))]
    Io(#[from] io::Error),
}

impl Error {
    /// Process exit code this error should terminate the run with
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Interrupted | Error::Cancelled => 130,
            _ => 1,
        }
    }
}

pub(crate) trait ResultExt<T> {
    /// Attach the failing step to an IO error
    fn for_step(self, step: Step) -> Result<T, Error>;
}

impl<T> ResultExt<T> for Result<T, io::Error> {
    fn for_step(self, step: Step) -> Result<T, Error> {
        self.map_err(|source| Error::StepIo { step, source })
    }
}
