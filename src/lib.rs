//! Build the Yadigar firmware and flash it onto a TTGO T-Display
//!
//! The installer clones and installs ESP-IDF, checks out the firmware at its
//! latest release, builds it for the board and flashes it over USB. Every
//! step whose result is already on disk is skipped on later runs.
//!
//! Only Linux hosts are supported.

pub use config::{Config, InstallPaths};
pub use context::Context;
pub use error::{Error, Step};
pub use provision::{provision, Options, Outcome};

pub mod build;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod context;
pub mod depends;
pub mod device;
pub mod error;
pub mod flash;
pub mod interrupt;
pub mod logging;
pub mod process;
pub mod provision;
pub mod remote;
pub mod source;
pub mod toolchain;
