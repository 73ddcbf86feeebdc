//! Terminal output and input

use std::io::{stdout, IsTerminal};

use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use log::debug;

pub use self::prompt::TerminalOperator;

mod prompt;

const BANNER: &str = "\
------------------------------------------------------------
------------------------------------------------------------
---                                                      ---
---          Do-It-Yourself Yadigar Install Script       ---
---                Written by sukunetsiz                 ---
---                                                      ---
------------------------------------------------------------
------------------------------------------------------------
";

/// Clear the terminal and introduce the installer
pub fn print_banner(device_name: &str) {
    let mut out = stdout();
    if out.is_terminal() {
        if let Err(e) = execute!(out, Clear(ClearType::All), MoveTo(0, 0)) {
            debug!("Failed to clear the terminal: {e}");
        }
    }

    println!("{BANNER}");
    if is_root() {
        println!(
            "ALERT: You're running the script as root/superuser.\n\
             You may notice PIP 'sudo -H' warnings.\n"
        );
    }
    println!("LINUX ONLY. Flashing the {device_name}...");
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}
