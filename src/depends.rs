//! Host dependency checks

use log::debug;

use crate::{
    error::Step,
    process::{Invocation, Output, Runner},
    Error,
};

/// Packages whose apt name differs from the command they provide
const PYTHON_PACKAGES: &[&str] = &["pip", "virtualenv"];

/// Split a downloaded dependency list into command names
pub fn parse_dependency_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// The apt command that installs `dependency`
pub fn install_command(dependency: &str) -> String {
    let package = if PYTHON_PACKAGES.contains(&dependency) {
        format!("python3-{dependency}")
    } else {
        dependency.to_owned()
    };

    format!("sudo apt update && sudo apt install -y {package}")
}

/// Whether `command` can be found by the shell
pub fn is_installed(runner: &dyn Runner, command: &str) -> Result<bool, Error> {
    // The name comes from a downloaded list, so it is passed as `$1` instead
    // of being spliced into the script.
    let probe = Invocation::shell(r#"command -v "$1""#)
        .args(["sh", command])
        .output(Output::Silence);

    Ok(runner.run(&probe, Step::ProbeDependency)?.is_success())
}

/// Check the dependencies in order, stopping at the first one that is missing
pub fn check_dependencies(runner: &dyn Runner, dependencies: &[String]) -> Result<(), Error> {
    for dependency in dependencies {
        if is_installed(runner, dependency)? {
            debug!("Found dependency: {dependency}");
            continue;
        }

        return Err(Error::MissingDependency {
            name: dependency.clone(),
            install_command: install_command(dependency),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::process::{testing::RecordingRunner, ProcessOutput};

    #[test]
    fn list_skips_blank_lines_and_whitespace() {
        let deps = parse_dependency_list("git\n  cmake \r\n\n\tpip\n");

        assert_eq!(deps, vec!["git", "cmake", "pip"]);
    }

    #[test]
    fn python_tools_install_through_python3_packages() {
        assert_eq!(
            install_command("pip"),
            "sudo apt update && sudo apt install -y python3-pip"
        );
        assert_eq!(
            install_command("virtualenv"),
            "sudo apt update && sudo apt install -y python3-virtualenv"
        );
        assert_eq!(
            install_command("git"),
            "sudo apt update && sudo apt install -y git"
        );
    }

    #[test]
    fn stops_at_first_missing_dependency() {
        let runner = RecordingRunner::with_handler(|inv| {
            if inv.args.last().is_some_and(|s| s == "git") {
                ProcessOutput::success()
            } else {
                ProcessOutput::failure(1)
            }
        });
        let deps = parse_dependency_list("git\npip\ncmake\n");

        let err = check_dependencies(&runner, &deps).unwrap_err();

        match err {
            Error::MissingDependency {
                name,
                install_command,
            } => {
                assert_eq!(name, "pip");
                assert_eq!(
                    install_command,
                    "sudo apt update && sudo apt install -y python3-pip"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(
            runner.command_lines(),
            vec![
                r#"sh -c 'command -v "$1"' sh git"#,
                r#"sh -c 'command -v "$1"' sh pip"#,
            ]
        );
    }

    #[test]
    fn dependency_name_is_passed_as_an_argument() {
        let runner = RecordingRunner::new();

        is_installed(&runner, "git; rm -rf ~").unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(calls[0].args[1], r#"command -v "$1""#);
        assert_eq!(calls[0].args[2..], ["sh", "git; rm -rf ~"]);
    }

    #[test]
    fn all_present_passes() {
        let runner = RecordingRunner::new();
        let deps = parse_dependency_list("git\ncmake\n");

        check_dependencies(&runner, &deps).unwrap();
        assert_eq!(runner.calls.borrow().len(), 2);
    }
}
