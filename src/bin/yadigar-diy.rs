use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use log::{debug, LevelFilter};
use yadigar_diy::{
    cli::{print_banner, TerminalOperator},
    config::ci_requested,
    interrupt::Interrupt,
    logging::initialize_logger,
    process::SystemRunner,
    provision,
    remote::HttpRemote,
    Config, Context, Error, InstallPaths, Options,
};

#[derive(Debug, Parser)]
#[clap(about, version)]
struct Cli {
    /// Configuration file to load instead of `yadigar-diy.toml`
    #[clap(long)]
    config: Option<PathBuf>,

    /// Directory to install into [default: ~/Downloads/diy_yadigar]
    #[clap(long)]
    work_dir: Option<PathBuf>,

    /// Firmware tag to install instead of the latest release
    #[clap(long)]
    tag: Option<String>,

    /// Device special file the board is attached as
    #[clap(long)]
    device: Option<PathBuf>,

    /// Build the firmware without flashing it (implied by `CI=true`)
    #[clap(long)]
    build_only: bool,

    /// Log level
    #[clap(long, default_value = "info", env = "YADIGAR_LOG")]
    log_level: LevelFilter,
}

fn main() -> ExitCode {
    miette::set_panic_hook();

    let args = Cli::parse();
    initialize_logger(args.log_level);
    debug!("{:#?}", args);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}

fn run(args: Cli) -> Result<(), Error> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(device) = args.device {
        config.device.path = device;
    }

    let paths = match args.work_dir {
        Some(work_dir) => InstallPaths::new(work_dir),
        None => InstallPaths::from_home()?,
    };
    let options = Options {
        tag: args.tag,
        build_only: args.build_only || ci_requested(),
    };

    let interrupt = Interrupt::install()?;
    let remote = HttpRemote::new()?;

    print_banner(&config.device.name);

    let ctx = Context::new(config, paths, Box::new(SystemRunner), interrupt);
    let outcome = provision(ctx, &remote, &mut TerminalOperator, &options)?;
    debug!("{outcome:?}");

    Ok(())
}
