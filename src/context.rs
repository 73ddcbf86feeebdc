use crate::{
    config::{Config, InstallPaths},
    device::PermissionSnapshot,
    error::Step,
    interrupt::Interrupt,
    process::{Invocation, ProcessOutput, Runner},
    Error,
};

/// State shared by every provisioning step
///
/// The context is owned by a [CleanupGuard](crate::cleanup::CleanupGuard)
/// for the duration of a run, which reads the permission snapshot back when
/// the run ends.
pub struct Context {
    pub config: Config,
    pub paths: InstallPaths,
    /// Original device permissions, captured the first time they are raised
    pub snapshot: PermissionSnapshot,
    runner: Box<dyn Runner>,
    interrupt: Interrupt,
}

impl Context {
    pub fn new(
        config: Config,
        paths: InstallPaths,
        runner: Box<dyn Runner>,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            config,
            paths,
            snapshot: PermissionSnapshot::default(),
            runner,
            interrupt,
        }
    }

    pub fn runner(&self) -> &dyn Runner {
        self.runner.as_ref()
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn checkpoint(&self) -> Result<(), Error> {
        self.interrupt.checkpoint()
    }

    /// Run an invocation, failing with `step` on a non-zero exit
    pub fn run(&self, invocation: &Invocation, step: Step) -> Result<ProcessOutput, Error> {
        self.checkpoint()?;
        let output = self.runner.run(invocation, step)?;

        // A child killed by Ctrl-C exits with an error of its own; report the
        // interrupt rather than the step.
        self.checkpoint()?;

        output.check(step)
    }
}
