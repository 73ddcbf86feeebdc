use crate::{context::Context, error::Step, process::Invocation, Error};

/// Write the built firmware to the board with `idf.py flash`
pub fn flash(ctx: &Context) -> Result<(), Error> {
    let command = format!("idf.py -p {} flash", ctx.config.device.path.display());
    let flash =
        Invocation::sourced(&ctx.paths.export_script(), &command).current_dir(&ctx.paths.firmware);
    ctx.run(&flash, Step::Flash)?;

    Ok(())
}
