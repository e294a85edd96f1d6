//! Shell scripts rendered from the `templates/` directory.

#[cfg(any(unix, target_os = "redox"))]
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use lazy_static::lazy_static;
use serde::Serialize;
use tera::{Context, Tera};

use crate::error::Result;

pub(crate) const TEMPLATES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");

const RUN_SCRIPT: &str = "simulate.sh";

lazy_static! {
    static ref SCRIPTS: Tera = Tera::new(&format!("{TEMPLATES_PATH}/*.sh"))
        .unwrap_or_else(|e| panic!("failed to load script templates from {TEMPLATES_PATH}: {e}"));
}

/// Values substituted into the run script.
#[derive(Debug, Copy, Clone, Serialize)]
pub(crate) struct RunScriptContext<'a> {
    /// Directory the simulator is started in.
    pub(crate) work_dir: &'a Path,
    /// Receives both stdout and stderr of the simulator.
    pub(crate) log_path: &'a Path,
    /// Sourced before the simulator starts, if present.
    pub(crate) bashrc: Option<&'a Path>,
    pub(crate) command: &'a str,
}

pub(crate) fn render_run_script(ctx: RunScriptContext) -> Result<String> {
    Ok(SCRIPTS.render(RUN_SCRIPT, &Context::from_serialize(ctx)?)?)
}

/// Writes the run script to `path` and marks it executable by its owner.
pub(crate) fn write_run_script(ctx: RunScriptContext, path: &Path) -> Result<()> {
    std::fs::write(path, render_run_script(ctx)?)?;

    #[allow(unused_mut)]
    let mut perms = std::fs::metadata(path)?.permissions();
    #[cfg(any(unix, target_os = "redox"))]
    perms.set_mode(0o744);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}
