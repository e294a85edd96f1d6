//! DSPF parasitic netlists.

use std::path::Path;

use crate::error::{Error, Result};
use crate::profile::BackendProfile;

/// Prepares a DSPF file for inclusion in a testbench and returns the include statement.
///
/// The `DESIGN` line of the file names the extracted cell. If it matches `target`
/// up to case, every occurrence of the original name is rewritten to the
/// upper-cased target so that the parasitics bind to the testbench instance. The
/// unmodified file is kept next to it with a `.bak` suffix.
pub fn include_dspf(
    profile: &BackendProfile,
    path: impl AsRef<Path>,
    target: &str,
) -> Result<String> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => Error::SourceNotFound(path.to_path_buf()),
        _ => Error::Io(err),
    })?;

    let design = contents
        .lines()
        .find(|line| line.contains("DESIGN"))
        .and_then(|line| line.split_whitespace().last())
        .map(|name| name.replace('"', ""));

    match design {
        Some(cell) if cell.eq_ignore_ascii_case(target) => {
            let renamed = target.to_uppercase();
            if cell != renamed {
                tracing::info!("renaming DSPF top cell from {} to {}", cell, renamed);
                let mut backup = path.as_os_str().to_owned();
                backup.push(".bak");
                std::fs::copy(path, &backup)?;
                std::fs::write(path, contents.replace(&cell, &renamed))?;
            }
        }
        Some(cell) => {
            tracing::warn!("DSPF design {} does not match {}", cell, target);
        }
        None => {
            tracing::warn!("no DESIGN line found in DSPF file {:?}", path);
        }
    }

    tracing::info!("including DSPF file {:?}", path);
    Ok(format!("{} \"{}\"", profile.dspf_include_kw, path.display()))
}
