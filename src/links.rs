//! Resolving `Link` aliases once every named zone has been written.
//!
//! A link can be satisfied two ways: re-running the emitter under the
//! alias name (always correct, costs one more pass over the transition
//! pipeline, handled by the driver since it needs the parsed `Table`),
//! or creating a relative symlink to the target's already written file
//! (cheap, but only sensible when the alias name itself looks like a
//! zone path, i.e. contains a `/`). [`LinkStrategy`] names the choice;
//! this module only implements the `Alias` half, since `ReEmit` needs
//! access to the table and is driven from `main`.

use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// How a `Link` line should be satisfied; selected once for the whole
/// run via `Config::link_strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStrategy {
    ReEmit,
    Alias,
}

/// Resolves one link given the `from`/`to` zone names and the output
/// root by creating a relative symlink. A `to` with no `/` is silently
/// skipped (it names a bare alias this tool has no directory convention
/// for).
pub fn resolve_link(from: &str, to: &str, output_dir: &Path) -> Result<(), Error> {
    if !to.contains('/') {
        return Ok(());
    }

    let from_path = zone_path(output_dir, from);
    let to_path = zone_path(output_dir, to);

    if let Some(parent) = to_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let relative_target = relative_symlink_target(&from_path, &to_path);

    if to_path.symlink_metadata().is_ok() {
        std::fs::remove_file(&to_path)?;
    }
    symlink(relative_target, &to_path)?;
    Ok(())
}

fn zone_path(output_dir: &Path, zone_name: &str) -> PathBuf {
    let mut path = output_dir.to_path_buf();
    for component in zone_name.split('/') {
        path.push(component);
    }
    path.set_extension("ics");
    path
}

/// Computes the `../`-relative path from `to_path`'s directory to
/// `from_path`, so the symlink still resolves if the output tree is
/// moved as a whole.
fn relative_symlink_target(from_path: &Path, to_path: &Path) -> PathBuf {
    let base_components: Vec<_> = to_path.parent().unwrap_or(Path::new("")).components().collect();
    let from_components: Vec<_> = from_path.components().collect();

    let common = from_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut target = PathBuf::new();
    for _ in common..base_components.len() {
        target.push("..");
    }
    for component in &from_components[common..] {
        target.push(component.as_os_str());
    }
    target
}
