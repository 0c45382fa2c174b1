// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that rooomy reads
//! or writes on behalf of the user.

use std::path::PathBuf;

/// Determine default absolute path to presets file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/rooomy/presets.toml` as the
/// default absolute path for the presets file. Does not check if the path
/// returned actually exists.
///
/// # Errors
///
/// - Return [`NoConfigDir`] if configuration directory cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_presets_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("rooomy").join("presets.toml"))
        .ok_or(NoConfigDir)
}

/// No way to determine user's configuration directory.
///
/// # See Also
///
/// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's configuration directory")]
pub struct NoConfigDir;

/// Friendly result alias :3
pub type Result<T, E = NoConfigDir> = std::result::Result<T, E>;
