use std::path::PathBuf;

use directories::{BaseDirs, ProjectDirs};
use tracing::warn;

/// Per-user data directory for `app_name` (falls back to `/tmp/<app_name>` if
/// the platform has no resolvable home directory, e.g. a stripped-down
/// container).
pub fn local_share_dir<S: AsRef<str>>(app_name: S) -> PathBuf {
    let Some(base_dirs) = BaseDirs::new() else {
        warn!("couldn't find basedirs, storing data in /tmp/<app_name>");
        return PathBuf::from(format!("/tmp/{}", app_name.as_ref()));
    };
    base_dirs.data_dir().join(app_name.as_ref())
}

pub fn logs_dir<S: AsRef<str>>(app_name: S) -> PathBuf {
    local_share_dir(app_name).join("logs")
}

/// User-scope configuration directory, e.g. `APPDATA/<app_name>` on Windows
/// or `~/.config/<app_name>` on Linux. This is the third entry in the
/// supervisor's configuration search path.
pub fn user_config_dir<S: AsRef<str>>(app_name: S) -> Option<PathBuf> {
    ProjectDirs::from("", "", app_name.as_ref()).map(|p| p.config_dir().to_path_buf())
}
