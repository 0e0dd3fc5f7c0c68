//! Injected platform facts.

use std::path::{Path, PathBuf};

/// OS family, as far as path conventions are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    MacOs,
    Linux,
}

/// Platform facts consumed during path resolution. Every fact is overridable
/// so tests can resolve paths for any OS from any host.
pub trait Platform: Send + Sync {
    fn os_family(&self) -> OsFamily;

    fn home_dir(&self) -> Option<PathBuf>;

    /// Raw process environment variable, `None` when unset or empty.
    fn env_var(&self, name: &str) -> Option<String>;

    /// Directory existence probe.
    fn is_dir(&self, path: &Path) -> bool;

    /// Delimiter for multi-path environment variables like `JUPYTER_PATH`.
    fn path_delimiter(&self) -> char {
        match self.os_family() {
            OsFamily::Windows => ';',
            _ => ':',
        }
    }
}

/// The real host platform.
pub struct HostPlatform;

impl Platform for HostPlatform {
    fn os_family(&self) -> OsFamily {
        if cfg!(windows) {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else {
            OsFamily::Linux
        }
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_platform_reports_build_target_family() {
        let family = HostPlatform.os_family();
        if cfg!(windows) {
            assert_eq!(family, OsFamily::Windows);
        } else if cfg!(target_os = "macos") {
            assert_eq!(family, OsFamily::MacOs);
        } else {
            assert_eq!(family, OsFamily::Linux);
        }
    }

    #[test]
    fn test_path_delimiter_per_family() {
        struct Fixed(OsFamily);
        impl Platform for Fixed {
            fn os_family(&self) -> OsFamily {
                self.0
            }
            fn home_dir(&self) -> Option<PathBuf> {
                None
            }
            fn env_var(&self, _name: &str) -> Option<String> {
                None
            }
            fn is_dir(&self, _path: &Path) -> bool {
                false
            }
        }
        assert_eq!(Fixed(OsFamily::Windows).path_delimiter(), ';');
        assert_eq!(Fixed(OsFamily::Linux).path_delimiter(), ':');
        assert_eq!(Fixed(OsFamily::MacOs).path_delimiter(), ':');
    }

    #[test]
    fn test_is_dir_probes_the_real_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        assert!(HostPlatform.is_dir(dir.path()));

        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        assert!(!HostPlatform.is_dir(&file));
        assert!(!HostPlatform.is_dir(&dir.path().join("missing")));
    }

    #[test]
    fn test_env_var_filters_empty_values() {
        // PATH is always set on any test host; an unset name returns None.
        assert!(HostPlatform.env_var("PATH").is_some());
        assert!(HostPlatform
            .env_var("JUPYTER_DIRS_TEST_VAR_THAT_DOES_NOT_EXIST")
            .is_none());
    }
}
