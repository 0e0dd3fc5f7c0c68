//! Ordered Jupyter search path computation.
//!
//! Precedence for data directories, highest first:
//!
//! 1. `JUPYTER_PATH` entries (platform-delimited, in listed order)
//! 2. `JUPYTER_DATA_DIR` (single path; replaces the OS default entirely)
//! 3. The OS default: `%APPDATA%\jupyter` (plus `%PROGRAMDATA%\jupyter`) on
//!    Windows, `$XDG_DATA_HOME/jupyter` or `~/.local/share/jupyter` on Linux,
//!    `~/Library/Jupyter` on macOS
//! 4. With an interpreter: the environment's own data directory (helper
//!    script probe, only when it exists on disk), then
//!    `<sys.prefix>/share/jupyter`
//!
//! Everything is de-duplicated by normalized form while preserving first-seen
//! order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kernel_env::InterpreterDetails;
use log::{debug, info};

use crate::cache::PathCache;
use crate::cancel::{CancelToken, Cancelled};
use crate::platform::{OsFamily, Platform};
use crate::script::PythonRunner;

/// Cache key for the kernel-spec root list. The version suffix doubles as the
/// validity token: bumping it invalidates every previously persisted value.
const KERNEL_SPEC_ROOTS_CACHE_KEY: &str = "kernel-spec-root-paths-v2";

/// Resolves Jupyter data and kernel-spec search directories.
pub struct JupyterPathResolver {
    platform: Arc<dyn Platform>,
    cache: Arc<dyn PathCache>,
    python: Arc<dyn PythonRunner>,
}

impl JupyterPathResolver {
    pub fn new(
        platform: Arc<dyn Platform>,
        cache: Arc<dyn PathCache>,
        python: Arc<dyn PythonRunner>,
    ) -> Self {
        JupyterPathResolver {
            platform,
            cache,
            python,
        }
    }

    /// Entries of a multi-path environment variable, in listed order.
    fn env_paths(&self, name: &str) -> Vec<PathBuf> {
        match self.platform.env_var(name) {
            Some(value) => value
                .split(self.platform.path_delimiter())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect(),
            None => Vec::new(),
        }
    }

    /// The OS-default roaming Jupyter data directory, when derivable.
    fn roaming_data_dir(&self) -> Option<PathBuf> {
        match self.platform.os_family() {
            OsFamily::Windows => match self.platform.env_var("APPDATA") {
                Some(appdata) => Some(PathBuf::from(appdata).join("jupyter")),
                None => self
                    .platform
                    .home_dir()
                    .map(|home| home.join(".jupyter").join("data")),
            },
            OsFamily::Linux => match self.platform.env_var("XDG_DATA_HOME") {
                Some(xdg) => Some(PathBuf::from(xdg).join("jupyter")),
                None => self
                    .platform
                    .home_dir()
                    .map(|home| home.join(".local").join("share").join("jupyter")),
            },
            OsFamily::MacOs => self
                .platform
                .home_dir()
                .map(|home| home.join("Library").join("Jupyter")),
        }
    }

    /// OS-default data directories (roaming plus the Windows system-wide
    /// entry), used when `JUPYTER_DATA_DIR` is not set.
    fn default_data_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(roaming) = self.roaming_data_dir() {
            dirs.push(roaming);
        }
        if self.platform.os_family() == OsFamily::Windows {
            if let Some(programdata) = self.platform.env_var("PROGRAMDATA") {
                dirs.push(PathBuf::from(programdata).join("jupyter"));
            }
        }
        dirs
    }

    /// Ordered Jupyter data directories for an optional interpreter.
    pub async fn data_dirs(&self, interpreter: Option<&InterpreterDetails>) -> Vec<PathBuf> {
        let mut dirs = self.env_paths("JUPYTER_PATH");

        match self.platform.env_var("JUPYTER_DATA_DIR") {
            Some(data_dir) => dirs.push(PathBuf::from(data_dir)),
            None => dirs.extend(self.default_data_dirs()),
        }

        if let Some(interpreter) = interpreter {
            // The environment's own data dir sits immediately before the
            // sysprefix entry, and only counts when it exists on disk.
            if let Some(env_dir) = self.python.env_data_dir(interpreter).await {
                if self.platform.is_dir(&env_dir) {
                    dirs.push(env_dir);
                } else {
                    debug!(
                        "ignoring missing env data dir {} for {}",
                        env_dir.display(),
                        interpreter.uri.display()
                    );
                }
            }
            dirs.push(interpreter.sys_prefix.join("share").join("jupyter"));
        }

        self.dedup(dirs)
    }

    /// Ordered kernel-spec root directories, consulting and refreshing the
    /// persisted cache. Safe to call repeatedly; the cache only changes the
    /// cost of the answer, not the answer.
    pub async fn kernel_spec_root_paths(
        &self,
        cancel: &CancelToken,
    ) -> Result<Vec<PathBuf>, Cancelled> {
        cancel.check()?;
        if let Some(cached) = self.cache.get(KERNEL_SPEC_ROOTS_CACHE_KEY).await {
            debug!("kernel spec roots served from cache ({} entries)", cached.len());
            return Ok(cached);
        }
        cancel.check()?;

        let mut roots: Vec<PathBuf> = self
            .env_paths("JUPYTER_PATH")
            .into_iter()
            .map(|p| p.join("kernels"))
            .collect();

        if let Some(roaming) = self.roaming_data_dir() {
            roots.push(roaming.join("kernels"));
        }

        if self.platform.os_family() == OsFamily::Windows {
            if let Some(system) = self.platform.env_var("ALLUSERSPROFILE") {
                roots.push(PathBuf::from(system).join("jupyter").join("kernels"));
            }
        }

        let roots = self.dedup(roots);

        cancel.check()?;
        self.cache
            .update(KERNEL_SPEC_ROOTS_CACHE_KEY, roots.clone())
            .await;
        info!("resolved {} kernel spec roots", roots.len());
        Ok(roots)
    }

    /// De-duplicate by normalized absolute form, preserving first-seen order.
    fn dedup(&self, paths: Vec<PathBuf>) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for path in paths {
            let normalized = normalize(&path);
            let key = if self.platform.os_family() == OsFamily::Windows {
                normalized.to_string_lossy().to_lowercase()
            } else {
                normalized.to_string_lossy().into_owned()
            };
            if seen.insert(key) {
                out.push(normalized);
            }
        }
        out
    }
}

/// Collapse `.` components and redundant separators without touching the
/// filesystem.
fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryPathCache;
    use async_trait::async_trait;
    use kernel_env::PythonEnvironmentKind;
    use std::collections::HashMap;

    struct FakePlatform {
        family: OsFamily,
        home: Option<PathBuf>,
        vars: HashMap<String, String>,
        existing_dirs: Vec<PathBuf>,
    }

    impl FakePlatform {
        fn new(family: OsFamily) -> Self {
            FakePlatform {
                family,
                home: Some(PathBuf::from("/home/me")),
                vars: HashMap::new(),
                existing_dirs: Vec::new(),
            }
        }

        fn var(mut self, name: &str, value: &str) -> Self {
            self.vars.insert(name.to_string(), value.to_string());
            self
        }

        fn dir_exists(mut self, path: &str) -> Self {
            self.existing_dirs.push(PathBuf::from(path));
            self
        }
    }

    impl Platform for FakePlatform {
        fn os_family(&self) -> OsFamily {
            self.family
        }
        fn home_dir(&self) -> Option<PathBuf> {
            self.home.clone()
        }
        fn env_var(&self, name: &str) -> Option<String> {
            self.vars.get(name).cloned()
        }
        fn is_dir(&self, path: &Path) -> bool {
            self.existing_dirs.iter().any(|d| d == path)
        }
    }

    struct FakeRunner {
        reported: Option<PathBuf>,
    }

    #[async_trait]
    impl PythonRunner for FakeRunner {
        async fn env_data_dir(&self, _interpreter: &InterpreterDetails) -> Option<PathBuf> {
            self.reported.clone()
        }
    }

    fn resolver(platform: FakePlatform, runner: FakeRunner) -> JupyterPathResolver {
        JupyterPathResolver::new(
            Arc::new(platform),
            Arc::new(MemoryPathCache::new()),
            Arc::new(runner),
        )
    }

    fn resolver_with_cache(
        platform: FakePlatform,
        cache: Arc<MemoryPathCache>,
    ) -> JupyterPathResolver {
        JupyterPathResolver::new(Arc::new(platform), cache, Arc::new(FakeRunner { reported: None }))
    }

    fn interpreter() -> InterpreterDetails {
        InterpreterDetails {
            uri: PathBuf::from("/envs/demo/bin/python"),
            kind: PythonEnvironmentKind::Conda,
            sys_prefix: PathBuf::from("/envs/demo"),
        }
    }

    #[tokio::test]
    async fn test_linux_default_uses_xdg_data_home() {
        let platform = FakePlatform::new(OsFamily::Linux).var("XDG_DATA_HOME", "/xdg");
        let dirs = resolver(platform, FakeRunner { reported: None })
            .data_dirs(None)
            .await;
        assert_eq!(dirs, vec![PathBuf::from("/xdg/jupyter")]);
    }

    #[tokio::test]
    async fn test_linux_default_falls_back_to_home() {
        let platform = FakePlatform::new(OsFamily::Linux);
        let dirs = resolver(platform, FakeRunner { reported: None })
            .data_dirs(None)
            .await;
        assert_eq!(dirs, vec![PathBuf::from("/home/me/.local/share/jupyter")]);
    }

    #[tokio::test]
    async fn test_macos_default_is_library_jupyter() {
        let platform = FakePlatform::new(OsFamily::MacOs);
        let dirs = resolver(platform, FakeRunner { reported: None })
            .data_dirs(None)
            .await;
        assert_eq!(dirs, vec![PathBuf::from("/home/me/Library/Jupyter")]);
    }

    #[tokio::test]
    async fn test_windows_defaults_include_appdata_and_programdata() {
        let platform = FakePlatform::new(OsFamily::Windows)
            .var("APPDATA", "/appdata")
            .var("PROGRAMDATA", "/programdata");
        let dirs = resolver(platform, FakeRunner { reported: None })
            .data_dirs(None)
            .await;
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/appdata/jupyter"),
                PathBuf::from("/programdata/jupyter")
            ]
        );
    }

    #[tokio::test]
    async fn test_windows_without_appdata_uses_home_fallback() {
        let platform = FakePlatform::new(OsFamily::Windows);
        let dirs = resolver(platform, FakeRunner { reported: None })
            .data_dirs(None)
            .await;
        assert_eq!(dirs, vec![PathBuf::from("/home/me/.jupyter/data")]);
    }

    #[tokio::test]
    async fn test_jupyter_path_entries_come_first_in_listed_order() {
        let platform = FakePlatform::new(OsFamily::Linux)
            .var("JUPYTER_PATH", "/first:/second")
            .var("XDG_DATA_HOME", "/xdg");
        let dirs = resolver(platform, FakeRunner { reported: None })
            .data_dirs(None)
            .await;
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/first"),
                PathBuf::from("/second"),
                PathBuf::from("/xdg/jupyter")
            ]
        );
    }

    #[tokio::test]
    async fn test_data_dir_override_skips_os_default() {
        let platform = FakePlatform::new(OsFamily::Linux)
            .var("JUPYTER_DATA_DIR", "/override")
            .var("XDG_DATA_HOME", "/xdg");
        let dirs = resolver(platform, FakeRunner { reported: None })
            .data_dirs(None)
            .await;
        assert_eq!(dirs, vec![PathBuf::from("/override")]);
    }

    #[tokio::test]
    async fn test_interpreter_appends_sysprefix_entry() {
        let platform = FakePlatform::new(OsFamily::Linux).var("XDG_DATA_HOME", "/xdg");
        let dirs = resolver(platform, FakeRunner { reported: None })
            .data_dirs(Some(&interpreter()))
            .await;
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/xdg/jupyter"),
                PathBuf::from("/envs/demo/share/jupyter")
            ]
        );
    }

    #[tokio::test]
    async fn test_env_data_dir_inserted_before_sysprefix_when_it_exists() {
        let platform = FakePlatform::new(OsFamily::Linux)
            .var("XDG_DATA_HOME", "/xdg")
            .dir_exists("/envs/demo/etc/jupyter-data");
        let runner = FakeRunner {
            reported: Some(PathBuf::from("/envs/demo/etc/jupyter-data")),
        };
        let dirs = resolver(platform, runner).data_dirs(Some(&interpreter())).await;
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/xdg/jupyter"),
                PathBuf::from("/envs/demo/etc/jupyter-data"),
                PathBuf::from("/envs/demo/share/jupyter")
            ]
        );
    }

    #[tokio::test]
    async fn test_env_data_dir_skipped_when_missing_on_disk() {
        let platform = FakePlatform::new(OsFamily::Linux).var("XDG_DATA_HOME", "/xdg");
        let runner = FakeRunner {
            reported: Some(PathBuf::from("/envs/demo/etc/jupyter-data")),
        };
        let dirs = resolver(platform, runner).data_dirs(Some(&interpreter())).await;
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/xdg/jupyter"),
                PathBuf::from("/envs/demo/share/jupyter")
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicates_keep_first_seen_position() {
        let platform = FakePlatform::new(OsFamily::Linux)
            .var("JUPYTER_PATH", "/xdg/jupyter:/extra")
            .var("XDG_DATA_HOME", "/xdg");
        let dirs = resolver(platform, FakeRunner { reported: None })
            .data_dirs(None)
            .await;
        assert_eq!(dirs, vec![PathBuf::from("/xdg/jupyter"), PathBuf::from("/extra")]);
    }

    #[tokio::test]
    async fn test_dot_components_are_normalized_for_dedup() {
        let platform = FakePlatform::new(OsFamily::Linux)
            .var("JUPYTER_PATH", "/xdg/./jupyter")
            .var("XDG_DATA_HOME", "/xdg");
        let dirs = resolver(platform, FakeRunner { reported: None })
            .data_dirs(None)
            .await;
        assert_eq!(dirs, vec![PathBuf::from("/xdg/jupyter")]);
    }

    #[tokio::test]
    async fn test_kernel_spec_roots_computed_and_written_back() {
        let cache = Arc::new(MemoryPathCache::new());
        let platform = FakePlatform::new(OsFamily::Linux)
            .var("JUPYTER_PATH", "/first")
            .var("XDG_DATA_HOME", "/xdg");
        let resolver = resolver_with_cache(platform, cache.clone());

        let roots = resolver
            .kernel_spec_root_paths(&CancelToken::new())
            .await
            .unwrap();
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/first/kernels"),
                PathBuf::from("/xdg/jupyter/kernels")
            ]
        );
        assert_eq!(
            cache.get("kernel-spec-root-paths-v2").await.unwrap(),
            roots
        );
    }

    #[tokio::test]
    async fn test_kernel_spec_roots_served_from_cache() {
        let cache = Arc::new(MemoryPathCache::new());
        cache
            .update("kernel-spec-root-paths-v2", vec![PathBuf::from("/cached")])
            .await;
        let platform = FakePlatform::new(OsFamily::Linux).var("XDG_DATA_HOME", "/xdg");
        let resolver = resolver_with_cache(platform, cache);

        let roots = resolver
            .kernel_spec_root_paths(&CancelToken::new())
            .await
            .unwrap();
        assert_eq!(roots, vec![PathBuf::from("/cached")]);
    }

    #[tokio::test]
    async fn test_windows_kernel_spec_roots_include_system_dir() {
        let cache = Arc::new(MemoryPathCache::new());
        let platform = FakePlatform::new(OsFamily::Windows)
            .var("APPDATA", "/appdata")
            .var("ALLUSERSPROFILE", "/allusers");
        let resolver = resolver_with_cache(platform, cache);

        let roots = resolver
            .kernel_spec_root_paths(&CancelToken::new())
            .await
            .unwrap();
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/appdata/jupyter/kernels"),
                PathBuf::from("/allusers/jupyter/kernels")
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_resolution() {
        let platform = FakePlatform::new(OsFamily::Linux).var("XDG_DATA_HOME", "/xdg");
        let resolver = resolver(platform, FakeRunner { reported: None });
        let token = CancelToken::new();
        token.cancel();
        assert!(resolver.kernel_spec_root_paths(&token).await.is_err());
    }
}
