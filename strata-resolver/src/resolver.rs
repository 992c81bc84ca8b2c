// Module resolver: two-tier driver lookup
//
// 1. Known capability with a direct action -> host library search
// 2. Anything else, or a failed direct load -> fallback driver root
// Only `ResolveError::UnresolvedCapability` ever reaches the caller.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::capability::CapabilityName;
use crate::loader::{library_file_name, library_stem, DylibLoader, LoadError, Loader};
use crate::platform::Platform;
use crate::table::{ResolutionAction, ResolutionTable};

/// Overrides the working-directory driver root when set
pub const DRIVER_ROOT_ENV: &str = "STRATA_DRIVER_ROOT";

/// Driver root directory name, relative to the working directory
pub const DEFAULT_DRIVER_DIR: &str = "drivers";

/// Directory searched when the direct load is unavailable or fails
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FallbackRoot {
    /// `$STRATA_DRIVER_ROOT`, else `<cwd>/drivers`; evaluated on every call
    #[default]
    WorkingDirectory,
    Fixed(PathBuf),
}

impl FallbackRoot {
    pub fn path(&self) -> Result<PathBuf, LoadError> {
        match self {
            FallbackRoot::Fixed(path) => Ok(path.clone()),
            FallbackRoot::WorkingDirectory => {
                working_directory_root(std::env::var_os(DRIVER_ROOT_ENV), std::env::current_dir())
            }
        }
    }
}

/// `STRATA_DRIVER_ROOT` wins when non-empty, else `<cwd>/drivers`.
/// The only place the variable is interpreted.
fn working_directory_root(
    override_root: Option<OsString>,
    cwd: io::Result<PathBuf>,
) -> Result<PathBuf, LoadError> {
    if let Some(root) = override_root.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    let cwd = cwd.map_err(|e| LoadError::RootUnavailable {
        message: e.to_string(),
    })?;
    Ok(cwd.join(DEFAULT_DRIVER_DIR))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Direct,
    Fallback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Direct => write!(f, "direct"),
            Stage::Fallback => write!(f, "fallback"),
        }
    }
}

/// A load that was tried and failed on the way to an unresolved capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub stage: Stage,
    pub error: LoadError,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unresolved capability '{name}': no driver could be loaded ({} attempt(s))", .attempts.len())]
    UnresolvedCapability { name: String, attempts: Vec<Attempt> },
}

impl ResolveError {
    /// Requested capability name
    pub fn name(&self) -> &str {
        match self {
            ResolveError::UnresolvedCapability { name, .. } => name,
        }
    }

    /// Failed loads, in the order they were tried
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            ResolveError::UnresolvedCapability { attempts, .. } => attempts,
        }
    }
}

/// What `resolve` would try for a name, without loading anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPlan {
    pub name: CapabilityName,
    /// Table entry for the name, if it is a known capability
    pub action: Option<ResolutionAction>,
    /// Library file name tried through the host search
    pub direct: Option<String>,
    /// Fallback root, or why it cannot be searched
    pub root: Result<PathBuf, LoadError>,
    /// Fallback files in priority order
    pub candidates: Vec<PathBuf>,
}

/// Resolves capability names to freshly loaded driver handles.
///
/// Holds only read-only state, so one resolver can serve any number of
/// threads. Nothing is cached: each call loads again.
#[derive(Debug, Clone)]
pub struct ModuleResolver<L = DylibLoader> {
    table: Arc<ResolutionTable>,
    fallback_root: FallbackRoot,
    platform: Platform,
    loader: L,
}

impl ModuleResolver<DylibLoader> {
    /// Resolver over the known table, the working-directory root and the
    /// host's dynamic linker
    pub fn new() -> Self {
        Self::with_loader(DylibLoader::new())
    }
}

impl Default for ModuleResolver<DylibLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Loader> ModuleResolver<L> {
    pub fn with_loader(loader: L) -> Self {
        Self {
            table: ResolutionTable::known(),
            fallback_root: FallbackRoot::default(),
            platform: Platform::detect(),
            loader,
        }
    }

    pub fn with_table(mut self, table: Arc<ResolutionTable>) -> Self {
        self.table = table;
        self
    }

    pub fn with_fallback_root(mut self, root: FallbackRoot) -> Self {
        self.fallback_root = root;
        self
    }

    /// Platform used for platform-specific fallback directories
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn table(&self) -> &ResolutionTable {
        &self.table
    }

    pub fn fallback_root(&self) -> &FallbackRoot {
        &self.fallback_root
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Resolve `name` to a new handle.
    ///
    /// # Errors
    /// `ResolveError::UnresolvedCapability` when neither the direct load nor
    /// the fallback root produced a driver (blank names included).
    pub fn resolve(&self, name: &str) -> Result<L::Handle, ResolveError> {
        let capability = CapabilityName::new(name).map_err(|_| unresolved(name, Vec::new()))?;
        self.resolve_capability(&capability)
    }

    pub fn resolve_capability(&self, name: &CapabilityName) -> Result<L::Handle, ResolveError> {
        let mut attempts = Vec::new();

        if let Some(file_name) = self.direct_target(name) {
            log::trace!("resolving '{}' through host library {}", name, file_name);
            match self.loader.load_library(name, &file_name) {
                Ok(handle) => return Ok(handle),
                Err(error) => {
                    log::debug!(
                        "direct load of '{}' failed, trying driver root: {}",
                        name,
                        error
                    );
                    attempts.push(Attempt {
                        stage: Stage::Direct,
                        error,
                    });
                }
            }
        }

        match self.fallback_candidates(name) {
            Ok((root, candidates)) => {
                let mut found = false;
                for candidate in candidates.iter().filter(|path| path.is_file()) {
                    found = true;
                    log::trace!("resolving '{}' from {}", name, candidate.display());
                    match self.loader.load_path(name, candidate) {
                        Ok(handle) => return Ok(handle),
                        Err(error) => attempts.push(Attempt {
                            stage: Stage::Fallback,
                            error,
                        }),
                    }
                }
                if !found {
                    attempts.push(Attempt {
                        stage: Stage::Fallback,
                        error: LoadError::NotFound {
                            root: root.display().to_string(),
                        },
                    });
                }
            }
            Err(error) => attempts.push(Attempt {
                stage: Stage::Fallback,
                error,
            }),
        }

        Err(unresolved(name.as_str(), attempts))
    }

    /// Describe the resolution steps for `name` without loading
    pub fn plan(&self, name: &str) -> Result<ResolutionPlan, ResolveError> {
        let capability = CapabilityName::new(name).map_err(|_| unresolved(name, Vec::new()))?;
        let action = self.table.get(capability.as_str()).cloned();
        let direct = self.direct_target(&capability);

        let (root, candidates) = match self.fallback_candidates(&capability) {
            Ok((root, candidates)) => (Ok(root), candidates),
            Err(error) => (Err(error), Vec::new()),
        };

        Ok(ResolutionPlan {
            name: capability,
            action,
            direct,
            root,
            candidates,
        })
    }

    fn direct_target(&self, name: &CapabilityName) -> Option<String> {
        self.table
            .get(name.as_str())
            .and_then(ResolutionAction::library)
            .map(library_file_name)
    }

    /// Candidate files under the capability's own directory, most specific
    /// first:
    ///
    /// 1. `<root>/<name>/<os>-<arch>/<lib>`
    /// 2. `<root>/<name>/<os>/<lib>`
    /// 3. `<root>/<name>/<lib>`
    ///
    /// `<lib>` is derived from a lossy stem, so it is never looked up outside
    /// `<root>/<name>`: distinct names must not share a file.
    fn fallback_candidates(
        &self,
        name: &CapabilityName,
    ) -> Result<(PathBuf, Vec<PathBuf>), LoadError> {
        let root = self.fallback_root.path()?;
        let relative = Path::new(name.as_str());

        let stays_inside = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !stays_inside {
            return Err(LoadError::OutsideRoot {
                name: name.to_string(),
                root: root.display().to_string(),
            });
        }

        let file_name = library_file_name(&library_stem(name.as_str()));
        let package_dir = root.join(relative);

        let candidates = vec![
            package_dir
                .join(self.platform.to_target_string())
                .join(&file_name),
            package_dir.join(&self.platform.os).join(&file_name),
            package_dir.join(&file_name),
        ];

        Ok((root, candidates))
    }
}

fn unresolved(name: &str, attempts: Vec<Attempt>) -> ResolveError {
    ResolveError::UnresolvedCapability {
        name: name.to_string(),
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableEntry;

    /// Loader that never finds anything
    struct Nothing;

    impl Loader for Nothing {
        type Handle = ();

        fn load_library(&self, _: &CapabilityName, file_name: &str) -> Result<(), LoadError> {
            Err(LoadError::Open {
                target: file_name.to_string(),
                message: "not installed".to_string(),
            })
        }

        fn load_path(&self, _: &CapabilityName, path: &Path) -> Result<(), LoadError> {
            Err(LoadError::Open {
                target: path.display().to_string(),
                message: "corrupt".to_string(),
            })
        }
    }

    fn linux_resolver(root: &Path) -> ModuleResolver<Nothing> {
        ModuleResolver::with_loader(Nothing)
            .with_fallback_root(FallbackRoot::Fixed(root.to_path_buf()))
            .with_platform(Platform::new("linux", "x64"))
    }

    #[test]
    fn test_plan_for_known_capability() {
        let resolver = linux_resolver(Path::new("/srv/drivers"));
        let plan = resolver.plan("pg").unwrap();
        let lib = library_file_name("strata_pg");

        assert_eq!(plan.action, Some(ResolutionAction::direct("strata_pg")));
        assert_eq!(plan.direct.as_deref(), Some(lib.as_str()));
        assert_eq!(plan.root, Ok(PathBuf::from("/srv/drivers")));
        assert_eq!(
            plan.candidates,
            vec![
                PathBuf::from("/srv/drivers/pg/linux-x64").join(&lib),
                PathBuf::from("/srv/drivers/pg/linux").join(&lib),
                PathBuf::from("/srv/drivers/pg").join(&lib),
            ]
        );
    }

    #[test]
    fn test_plan_for_unknown_capability_has_no_direct_step() {
        let resolver = linux_resolver(Path::new("/srv/drivers"));
        let plan = resolver.plan("acme-db").unwrap();
        assert_eq!(plan.action, None);
        assert_eq!(plan.direct, None);
        assert_eq!(plan.candidates.len(), 3);
    }

    #[test]
    fn test_fallback_only_entry_skips_direct_step() {
        let resolver = linux_resolver(Path::new("/srv/drivers"));
        let plan = resolver.plan("sql.js").unwrap();
        assert_eq!(plan.action, Some(ResolutionAction::FallbackOnly));
        assert_eq!(plan.direct, None);
    }

    #[test]
    fn test_scoped_names_nest_under_root() {
        let resolver = linux_resolver(Path::new("/srv/drivers"));
        let plan = resolver.plan("@sap/hana-client").unwrap();
        let lib = library_file_name("strata_sap_hana_client");
        assert_eq!(
            plan.candidates.get(2),
            Some(&PathBuf::from("/srv/drivers/@sap/hana-client").join(lib))
        );
    }

    #[test]
    fn test_traversal_names_are_rejected() {
        let resolver = linux_resolver(Path::new("/srv/drivers"));
        let plan = resolver.plan("../etc").unwrap();
        assert!(matches!(plan.root, Err(LoadError::OutsideRoot { .. })));
        assert!(plan.candidates.is_empty());

        let err = resolver.resolve("../etc").unwrap_err();
        assert_eq!(err.name(), "../etc");
        assert!(matches!(
            err.attempts(),
            [Attempt {
                stage: Stage::Fallback,
                error: LoadError::OutsideRoot { .. }
            }]
        ));
    }

    #[test]
    fn test_blank_name_is_unresolved() {
        let resolver = linux_resolver(Path::new("/srv/drivers"));
        let err = resolver.resolve("").unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnresolvedCapability {
                name: String::new(),
                attempts: Vec::new()
            }
        );
        assert!(resolver.plan("  ").is_err());
    }

    #[test]
    fn test_direct_failure_is_recorded_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = linux_resolver(dir.path());

        let err = resolver.resolve("mysql2").unwrap_err();
        let stages: Vec<Stage> = err.attempts().iter().map(|a| a.stage).collect();
        assert_eq!(stages, vec![Stage::Direct, Stage::Fallback]);
        assert!(matches!(
            err.attempts().get(1),
            Some(Attempt {
                error: LoadError::NotFound { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_custom_table() {
        let table = ResolutionTable::from_entries([TableEntry::known(
            "acme",
            ResolutionAction::direct("acme_driver"),
        )])
        .unwrap();
        let resolver =
            linux_resolver(Path::new("/srv/drivers")).with_table(Arc::new(table));

        assert!(resolver.table().contains("acme"));
        assert!(!resolver.table().contains("pg"));
        let plan = resolver.plan("pg").unwrap();
        assert_eq!(plan.direct, None);
    }

    #[test]
    fn test_candidates_never_leave_capability_directory() {
        let resolver = linux_resolver(Path::new("/srv/drivers"));
        for name in ["my.db", "MY_DB", "日本"] {
            let plan = resolver.plan(name).unwrap();
            let own_dir = Path::new("/srv/drivers").join(name);
            assert!(
                plan.candidates.iter().all(|c| c.starts_with(&own_dir)),
                "{}: {:?}",
                name,
                plan.candidates
            );
        }
    }

    #[test]
    fn test_driver_root_variable_overrides_cwd() {
        let root = working_directory_root(
            Some(OsString::from("/opt/strata/drivers")),
            Ok(PathBuf::from("/srv/app")),
        );
        assert_eq!(root, Ok(PathBuf::from("/opt/strata/drivers")));
    }

    #[test]
    fn test_empty_driver_root_variable_uses_cwd() {
        let cwd = || Ok(PathBuf::from("/srv/app"));
        let expected = Ok(PathBuf::from("/srv/app/drivers"));
        assert_eq!(working_directory_root(Some(OsString::new()), cwd()), expected);
        assert_eq!(working_directory_root(None, cwd()), expected);
    }

    #[test]
    fn test_unreadable_cwd_makes_root_unavailable() {
        let cwd = Err(io::Error::new(io::ErrorKind::NotFound, "cwd removed"));
        assert!(matches!(
            working_directory_root(None, cwd),
            Err(LoadError::RootUnavailable { .. })
        ));
    }

    #[test]
    fn test_error_message_names_capability() {
        let err = unresolved("totally-unknown-name", Vec::new());
        assert_eq!(
            err.to_string(),
            "unresolved capability 'totally-unknown-name': no driver could be loaded (0 attempt(s))"
        );
    }
}
