use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use strata_resolver::{
    library_file_name, library_stem, CapabilityName, FallbackRoot, LoadError, Loader,
    ModuleResolver, Platform, ResolveError, Stage,
};
use tempfile::TempDir;

/// Marker written into fake driver files that load successfully
const HEALTHY: &str = "strata driver";

#[derive(Debug, Clone, PartialEq, Eq)]
struct FakeDriver {
    capability: String,
    origin: String,
    serial: usize,
}

/// Host double: "system" libraries live in a map, fallback libraries are
/// real files whose content decides whether they load.
#[derive(Default)]
struct FakeHost {
    system: HashMap<String, bool>,
    loads: AtomicUsize,
}

impl FakeHost {
    fn install(mut self, stem: &str, healthy: bool) -> Self {
        self.system.insert(library_file_name(stem), healthy);
        self
    }

    fn driver(&self, capability: &CapabilityName, origin: String) -> FakeDriver {
        FakeDriver {
            capability: capability.to_string(),
            origin,
            serial: self.loads.fetch_add(1, Ordering::SeqCst),
        }
    }
}

impl Loader for FakeHost {
    type Handle = FakeDriver;

    fn load_library(
        &self,
        capability: &CapabilityName,
        file_name: &str,
    ) -> Result<FakeDriver, LoadError> {
        match self.system.get(file_name) {
            Some(true) => Ok(self.driver(capability, file_name.to_string())),
            Some(false) => Err(LoadError::Open {
                target: file_name.to_string(),
                message: "version mismatch".to_string(),
            }),
            None => Err(LoadError::Open {
                target: file_name.to_string(),
                message: "cannot open shared object file".to_string(),
            }),
        }
    }

    fn load_path(&self, capability: &CapabilityName, path: &Path) -> Result<FakeDriver, LoadError> {
        let content = fs::read_to_string(path).map_err(|e| LoadError::Open {
            target: path.display().to_string(),
            message: e.to_string(),
        })?;
        if content == HEALTHY {
            Ok(self.driver(capability, path.display().to_string()))
        } else {
            Err(LoadError::MissingEntry {
                target: path.display().to_string(),
            })
        }
    }
}

fn place_driver(root: &Path, relative_dir: &str, name: &str, content: &str) {
    let dir = root.join(relative_dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(library_file_name(&library_stem(name))), content).unwrap();
}

fn resolver(host: FakeHost, root: &TempDir) -> ModuleResolver<FakeHost> {
    ModuleResolver::with_loader(host)
        .with_fallback_root(FallbackRoot::Fixed(root.path().to_path_buf()))
        .with_platform(Platform::new("linux", "x64"))
}

#[test]
fn test_known_capability_loads_directly() {
    let root = tempfile::tempdir().unwrap();
    let resolver = resolver(FakeHost::default().install("strata_pg", true), &root);

    let handle = resolver.resolve("pg").expect("pg resolves");

    let capability = CapabilityName::new("pg").unwrap();
    let direct = resolver
        .loader()
        .load_library(&capability, &library_file_name("strata_pg"))
        .unwrap();
    assert_eq!(handle.capability, direct.capability);
    assert_eq!(handle.origin, direct.origin);
}

#[test]
fn test_unknown_capability_without_fallback_is_unresolved() {
    let root = tempfile::tempdir().unwrap();
    let resolver = resolver(FakeHost::default(), &root);

    let err = resolver.resolve("totally-unknown-name").unwrap_err();

    let ResolveError::UnresolvedCapability { name, attempts } = err;
    assert_eq!(name, "totally-unknown-name");
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].stage, Stage::Fallback);
    assert!(matches!(attempts[0].error, LoadError::NotFound { .. }));
}

#[test]
fn test_broken_direct_load_recovers_through_fallback() {
    let root = tempfile::tempdir().unwrap();
    place_driver(root.path(), "mysql2", "mysql2", HEALTHY);
    let resolver = resolver(FakeHost::default().install("strata_mysql2", false), &root);

    let handle = resolver.resolve("mysql2").expect("fallback copy is used");

    assert_eq!(handle.capability, "mysql2");
    assert!(handle.origin.starts_with(&root.path().display().to_string()));
}

#[test]
fn test_broken_direct_and_fallback_reports_both_attempts() {
    let root = tempfile::tempdir().unwrap();
    place_driver(root.path(), "mysql2", "mysql2", "truncated");
    let resolver = resolver(FakeHost::default().install("strata_mysql2", false), &root);

    let err = resolver.resolve("mysql2").unwrap_err();

    assert_eq!(err.name(), "mysql2");
    let stages: Vec<Stage> = err.attempts().iter().map(|a| a.stage).collect();
    assert_eq!(stages, vec![Stage::Direct, Stage::Fallback]);
    assert!(matches!(
        err.attempts()[1].error,
        LoadError::MissingEntry { .. }
    ));
}

#[test]
fn test_unknown_capability_found_under_root() {
    let root = tempfile::tempdir().unwrap();
    place_driver(root.path(), "acme-db", "acme-db", HEALTHY);
    let resolver = resolver(FakeHost::default(), &root);

    let handle = resolver.resolve("acme-db").unwrap();
    assert_eq!(handle.capability, "acme-db");
}

#[test]
fn test_platform_directory_wins_over_generic_copy() {
    let root = tempfile::tempdir().unwrap();
    place_driver(root.path(), "acme-db", "acme-db", HEALTHY);
    place_driver(root.path(), "acme-db/linux-x64", "acme-db", HEALTHY);
    let resolver = resolver(FakeHost::default(), &root);

    let handle = resolver.resolve("acme-db").unwrap();
    assert!(handle.origin.contains("linux-x64"), "got {}", handle.origin);
}

#[test]
fn test_broken_candidate_falls_through_to_next() {
    let root = tempfile::tempdir().unwrap();
    place_driver(root.path(), "acme-db/linux", "acme-db", "garbage");
    place_driver(root.path(), "acme-db", "acme-db", HEALTHY);
    let resolver = resolver(FakeHost::default(), &root);

    let handle = resolver.resolve("acme-db").unwrap();
    let generic = root
        .path()
        .join("acme-db")
        .join(library_file_name(&library_stem("acme-db")));
    assert_eq!(handle.origin, generic.display().to_string());
}

#[test]
fn test_similar_names_do_not_share_a_driver() {
    let root = tempfile::tempdir().unwrap();
    place_driver(root.path(), "my-db", "my-db", HEALTHY);
    // A stray copy directly in the root is never picked up either
    place_driver(root.path(), "", "my-db", HEALTHY);
    let resolver = resolver(FakeHost::default(), &root);

    assert_eq!(resolver.resolve("my-db").unwrap().capability, "my-db");
    for name in ["my.db", "MY_DB"] {
        let err = resolver.resolve(name).unwrap_err();
        assert_eq!(err.name(), name);
        assert!(matches!(
            err.attempts(),
            [attempt] if matches!(attempt.error, LoadError::NotFound { .. })
        ));
    }
}

#[test]
fn test_non_ascii_names_need_their_own_directory() {
    let root = tempfile::tempdir().unwrap();
    place_driver(root.path(), "日本", "日本", HEALTHY);
    let resolver = resolver(FakeHost::default(), &root);

    assert_eq!(resolver.resolve("日本").unwrap().capability, "日本");
    assert!(resolver.resolve("中国").is_err());
}

#[test]
fn test_resolution_is_not_cached() {
    let root = tempfile::tempdir().unwrap();
    let resolver = resolver(FakeHost::default().install("strata_pg", true), &root);

    let first = resolver.resolve("pg").unwrap();
    let second = resolver.resolve("pg").unwrap();

    assert_ne!(first.serial, second.serial);
    assert_eq!(first.capability, second.capability);
    drop(first);
    assert_eq!(second.capability, "pg");
}

#[test]
fn test_concurrent_resolution() {
    let root = tempfile::tempdir().unwrap();
    let resolver = resolver(FakeHost::default().install("strata_redis", true), &root);

    let (a, b) = std::thread::scope(|scope| {
        let first = scope.spawn(|| resolver.resolve("redis"));
        let second = scope.spawn(|| resolver.resolve("redis"));
        (first.join().unwrap(), second.join().unwrap())
    });

    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.capability, "redis");
    assert_eq!(b.capability, "redis");
    assert_ne!(a.serial, b.serial);
}

#[test]
fn test_missing_root_is_unresolved() {
    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("nope");
    let resolver = ModuleResolver::with_loader(FakeHost::default())
        .with_fallback_root(FallbackRoot::Fixed(missing));

    let err = resolver.resolve("sql.js").unwrap_err();
    assert_eq!(err.name(), "sql.js");
    assert_eq!(err.attempts().len(), 1);
}
