// Resolution table: known capability names and how each one is loaded

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

/// What to do when a known capability is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionAction {
    /// Load `library` (a stem such as `"strata_pg"`) through the host's
    /// library search path.
    Direct { library: Cow<'static, str> },
    /// Known capability without a direct loader; only the fallback root is
    /// searched.
    FallbackOnly,
}

impl ResolutionAction {
    pub const fn direct(library: &'static str) -> Self {
        Self::Direct {
            library: Cow::Borrowed(library),
        }
    }

    /// Library stem loaded directly, if any
    pub fn library(&self) -> Option<&str> {
        match self {
            Self::Direct { library } => Some(library.as_ref()),
            Self::FallbackOnly => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub name: Cow<'static, str>,
    pub action: ResolutionAction,
}

impl TableEntry {
    pub const fn known(name: &'static str, action: ResolutionAction) -> Self {
        Self {
            name: Cow::Borrowed(name),
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("capability '{0}' is declared more than once")]
    Duplicate(String),
    #[error("capability names cannot be empty")]
    EmptyName,
}

/// Every driver the wider system is known to integrate with. Each literal is
/// a fixed load target so bundling tools can enumerate them.
const KNOWN_CAPABILITIES: &[TableEntry] = &[
    TableEntry::known(
        "@google-cloud/spanner",
        ResolutionAction::direct("strata_google_cloud_spanner"),
    ),
    TableEntry::known(
        "@sap/hana-client",
        ResolutionAction::direct("strata_sap_hana_client"),
    ),
    TableEntry::known(
        "better-sqlite3",
        ResolutionAction::direct("strata_better_sqlite3"),
    ),
    TableEntry::known("hdb-pool", ResolutionAction::direct("strata_hdb_pool")),
    TableEntry::known("ioredis", ResolutionAction::direct("strata_ioredis")),
    TableEntry::known("mongodb", ResolutionAction::direct("strata_mongodb")),
    TableEntry::known("mssql", ResolutionAction::direct("strata_mssql")),
    TableEntry::known("mysql", ResolutionAction::direct("strata_mysql")),
    TableEntry::known("mysql2", ResolutionAction::direct("strata_mysql2")),
    TableEntry::known("oracledb", ResolutionAction::direct("strata_oracledb")),
    TableEntry::known("pg", ResolutionAction::direct("strata_pg")),
    TableEntry::known("pg-native", ResolutionAction::direct("strata_pg_native")),
    TableEntry::known("pg-query-stream", ResolutionAction::FallbackOnly),
    TableEntry::known("redis", ResolutionAction::direct("strata_redis")),
    TableEntry::known("sqlite3", ResolutionAction::direct("strata_sqlite3")),
    TableEntry::known("sql.js", ResolutionAction::FallbackOnly),
    TableEntry::known(
        "aurora-data-api",
        ResolutionAction::direct("strata_aurora_data_api"),
    ),
];

static KNOWN_TABLE: OnceLock<Arc<ResolutionTable>> = OnceLock::new();

/// Immutable mapping from capability name to resolution action.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTable {
    entries: Vec<TableEntry>,
    index: HashMap<String, usize>,
}

impl ResolutionTable {
    /// Table of every known capability, built once per process
    pub fn known() -> Arc<ResolutionTable> {
        KNOWN_TABLE
            .get_or_init(|| {
                let mut table = ResolutionTable::default();
                for entry in KNOWN_CAPABILITIES {
                    // The literal list has unique, non-empty names.
                    table.index.insert(entry.name.to_string(), table.entries.len());
                    table.entries.push(entry.clone());
                }
                Arc::new(table)
            })
            .clone()
    }

    /// Build a custom table. Duplicate or blank names are rejected.
    pub fn from_entries<I>(entries: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = TableEntry>,
    {
        let mut table = ResolutionTable::default();
        for entry in entries {
            if entry.name.trim().is_empty() {
                return Err(TableError::EmptyName);
            }
            if table.index.contains_key(entry.name.as_ref()) {
                return Err(TableError::Duplicate(entry.name.into_owned()));
            }
            table.index.insert(entry.name.to_string(), table.entries.len());
            table.entries.push(entry);
        }
        Ok(table)
    }

    /// Table with no entries: every name goes through the fallback root
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ResolutionAction> {
        self.index
            .get(name)
            .and_then(|&i| self.entries.get(i))
            .map(|entry| &entry.action)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_ref())
    }

    /// Every library stem a direct action may load
    pub fn direct_libraries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| entry.action.library())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
