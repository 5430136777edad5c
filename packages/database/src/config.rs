//! Document store connection settings.
//!
//! Built once at startup from CLI overrides, then environment variables
//! (including those loaded from a `.env` file), then defaults, and passed
//! down explicitly.

use std::path::PathBuf;

use crate::DbError;

/// Environment variable holding the connection URI.
pub const DATABASE_URI_ENV: &str = "DATABASE_URI";

/// Environment variable holding the database (schema) name.
pub const DATABASE_NAME_ENV: &str = "DATABASE_NAME";

/// Connection URI used when neither an override nor the environment set one.
pub const DEFAULT_DATABASE_URI: &str = "data/pdf_records.duckdb";

/// Database name used when neither an override nor the environment set one.
pub const DEFAULT_DATABASE_NAME: &str = "pdf_data";

/// URI that selects a throwaway in-memory database.
pub const MEMORY_URI: &str = ":memory:";

const URI_SCHEME: &str = "duckdb://";

/// Where the `DuckDB` database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// In-memory database, gone when the connection closes.
    Memory,
    /// Database file on disk.
    File(PathBuf),
}

/// Connection URI plus logical database name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    uri: String,
    database: String,
}

impl StoreConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// * [`DbError::InvalidUri`] if `uri` is empty
    /// * [`DbError::InvalidName`] if `database` is not a plain identifier
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Result<Self, DbError> {
        let uri = uri.into();
        let database = database.into();

        if uri.trim().is_empty() || uri.trim() == URI_SCHEME {
            return Err(DbError::InvalidUri { uri });
        }
        if !is_identifier(&database) {
            return Err(DbError::InvalidName { name: database });
        }

        Ok(Self { uri, database })
    }

    /// In-memory store using `database` as the schema name.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidName`] if `database` is not a plain
    /// identifier.
    pub fn in_memory(database: impl Into<String>) -> Result<Self, DbError> {
        Self::new(MEMORY_URI, database)
    }

    /// Resolves each setting from `override`, then the process
    /// environment, then the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the resolved values are invalid.
    pub fn resolve(uri: Option<String>, database: Option<String>) -> Result<Self, DbError> {
        Self::resolve_with(uri, database, |name| std::env::var(name).ok())
    }

    /// Same as [`Self::resolve`] with a custom environment lookup.
    ///
    /// Empty values from the environment count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the resolved values are invalid.
    pub fn resolve_with(
        uri: Option<String>,
        database: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, DbError> {
        let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let uri = uri
            .or_else(|| lookup(DATABASE_URI_ENV))
            .unwrap_or_else(|| DEFAULT_DATABASE_URI.to_owned());
        let database = database
            .or_else(|| lookup(DATABASE_NAME_ENV))
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_owned());

        Self::new(uri, database)
    }

    /// The connection URI as configured.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The database (schema) name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Interprets the URI. A `duckdb://` prefix is accepted.
    #[must_use]
    pub fn location(&self) -> StoreLocation {
        let path = self.uri.trim();
        let path = path.strip_prefix(URI_SCHEME).unwrap_or(path);

        if path == MEMORY_URI {
            StoreLocation::Memory
        } else {
            StoreLocation::File(PathBuf::from(path))
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`; the name is interpolated into DDL.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn falls_back_to_defaults() {
        let config = StoreConfig::resolve_with(None, None, no_env).unwrap();
        assert_eq!(config.uri(), DEFAULT_DATABASE_URI);
        assert_eq!(config.database(), DEFAULT_DATABASE_NAME);
        assert_eq!(
            config.location(),
            StoreLocation::File(PathBuf::from(DEFAULT_DATABASE_URI))
        );
    }

    #[test]
    fn environment_overrides_defaults_and_flags_override_environment() {
        let env = |name: &str| match name {
            DATABASE_URI_ENV => Some("/var/lib/records.duckdb".to_owned()),
            DATABASE_NAME_ENV => Some("inventory".to_owned()),
            _ => None,
        };

        let from_env = StoreConfig::resolve_with(None, None, env).unwrap();
        assert_eq!(from_env.uri(), "/var/lib/records.duckdb");
        assert_eq!(from_env.database(), "inventory");

        let from_flags =
            StoreConfig::resolve_with(Some(":memory:".to_owned()), Some("cars".to_owned()), env)
                .unwrap();
        assert_eq!(from_flags.location(), StoreLocation::Memory);
        assert_eq!(from_flags.database(), "cars");
    }

    #[test]
    fn env_file_values_yield_to_process_environment_and_flags() {
        let dir = std::env::temp_dir().join("pdf_records_database_env_file");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        std::fs::write(
            &path,
            "DATABASE_URI=duckdb://from_file.duckdb\nDATABASE_NAME=from_file\n",
        )
        .unwrap();

        let file: Vec<(String, String)> = dotenvy::from_path_iter(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let process = |name: &str| (name == DATABASE_NAME_ENV).then(|| "from_process".to_owned());
        // Loading an env file never replaces variables the process already has.
        let env = |name: &str| {
            process(name).or_else(|| {
                file.iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| value.clone())
            })
        };

        let config = StoreConfig::resolve_with(None, None, env).unwrap();
        assert_eq!(
            config.location(),
            StoreLocation::File(PathBuf::from("from_file.duckdb"))
        );
        assert_eq!(config.database(), "from_process");

        let flagged =
            StoreConfig::resolve_with(Some(":memory:".to_owned()), Some("flag".to_owned()), env)
                .unwrap();
        assert_eq!(flagged.location(), StoreLocation::Memory);
        assert_eq!(flagged.database(), "flag");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let env = |_: &str| Some("  ".to_owned());
        let config = StoreConfig::resolve_with(None, None, env).unwrap();
        assert_eq!(config.database(), DEFAULT_DATABASE_NAME);
    }

    #[test]
    fn strips_duckdb_scheme() {
        let config = StoreConfig::new("duckdb://out/cars.duckdb", "pdf_data").unwrap();
        assert_eq!(
            config.location(),
            StoreLocation::File(PathBuf::from("out/cars.duckdb"))
        );
        let memory = StoreConfig::new("duckdb://:memory:", "pdf_data").unwrap();
        assert_eq!(memory.location(), StoreLocation::Memory);
    }

    #[test]
    fn rejects_unsafe_database_names() {
        for name in ["", "1st", "pdf-data", "x\"; DROP TABLE fields; --"] {
            assert!(
                matches!(StoreConfig::in_memory(name), Err(DbError::InvalidName { .. })),
                "{name:?} should be rejected"
            );
        }
        assert!(StoreConfig::in_memory("_pdf_data2").is_ok());
    }

    #[test]
    fn rejects_empty_uri() {
        assert!(matches!(
            StoreConfig::new(" ", "pdf_data"),
            Err(DbError::InvalidUri { .. })
        ));
    }
}
