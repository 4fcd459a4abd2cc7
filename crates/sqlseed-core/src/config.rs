//! # Configuration File Parser
//!
//! Reads the run configuration: which database to seed, how many rows each
//! table gets, which tables take part, and which columns must draw from a
//! fixed set of values. JSON is the primary format; a file ending in `.toml`
//! is parsed as TOML with the same field names.
//!
//! Example `seed.json`:
//!
//! ```json
//! {
//!   "database": {
//!     "backend": "postgresql",
//!     "serverName": "localhost",
//!     "port": 5432,
//!     "databaseName": "shop",
//!     "schemaName": "public",
//!     "username": "seed",
//!     "password": "secret"
//!   },
//!   "commonSettings": { "numberOfRows": 100 },
//!   "tableSettings": {
//!     "filter": { "mode": "exclude", "values": ["audit_log"] },
//!     "config": [
//!       {
//!         "name": "customers",
//!         "numberOfRows": 10,
//!         "validValues": { "age": "18-25", "tier": ["gold", "silver"] }
//!       }
//!     ]
//!   }
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Result, SeedError};
use crate::generate::value::Value;
use crate::schema::types::{DatabaseSchema, DatabaseType, Table};

/// Rows per table when neither the table nor `commonSettings` says otherwise.
pub const DEFAULT_ROWS: usize = 100;

/// Upper bound on the number of integers a `"min-max"` range may expand to.
pub const MAX_RANGE_SPAN: i64 = 1_000_000;

/// Top-level configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeedConfig {
    pub database: DatabaseConfig,
    pub common_settings: CommonSettings,
    pub table_settings: TableSettings,
}

/// Connection settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Backend discriminator: sqlserver, mysql, postgresql or sqlite.
    pub backend: Option<String>,
    pub server_name: Option<String>,
    pub port: Option<u16>,
    /// Database name, or the file path for SQLite.
    pub database_name: Option<String>,
    pub schema_name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Full connection URL. Takes precedence over the individual fields.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommonSettings {
    pub number_of_rows: Option<usize>,
    /// Fixed random seed for reproducible value synthesis.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableSettings {
    pub filter: Option<FilterConfig>,
    pub config: Vec<TableConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    pub mode: FilterMode,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[serde(alias = "Include")]
    Include,
    #[serde(alias = "Exclude")]
    Exclude,
}

/// Per-table overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    pub name: String,
    #[serde(default)]
    pub number_of_rows: Option<usize>,
    #[serde(default)]
    pub valid_values: IndexMap<String, ValidValues>,
}

/// Allowed values for a column: an explicit list or an inclusive integer
/// range written as `"min-max"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValidValues {
    List(Vec<serde_json::Value>),
    Range(String),
}

impl ValidValues {
    /// Expand into the concrete set of candidate values.
    pub fn expand(&self) -> Result<Vec<Value>> {
        match self {
            ValidValues::List(items) => Ok(items.iter().map(Value::from_json).collect()),
            ValidValues::Range(spec) => {
                let (min, max) = parse_range(spec)?;
                Ok((min..=max).map(Value::Int).collect())
            }
        }
    }
}

/// Parse `"18-25"` (or `"-5-5"`, `"-10--2"`) into its inclusive bounds.
pub fn parse_range(spec: &str) -> Result<(i64, i64)> {
    let invalid = |reason: &str| SeedError::Config {
        message: format!("Invalid range '{}': {}", spec, reason),
    };

    let trimmed = spec.trim();
    // Skip a leading minus so it is not mistaken for the separator.
    let search_from = usize::from(trimmed.starts_with('-'));
    let sep = trimmed[search_from..]
        .find('-')
        .map(|i| i + search_from)
        .ok_or_else(|| invalid("expected 'min-max'"))?;

    let min: i64 = trimmed[..sep]
        .trim()
        .parse()
        .map_err(|_| invalid("lower bound is not an integer"))?;
    let max: i64 = trimmed[sep + 1..]
        .trim()
        .parse()
        .map_err(|_| invalid("upper bound is not an integer"))?;

    if min > max {
        return Err(invalid("lower bound exceeds upper bound"));
    }
    if max.saturating_sub(min) >= MAX_RANGE_SPAN {
        return Err(invalid(&format!(
            "range spans more than {} values",
            MAX_RANGE_SPAN
        )));
    }
    Ok((min, max))
}

/// Read and parse a configuration file.
pub fn read_config(path: &Path) -> Result<SeedConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SeedError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let config: SeedConfig = if is_toml {
        toml::from_str(&content).map_err(|e| SeedError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| SeedError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?
    };

    config.validate()?;
    Ok(config)
}

impl SeedConfig {
    /// Validate semantic constraints that serde cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if let Some(backend) = &self.database.backend {
            backend.parse::<DatabaseType>()?;
        }

        let mut seen = HashSet::new();
        for table in &self.table_settings.config {
            if table.name.trim().is_empty() {
                return Err(SeedError::Config {
                    message: "tableSettings.config entry has an empty name".to_string(),
                });
            }
            if !seen.insert(table.name.to_lowercase()) {
                return Err(SeedError::Config {
                    message: format!(
                        "Table '{}' is configured more than once in tableSettings.config",
                        table.name
                    ),
                });
            }
            for (column, values) in &table.valid_values {
                let expanded = values.expand().map_err(|e| SeedError::Config {
                    message: format!("{}.{}: {}", table.name, column, e),
                })?;
                if expanded.is_empty() {
                    return Err(SeedError::Config {
                        message: format!(
                            "{}.{}: validValues must not be empty",
                            table.name, column
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Build the read-only settings used by a run.
    pub fn to_run_config(&self) -> Result<RunConfig> {
        let filter = match &self.table_settings.filter {
            None => TableFilter::All,
            Some(f) => {
                let names = f.values.iter().map(|v| v.to_lowercase()).collect();
                match f.mode {
                    FilterMode::Include => TableFilter::Include(names),
                    FilterMode::Exclude => TableFilter::Exclude(names),
                }
            }
        };

        let mut overrides = HashMap::new();
        for table in &self.table_settings.config {
            let mut values = IndexMap::new();
            for (column, allowed) in &table.valid_values {
                values.insert(column.to_lowercase(), allowed.expand()?);
            }
            overrides.insert(
                table.name.to_lowercase(),
                TableOverride {
                    rows: table.number_of_rows,
                    values,
                },
            );
        }

        Ok(RunConfig {
            default_rows: self.common_settings.number_of_rows.unwrap_or(DEFAULT_ROWS),
            seed: self.common_settings.seed,
            filter,
            overrides,
        })
    }
}

impl DatabaseConfig {
    pub fn database_type(&self) -> Result<DatabaseType> {
        match (&self.backend, &self.url) {
            (Some(backend), _) => backend.parse(),
            (None, Some(url)) => database_type_from_url(url),
            (None, None) => Err(SeedError::Config {
                message: "database.backend is required when no connection URL is given"
                    .to_string(),
            }),
        }
    }

    /// Connection URL for sqlx, assembled from the individual fields unless
    /// `url` is set.
    pub fn connection_url(&self) -> Result<String> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let db_type = self.database_type()?;
        let database = self.database_name.as_deref().ok_or_else(|| SeedError::Config {
            message: "database.databaseName is required".to_string(),
        })?;

        let scheme = match db_type {
            DatabaseType::SQLite => return Ok(format!("sqlite://{}", database)),
            DatabaseType::PostgreSQL => "postgres",
            DatabaseType::MySQL => "mysql",
            DatabaseType::SqlServer => "mssql",
        };

        let host = self.server_name.as_deref().unwrap_or("localhost");
        let mut url = url::Url::parse(&format!("{}://{}", scheme, host)).map_err(|e| {
            SeedError::Config {
                message: format!("Invalid database.serverName '{}': {}", host, e),
            }
        })?;

        let port = self.port.or(db_type.default_port());
        let set_parts = (|| -> std::result::Result<(), ()> {
            if let Some(user) = &self.username {
                url.set_username(user)?;
            }
            if let Some(password) = &self.password {
                url.set_password(Some(password))?;
            }
            url.set_port(port)?;
            Ok(())
        })();
        if set_parts.is_err() {
            return Err(SeedError::Config {
                message: format!("Cannot build a connection URL for host '{}'", host),
            });
        }
        url.set_path(&format!("/{}", database.trim_start_matches('/')));

        Ok(url.to_string())
    }
}

/// Determine the backend from a connection URL scheme.
pub fn database_type_from_url(url: &str) -> Result<DatabaseType> {
    let scheme = url.split(':').next().unwrap_or("");
    match scheme {
        "postgres" | "postgresql" => Ok(DatabaseType::PostgreSQL),
        "mysql" | "mariadb" => Ok(DatabaseType::MySQL),
        "sqlite" | "file" => Ok(DatabaseType::SQLite),
        "mssql" | "sqlserver" => Ok(DatabaseType::SqlServer),
        other => Err(SeedError::UnsupportedDatabase {
            backend: other.to_string(),
        }),
    }
}

/// Which tables take part in a run. Names are compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TableFilter {
    #[default]
    All,
    Include(HashSet<String>),
    Exclude(HashSet<String>),
}

impl TableFilter {
    pub fn allows(&self, table: &str) -> bool {
        match self {
            TableFilter::All => true,
            TableFilter::Include(names) => names.contains(&table.to_lowercase()),
            TableFilter::Exclude(names) => !names.contains(&table.to_lowercase()),
        }
    }
}

/// Overrides for one table, with column keys lower-cased.
#[derive(Debug, Clone, Default)]
pub struct TableOverride {
    pub rows: Option<usize>,
    pub values: IndexMap<String, Vec<Value>>,
}

impl TableOverride {
    pub fn values_for(&self, column: &str) -> Option<&[Value]> {
        self.values.get(&column.to_lowercase()).map(|v| v.as_slice())
    }
}

/// Settings for a single run, derived from `SeedConfig` and CLI flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub default_rows: usize,
    pub seed: Option<u64>,
    pub filter: TableFilter,
    /// Keyed by lower-cased table name.
    pub overrides: HashMap<String, TableOverride>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            default_rows: DEFAULT_ROWS,
            seed: None,
            filter: TableFilter::All,
            overrides: HashMap::new(),
        }
    }
}

impl RunConfig {
    pub fn table_override(&self, table: &str) -> Option<&TableOverride> {
        self.overrides.get(&table.to_lowercase())
    }

    /// Target row count for `table`.
    pub fn rows_for(&self, table: &str) -> usize {
        self.table_override(table)
            .and_then(|o| o.rows)
            .unwrap_or(self.default_rows)
    }

    /// Check overrides and filter entries against the introspected schema.
    ///
    /// Returns a warning for every table or column that does not exist, so
    /// stale configuration is visible before any rows are written.
    pub fn validate_against_schema(&self, schema: &DatabaseSchema) -> Vec<String> {
        let tables: HashMap<String, &Table> = schema
            .tables
            .iter()
            .map(|(name, table)| (name.to_lowercase(), table))
            .collect();

        let mut override_names: Vec<&String> = self.overrides.keys().collect();
        override_names.sort();

        let mut warnings = Vec::new();
        for name in override_names {
            match tables.get(name) {
                None => warnings.push(format!(
                    "tableSettings.config references table '{}' which does not exist in schema",
                    name
                )),
                Some(table) => {
                    for column in self.overrides[name].values.keys() {
                        let exists = table
                            .columns
                            .keys()
                            .any(|c| c.eq_ignore_ascii_case(column));
                        if !exists {
                            warnings.push(format!(
                                "tableSettings.config: validValues references column '{}' which does not exist in table '{}'",
                                column, table.name
                            ));
                        }
                    }
                }
            }
        }

        let filtered = match &self.filter {
            TableFilter::All => None,
            TableFilter::Include(names) | TableFilter::Exclude(names) => Some(names),
        };
        if let Some(names) = filtered {
            let mut names: Vec<&String> = names.iter().collect();
            names.sort();
            for name in names {
                if !tables.contains_key(name) {
                    warnings.push(format!(
                        "tableSettings.filter names table '{}' which does not exist in schema",
                        name
                    ));
                }
            }
        }
        warnings
    }
}
