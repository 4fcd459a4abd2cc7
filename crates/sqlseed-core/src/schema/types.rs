use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SeedError;

/// Top-level representation of an introspected database schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub database_type: DatabaseType,
    pub schema_name: String,
    pub tables: IndexMap<String, Table>,
}

impl DatabaseSchema {
    pub fn new(database_type: DatabaseType, schema_name: String) -> Self {
        Self {
            database_type,
            schema_name,
            tables: IndexMap::new(),
        }
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn foreign_key_count(&self) -> usize {
        self.tables.values().map(|t| t.foreign_keys.len()).sum()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }

    /// Look up a column by table and column name.
    pub fn column(&self, table: &str, column: &str) -> Option<&Column> {
        self.tables.get(table).and_then(|t| t.columns.get(column))
    }
}

/// Database families recognized in configuration.
///
/// `SqlServer` is recognized so its parameter ceiling is known, but no driver
/// ships with this crate (see `backend::factory::connect`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    /// Accepted in configuration and used for batch sizing (2100 parameters),
    /// but connecting fails with `SeedError::UnsupportedDatabase`: there is no
    /// SQL Server driver in this build, so it cannot be seeded yet.
    #[serde(rename = "sqlserver", alias = "mssql", alias = "SqlServer")]
    SqlServer,
    #[serde(rename = "mysql", alias = "mariadb", alias = "MySql")]
    MySQL,
    #[serde(rename = "postgresql", alias = "postgres", alias = "PostgreSql")]
    PostgreSQL,
    #[serde(rename = "sqlite", alias = "SQLite")]
    SQLite,
}

impl DatabaseType {
    /// Maximum number of bound parameters a single statement may carry.
    pub fn max_parameters(&self) -> usize {
        match self {
            DatabaseType::SqlServer => 2100,
            DatabaseType::MySQL => 65535,
            DatabaseType::PostgreSQL => 65535,
            DatabaseType::SQLite => 32766,
        }
    }

    /// Port used when the configuration does not name one.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DatabaseType::SqlServer => Some(1433),
            DatabaseType::MySQL => Some(3306),
            DatabaseType::PostgreSQL => Some(5432),
            DatabaseType::SQLite => None,
        }
    }
}

impl FromStr for DatabaseType {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlserver" | "mssql" => Ok(DatabaseType::SqlServer),
            "mysql" | "mariadb" => Ok(DatabaseType::MySQL),
            "postgresql" | "postgres" => Ok(DatabaseType::PostgreSQL),
            "sqlite" => Ok(DatabaseType::SQLite),
            other => Err(SeedError::UnsupportedDatabase {
                backend: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseType::SqlServer => write!(f, "SQL Server"),
            DatabaseType::PostgreSQL => write!(f, "PostgreSQL"),
            DatabaseType::MySQL => write!(f, "MySQL"),
            DatabaseType::SQLite => write!(f, "SQLite"),
        }
    }
}

/// A table with its columns, primary key and single-column foreign keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: IndexMap<String, Column>,
    pub primary_key: Vec<String>,
    /// Foreign keys keyed by the referencing column.
    pub foreign_keys: IndexMap<String, ForeignKeyRef>,
}

impl Table {
    pub fn new(name: String) -> Self {
        Self {
            name,
            columns: IndexMap::new(),
            primary_key: Vec::new(),
            foreign_keys: IndexMap::new(),
        }
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.iter().any(|c| c == column)
    }

    pub fn foreign_key(&self, column: &str) -> Option<&ForeignKeyRef> {
        self.foreign_keys.get(column)
    }
}

/// A single column in a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub raw_type: String,
    pub nullable: bool,
    pub max_length: Option<u32>,
    pub ordinal_position: u32,
}

impl Column {
    pub fn new(name: String, data_type: DataType, raw_type: String) -> Self {
        Self {
            name,
            data_type,
            raw_type,
            nullable: true,
            max_length: None,
            ordinal_position: 0,
        }
    }
}

/// Target of a foreign key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

impl fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Normalized data type covering every supported database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// Small integer (int2, smallint, tinyint)
    SmallInt,
    /// Standard integer (int4, integer, int)
    Integer,
    /// Large integer (int8, bigint)
    BigInt,
    /// Auto-incrementing integer (serial)
    Serial,
    /// Auto-incrementing bigint (bigserial)
    BigSerial,
    /// Single-precision float (float4, real)
    Float,
    /// Double-precision float (float8, double precision)
    Double,
    /// Exact numeric (numeric, decimal)
    Numeric,
    /// Money / smallmoney
    Money,
    /// Fixed-length string (char, nchar)
    Char,
    /// Variable-length string (varchar, nvarchar)
    VarChar,
    /// Unbounded text (text, ntext, clob)
    Text,
    Boolean,
    Date,
    Time,
    /// Timestamp without timezone (timestamp, datetime, datetime2)
    Timestamp,
    /// Timestamp with timezone (timestamptz, datetimeoffset)
    TimestampTz,
    /// UUID / uniqueidentifier
    Uuid,
    Json,
    Jsonb,
    /// Binary data (bytea, blob, varbinary)
    Binary,
    /// Unknown or unrecognized type
    Unknown(String),
}

/// Coarse grouping used to pick a value generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Decimal,
    Text,
    Boolean,
    Date,
    Time,
    Timestamp,
    Uuid,
    Json,
    Unsupported,
}

impl DataType {
    /// Parse a raw SQL type string into a normalized DataType.
    pub fn from_raw(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        let normalized = normalized.as_str();

        match normalized {
            "smallint" | "int2" | "smallserial" | "serial2" | "tinyint" => DataType::SmallInt,
            "integer" | "int" | "int4" | "mediumint" => DataType::Integer,
            "bigint" | "int8" => DataType::BigInt,
            "serial" | "serial4" => DataType::Serial,
            "bigserial" | "serial8" => DataType::BigSerial,

            "real" | "float4" | "float" => DataType::Float,
            "double precision" | "float8" | "double" => DataType::Double,
            s if s.starts_with("numeric") || s.starts_with("decimal") => DataType::Numeric,
            "money" | "smallmoney" => DataType::Money,

            s if s.starts_with("character varying")
                || s.starts_with("varchar")
                || s.starts_with("nvarchar") =>
            {
                DataType::VarChar
            }
            s if s.starts_with("char")
                || s.starts_with("character(")
                || s.starts_with("nchar") =>
            {
                DataType::Char
            }
            "text" | "tinytext" | "mediumtext" | "longtext" | "clob" | "ntext" => DataType::Text,

            "boolean" | "bool" | "bit" => DataType::Boolean,

            "date" => DataType::Date,
            "time" | "time without time zone" => DataType::Time,
            "timestamp" | "timestamp without time zone" | "datetime" | "datetime2"
            | "smalldatetime" => DataType::Timestamp,
            "timestamp with time zone" | "timestamptz" | "datetimeoffset" => {
                DataType::TimestampTz
            }

            "uuid" | "uniqueidentifier" => DataType::Uuid,

            "json" => DataType::Json,
            "jsonb" => DataType::Jsonb,

            "bytea" | "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary"
            | "image" => DataType::Binary,

            other => DataType::Unknown(other.to_string()),
        }
    }

    pub fn category(&self) -> TypeCategory {
        match self {
            DataType::SmallInt
            | DataType::Integer
            | DataType::BigInt
            | DataType::Serial
            | DataType::BigSerial => TypeCategory::Integer,
            DataType::Float | DataType::Double | DataType::Numeric | DataType::Money => {
                TypeCategory::Decimal
            }
            DataType::Char | DataType::VarChar | DataType::Text => TypeCategory::Text,
            DataType::Boolean => TypeCategory::Boolean,
            DataType::Date => TypeCategory::Date,
            DataType::Time => TypeCategory::Time,
            DataType::Timestamp | DataType::TimestampTz => TypeCategory::Timestamp,
            DataType::Uuid => TypeCategory::Uuid,
            DataType::Json | DataType::Jsonb => TypeCategory::Json,
            DataType::Binary | DataType::Unknown(_) => TypeCategory::Unsupported,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.category() == TypeCategory::Integer
    }

    /// Returns true if this type is a string/text type.
    pub fn is_string(&self) -> bool {
        self.category() == TypeCategory::Text
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::SmallInt => write!(f, "smallint"),
            DataType::Integer => write!(f, "integer"),
            DataType::BigInt => write!(f, "bigint"),
            DataType::Serial => write!(f, "serial"),
            DataType::BigSerial => write!(f, "bigserial"),
            DataType::Float => write!(f, "real"),
            DataType::Double => write!(f, "double precision"),
            DataType::Numeric => write!(f, "numeric"),
            DataType::Money => write!(f, "money"),
            DataType::Char => write!(f, "char"),
            DataType::VarChar => write!(f, "varchar"),
            DataType::Text => write!(f, "text"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::Date => write!(f, "date"),
            DataType::Time => write!(f, "time"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::TimestampTz => write!(f, "timestamptz"),
            DataType::Uuid => write!(f, "uuid"),
            DataType::Json => write!(f, "json"),
            DataType::Jsonb => write!(f, "jsonb"),
            DataType::Binary => write!(f, "binary"),
            DataType::Unknown(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_sql_server_types() {
        assert_eq!(DataType::from_raw("nvarchar"), DataType::VarChar);
        assert_eq!(DataType::from_raw("NCHAR"), DataType::Char);
        assert_eq!(DataType::from_raw("datetime2"), DataType::Timestamp);
        assert_eq!(DataType::from_raw("uniqueidentifier"), DataType::Uuid);
        assert_eq!(DataType::from_raw("bit"), DataType::Boolean);
    }

    #[test]
    fn test_from_raw_parameterized_types() {
        assert_eq!(DataType::from_raw("varchar(255)"), DataType::VarChar);
        assert_eq!(DataType::from_raw("numeric(10,2)"), DataType::Numeric);
        assert_eq!(
            DataType::from_raw("character varying"),
            DataType::VarChar
        );
    }

    #[test]
    fn test_unknown_types_are_unsupported() {
        let dt = DataType::from_raw("geometry");
        assert_eq!(dt, DataType::Unknown("geometry".to_string()));
        assert_eq!(dt.category(), TypeCategory::Unsupported);
        assert_eq!(DataType::Binary.category(), TypeCategory::Unsupported);
    }

    #[test]
    fn test_database_type_parse() {
        assert_eq!(
            "Postgres".parse::<DatabaseType>().unwrap(),
            DatabaseType::PostgreSQL
        );
        assert_eq!(
            "mssql".parse::<DatabaseType>().unwrap(),
            DatabaseType::SqlServer
        );
        assert!("oracle".parse::<DatabaseType>().is_err());
    }

    #[test]
    fn test_parameter_ceilings() {
        assert_eq!(DatabaseType::SqlServer.max_parameters(), 2100);
        assert_eq!(DatabaseType::PostgreSQL.max_parameters(), 65535);
        assert_eq!(DatabaseType::SQLite.max_parameters(), 32766);
    }

    #[test]
    fn test_database_type_deserialize_aliases() {
        let t: DatabaseType = serde_json::from_str("\"mariadb\"").unwrap();
        assert_eq!(t, DatabaseType::MySQL);
        let t: DatabaseType = serde_json::from_str("\"postgresql\"").unwrap();
        assert_eq!(t, DatabaseType::PostgreSQL);
    }
}
