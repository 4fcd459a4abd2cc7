pub mod generate;
pub mod graph;
pub mod introspect;

use anyhow::{Context, Result};

use sqlseed_core::backend::factory::{self, AnyBackend};
use sqlseed_core::config::{read_config, SeedConfig};

use crate::args::ConnectionArgs;

/// Read the configuration file, if any, and apply connection flags on top.
pub fn load_config(args: &ConnectionArgs) -> Result<SeedConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SeedConfig::default(),
    };

    let db = &mut config.database;
    let flags = [
        (&mut db.url, &args.url),
        (&mut db.backend, &args.backend),
        (&mut db.server_name, &args.host),
        (&mut db.database_name, &args.database),
        (&mut db.schema_name, &args.schema),
        (&mut db.username, &args.user),
        (&mut db.password, &args.password),
    ];
    for (field, flag) in flags {
        if flag.is_some() {
            field.clone_from(flag);
        }
    }
    if args.port.is_some() {
        db.port = args.port;
    }

    config.validate()?;
    Ok(config)
}

/// Connect to the database described by the merged configuration.
pub async fn connect(config: &SeedConfig) -> Result<AnyBackend> {
    factory::connect(&config.database)
        .await
        .context("Could not open a database connection")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"database": {{"backend": "postgresql", "serverName": "db", "databaseName": "shop"}}}}"#
        )
        .unwrap();

        let args = ConnectionArgs {
            config: Some(file.path().to_path_buf()),
            host: Some("localhost".to_string()),
            port: Some(6543),
            ..Default::default()
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.database.server_name.as_deref(), Some("localhost"));
        assert_eq!(config.database.database_name.as_deref(), Some("shop"));
        assert_eq!(config.database.port, Some(6543));
    }

    #[test]
    fn test_no_config_file_uses_flags_only() {
        let args = ConnectionArgs {
            url: Some("sqlite::memory:".to_string()),
            ..Default::default()
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("sqlite::memory:"));
        assert!(config.table_settings.config.is_empty());
    }

    #[test]
    fn test_unknown_backend_flag_is_rejected() {
        let args = ConnectionArgs {
            backend: Some("oracle".to_string()),
            ..Default::default()
        };
        assert!(load_config(&args).is_err());
    }
}
