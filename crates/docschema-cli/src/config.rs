//! Command-line arguments.

use clap::{Args as ClapArgs, Parser, Subcommand};
use docschema_core::storage::{StoreConfig, DEFAULT_DATABASE_NAME};
use std::path::PathBuf;

/// Default data directory.
pub const DEFAULT_DATA_PATH: &str = "./docschema_data";

/// Default page cache size in megabytes.
pub const DEFAULT_CACHE_MB: u64 = 256;

/// docschema command-line interface
#[derive(Parser, Debug)]
#[command(name = "docschema")]
#[command(version, about = "Compile and register declarative document schemas", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a description file and print the storage definition.
    Compile {
        /// Description JSON file.
        file: PathBuf,

        /// Wrap the description as an entity (adds _id and timestamps).
        #[arg(long)]
        entity: bool,
    },

    /// Register a description as a collection in the store.
    Register {
        /// Collection name.
        name: String,

        /// Description JSON file.
        file: PathBuf,

        /// Wrap the description as an entity (adds _id and timestamps).
        #[arg(long)]
        entity: bool,

        /// Reference field rendered as its key unless expanded (repeatable).
        #[arg(long = "expand", value_name = "FIELD")]
        expand: Vec<String>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Print store status as JSON.
    Status {
        #[command(flatten)]
        store: StoreArgs,
    },
}

/// Store location and tuning.
#[derive(ClapArgs, Debug, Clone)]
pub struct StoreArgs {
    /// Path to the store directory.
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,

    /// Database name used in namespaces.
    #[arg(long, default_value = DEFAULT_DATABASE_NAME)]
    pub database: String,

    /// Page cache size in megabytes.
    #[arg(long, default_value_t = DEFAULT_CACHE_MB)]
    pub cache_mb: u64,
}

impl StoreArgs {
    /// Convert to store configuration.
    pub fn into_config(self) -> StoreConfig {
        StoreConfig::new(self.data_path)
            .with_name(self.database)
            .with_cache_capacity(self.cache_mb * 1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_register() {
        let args = Args::try_parse_from([
            "docschema",
            "register",
            "Users",
            "user.json",
            "--entity",
            "--expand",
            "company",
            "--expand",
            "friends",
            "--data-path",
            "/tmp/store",
        ])
        .unwrap();

        match args.command {
            Command::Register {
                name,
                file,
                entity,
                expand,
                store,
            } => {
                assert_eq!(name, "Users");
                assert_eq!(file, PathBuf::from("user.json"));
                assert!(entity);
                assert_eq!(expand, vec!["company", "friends"]);
                assert_eq!(store.data_path, PathBuf::from("/tmp/store"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_store_defaults() {
        let args = Args::try_parse_from(["docschema", "status"]).unwrap();
        let Command::Status { store } = args.command else {
            panic!("expected status");
        };

        let config = store.into_config();
        assert_eq!(config.path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(config.name, DEFAULT_DATABASE_NAME);
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_MB * 1024 * 1024);
    }

    #[test]
    fn test_compile_requires_file() {
        assert!(Args::try_parse_from(["docschema", "compile"]).is_err());
    }
}
