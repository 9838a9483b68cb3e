//! docschema command-line interface
//!
//! Compiles type descriptions, registers them in a document store and
//! reports store status.

mod commands;
mod config;
mod error;

use clap::Parser;
use config::{Args, Command};
use docschema_core::storage::DocumentStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docschema=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let output = match args.command {
        Command::Compile { file, entity } => commands::compile_command(&file, entity)?,
        Command::Register {
            name,
            file,
            entity,
            expand,
            store,
        } => {
            let config = store.into_config();
            tracing::info!(data_path = %config.path.display(), "opening store");
            let store = DocumentStore::open(config)?;
            commands::register_command(&store, &name, &file, entity, &expand)?
        }
        Command::Status { store } => {
            let store = DocumentStore::open(store.into_config())?;
            commands::status_command(&store)?
        }
    };

    println!("{}", output);
    Ok(())
}
