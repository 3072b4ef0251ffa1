//! Command line access to the bench equipment.
//!
//! Identify resources:
//! ```bash
//! equipment identify TCPIP0::10.0.0.5::5025::SOCKET GPIB0::7::INSTR
//! ```
//!
//! Connect and initialize all devices of a configuration, requiring the power supply:
//! ```bash
//! RUST_LOG=debug equipment connect equipment.json --init --require source_v_in
//! ```

use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{Parser, Subcommand};
use equipment_collection::{
    CollectionError, ConnectOptions, ConnectionOutcome, EquipmentConfig, Registry,
    connect_resources, identify_resources,
};
use equipmentrs::{ConnectionSettings, DefaultOpener};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "equipment")]
#[command(about = "Identify and connect SCPI bench equipment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the identification string of the given resources
    Identify {
        /// Resource addresses, e.g., TCPIP0::10.0.0.5::5025::SOCKET
        #[arg(required = true)]
        addresses: Vec<String>,

        /// I/O timeout in seconds
        #[arg(long, default_value_t = 1.0)]
        timeout: f64,
    },

    /// Find all VISA resources and identify them
    #[cfg(feature = "visa")]
    Find {
        /// VISA search expression
        #[arg(default_value = "?*::INSTR")]
        query: String,

        /// I/O timeout in seconds
        #[arg(long, default_value_t = 1.0)]
        timeout: f64,
    },

    /// Connect all devices of a configuration file
    Connect {
        /// Path to the JSON configuration
        config: PathBuf,

        /// Run the initialization steps of each device
        #[arg(long)]
        init: bool,

        /// Only connect the named devices, all of which must be available
        #[arg(long = "require", value_name = "NAME")]
        require: Vec<String>,
    },

    /// List the object identifiers that can be used in a configuration
    Drivers,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CollectionError> {
    match cli.command {
        Commands::Identify { addresses, timeout } => {
            let settings = settings_with_timeout(timeout)?;
            print_identities(&identify_resources(&addresses, &DefaultOpener, &settings));
        }
        #[cfg(feature = "visa")]
        Commands::Find { query, timeout } => {
            let settings = settings_with_timeout(timeout)?;
            print_identities(&equipment_collection::identify_visa_resources(
                &query, &settings,
            )?);
        }
        Commands::Connect {
            config,
            init,
            require,
        } => {
            let config = EquipmentConfig::from_path(config)?;
            let options = ConnectOptions {
                object_mask: (!require.is_empty()).then_some(require),
                init,
            };
            let mut collection =
                connect_resources(config, &options, &Registry::default(), &DefaultOpener)?;
            for (name, outcome) in collection.outcomes() {
                match outcome {
                    ConnectionOutcome::Connected { failed_steps } => {
                        let idn = collection.get(name).map(|d| d.idn()).unwrap_or_default();
                        println!("{name}: connected, {idn}");
                        for step in failed_steps {
                            println!("    step {} skipped: {}", step.name, step.reason);
                        }
                    }
                    ConnectionOutcome::ConnectionFailed(reason) => {
                        println!("{name}: not connected, {reason}")
                    }
                    ConnectionOutcome::Unsupported(object) => {
                        println!("{name}: unsupported object type {object}")
                    }
                }
            }
            collection.set_local();
        }
        Commands::Drivers => {
            for id in Registry::default().identifiers() {
                println!("{id}");
            }
        }
    }
    Ok(())
}

fn settings_with_timeout(timeout: f64) -> Result<ConnectionSettings, CollectionError> {
    let timeout = Duration::try_from_secs_f64(timeout)
        .map_err(|_| CollectionError::Config(format!("Invalid timeout: {timeout} s")))?;
    Ok(ConnectionSettings {
        timeout,
        ..Default::default()
    })
}

fn print_identities(found: &[(String, String)]) {
    for (address, idn) in found {
        println!("{address}\t{idn}");
    }
}
