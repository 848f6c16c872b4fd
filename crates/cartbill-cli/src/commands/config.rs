//! Config command - inspect and edit the configuration file.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use cartbill_core::CartBillConfig;

use super::config_path;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the configuration in effect
    Show,

    /// Write a configuration file with default values
    Init {
        /// Where to write the file instead of the config path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one value by dotted key (e.g. "bill.currency")
    Get { key: String },

    /// Change one value by dotted key; bare words are stored as text
    Set { key: String, value: String },

    /// Print where the configuration file lives
    Path,
}

pub async fn run(args: ConfigArgs, explicit: Option<&str>) -> anyhow::Result<()> {
    let path = config_path(explicit);

    match args.command {
        ConfigCommand::Show => {
            if !path.exists() {
                eprintln!("{} No config file found, showing defaults.", style("ℹ").blue());
            }
            let config = CartBillConfig::load_or_default(&path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init { output, force } => {
            let target = output.unwrap_or(path);
            if target.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    target.display()
                );
            }
            CartBillConfig::default().save(&target)?;
            println!("{} Created configuration file at {}", style("✓").green(), target.display());
        }
        ConfigCommand::Get { key } => {
            let value = CartBillConfig::load_or_default(&path)?.get_key(&key)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        ConfigCommand::Set { key, value } => {
            let mut config = CartBillConfig::load_or_default(&path)?;
            let stored = config.set_key(&key, &value)?;
            config.save(&path)?;
            println!("{} Set {} = {}", style("✓").green(), key, stored);
        }
        ConfigCommand::Path => {
            println!("Configuration file: {}", path.display());
            if path.exists() {
                println!("Status: {}", style("exists").green());
            } else {
                println!("Status: {}", style("not created").yellow());
                println!("\nRun 'cartbill config init' to create a configuration file.");
            }
        }
    }

    Ok(())
}
