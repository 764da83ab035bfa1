use std::path::PathBuf;

use clap::Parser;
use yate_extmod::config::{Config, InstallEntry};

#[derive(Parser, Debug)]
#[command(
    name = "yate-extmod",
    about = "A Yate external module that answers user.auth from a credentials database",
    version
)]
pub struct Cli {
    /// Configuration file. Missing file means defaults.
    #[arg(long, short, default_value = "yate-extmod.toml")]
    pub config: PathBuf,

    /// SQLite credentials database (overrides the config file).
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Show looked-up passwords in clear text in the engine log.
    #[arg(long)]
    pub show_secrets: bool,

    /// Install a handler for an engine message; repeatable. Replaces the
    /// configured list when given.
    #[arg(long = "install", value_name = "NAME[:PRIORITY]")]
    pub installs: Vec<InstallEntry>,
}

impl Cli {
    /// Layer command-line overrides on top of the loaded configuration.
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(database) = self.database {
            config.database = database;
        }
        if self.show_secrets {
            config.show_secrets = true;
        }
        if !self.installs.is_empty() {
            config.installs = self.installs;
        }
        config
    }
}
