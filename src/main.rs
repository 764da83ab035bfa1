mod cli;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use yate_extmod::config;
use yate_extmod::lookup::SqliteLookup;
use yate_extmod::session::runner::StdioSession;

use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    yate_extmod::logging::init();
    let cli = Cli::parse();
    let config = config::load(&cli.config)?;
    let config = cli.apply(config);

    let lookup = SqliteLookup::new(&config.database);
    info!(
        database = %lookup.path().display(),
        installs = config.installs.len(),
        "starting"
    );
    if config.show_secrets {
        info!("passwords will appear in clear text in the engine log");
    }

    let session = StdioSession::spawn(
        tokio::io::stdin(),
        tokio::io::stdout(),
        config.idle_interval(),
    );
    let shutdown = yate_extmod::run_module(session, lookup, &config).await;

    info!(
        polls = shutdown.summary.polls,
        acknowledged = shutdown.summary.acknowledged,
        "exiting"
    );
    // The stdin reader sits on a blocking thread that runtime shutdown would
    // wait for until the engine closes our input.
    std::process::exit(0)
}
