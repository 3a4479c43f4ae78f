// bookshelf - keeps track of books and what people thought of them
//
// Entry point. Loads config, opens the one database connection, then hands
// stdin/stdout to the console until the user quits.

use anyhow::Context;
use bookshelf_lib::{logging, Config, Console, Database};
use std::io;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if let Err(err) = logging::init_tracing() {
        eprintln!("Could not initialize logging: {:#}", err);
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let db = Database::connect(&config)
        .await
        .with_context(|| format!("could not connect to {}", config.connection_string))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut console = Console::new(stdin.lock(), stdout.lock(), config.atomic_insert);

    // close on every path, the session result is reported afterwards
    let session = console.run(&db).await;
    db.close().await;

    session.context("console session ended with an error")
}
