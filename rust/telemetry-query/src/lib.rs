pub mod autocomplete;
pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod parser;
pub mod query;
pub mod series;
pub mod telemetry;
pub mod time;

use crate::{config::AppConfig, query::TranslateRequest};
use anyhow::Context;
use std::io::{self, Read, Write};
use tracing::info;

/// Compiles a translate request read from stdin and writes the execution request to stdout.
pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read translate request from stdin")?;
    let request: TranslateRequest =
        serde_json::from_str(&input).context("stdin is not a valid translate request")?;

    let execution = query::translate_request(&config, &request)
        .map_err(|err| anyhow::anyhow!(err.user_message()))?;
    info!(
        source = %execution.query.source(),
        draft = %request.draft.name,
        "translated query draft"
    );

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &execution)?;
    writeln!(stdout)?;
    Ok(())
}
