// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! `uamx-auth`: operator tool for the UAMx social-auth policy hooks.
//!
//! Exit codes: 0 when the hook passes, 2 when it rejects the attempt, 1 on
//! operational errors (bad config, unreachable database).

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod args;
mod commands;

use args::Cli;
use commands::Outcome;

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();

	match run(cli).await {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:#}");
			ExitCode::from(1)
		}
	}
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
	let config = uamx_server_auth::load_config(cli.config.as_deref())?;

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	tracing::info!(
		reserved_suffix = %config.policy.reserved_suffix,
		deny_privileged_association = config.policy.deny_privileged_association,
		"auth policy configuration loaded"
	);
	tracing::debug!(command = ?cli.command, "running policy hook");
	let outcome = commands::run(&cli.command, &config.policy).await?;

	let code = match outcome {
		Outcome::Rejected(_) => ExitCode::from(2),
		Outcome::Passed(_) => ExitCode::SUCCESS,
	};

	if cli.json {
		println!("{}", outcome.render_json()?);
	} else {
		println!("{}", outcome.render_text());
	}

	Ok(code)
}
