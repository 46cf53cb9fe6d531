// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Dry-run the UAMx social-auth policy hooks.
#[derive(Parser, Debug)]
#[command(
	name = "uamx-auth",
	about = "Dry-run the UAMx social-auth policy hooks",
	version
)]
pub struct Cli {
	/// TOML configuration file (defaults to /etc/uamx/auth.toml)
	#[arg(long, global = true, env = "UAMX_AUTH_CONFIG")]
	pub config: Option<PathBuf>,

	/// Print the decision or error payload as JSON
	#[arg(long, global = true)]
	pub json: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Run the registration guard on a submitted email
	CheckRegistration {
		#[arg(long)]
		email: String,
	},
	/// Run the login guard on a user with the given email
	CheckLogin(CheckLoginArgs),
	/// Run the email associator against a user database
	Associate(AssociateArgs),
}

#[derive(Args, Debug)]
pub struct CheckLoginArgs {
	#[arg(long, required_unless_present = "anonymous")]
	pub email: Option<String>,

	/// Run the guard with no resolved user
	#[arg(long, conflicts_with = "email")]
	pub anonymous: bool,
}

#[derive(Args, Debug)]
pub struct AssociateArgs {
	/// Email reported by the provider; omit to simulate a provider without one
	#[arg(long)]
	pub email: Option<String>,

	/// Social-auth backend name recorded on rejections
	#[arg(long, default_value = "cli")]
	pub backend: String,

	/// SQLite database holding the `users` table
	#[arg(long, required_unless_present = "users_file", conflicts_with = "users_file")]
	pub database_url: Option<String>,

	/// JSON file with an array of user accounts
	#[arg(long)]
	pub users_file: Option<PathBuf>,

	/// Simulate an attempt whose user was already resolved by an earlier step
	#[arg(long)]
	pub resolved: bool,
}
