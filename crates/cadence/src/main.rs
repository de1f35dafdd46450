// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cadence binary: runs the counting job once with cancellation support.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cadence::jobs::CountingJob;
use cadence::run::{exit_code, run_job, RunOutput, RunOverrides, RunRequest};
use cadence::version;
use cadence_jobs::JobExecutor;
use cadence_logs::{EventLog, InvocationEventLayer};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cadence - cancellable, timed job runner.
#[derive(Parser, Debug)]
#[command(name = "cadence", about = "Run a cancellable, timed job", version)]
struct Args {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the counting job once and print its report and events as JSON
	Run(RunArgs),
	/// Show version and build information
	Version,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
	/// Config file to layer over the defaults (default: /etc/cadence/cadence.toml)
	#[arg(long, env = "CADENCE_CONFIG")]
	config: Option<PathBuf>,

	/// Job group
	#[arg(long)]
	group: Option<String>,

	/// Job name
	#[arg(long)]
	name: Option<String>,

	/// Number of steps to run
	#[arg(long)]
	iterations: Option<u32>,

	/// Delay after each step, in milliseconds
	#[arg(long)]
	step_delay_ms: Option<u64>,

	/// Cancel the invocation after this many milliseconds
	#[arg(long)]
	cancel_after_ms: Option<u64>,
}

impl RunArgs {
	fn overrides(&self) -> RunOverrides {
		RunOverrides {
			group: self.group.clone(),
			name: self.name.clone(),
			iterations: self.iterations,
			step_delay_ms: self.step_delay_ms,
		}
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	let run_args = match args.command {
		Command::Version => {
			println!("{}", version::format_version_info());
			return Ok(());
		}
		Command::Run(run_args) => run_args,
	};

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &run_args.config {
		Some(path) => cadence_config::load_config_with_file(path)?,
		None => cadence_config::load_config()?,
	};

	// Capture boundary and progress events alongside stdout logging
	let event_log = EventLog::with_default_capacity();
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.with(InvocationEventLayer::new(event_log.clone()))
		.init();

	let request = RunRequest::resolve(&config, run_args.overrides())?;

	tracing::info!(
		job_key = %request.job_key,
		iteration_count = request.config.iteration_count,
		step_delay_ms = request.config.step_delay_ms(),
		"starting cadence"
	);

	let executor = JobExecutor::default();
	let report = run_job(
		&executor,
		Arc::new(CountingJob::new()),
		request,
		run_args.cancel_after_ms.map(Duration::from_millis),
	)
	.await?;

	let status = report.status;
	let output = RunOutput::collect(report, &event_log);
	tracing::debug!(events = output.events.len(), "Invocation events captured");

	println!("{}", serde_json::to_string_pretty(&output)?);
	std::process::exit(exit_code(status));
}
