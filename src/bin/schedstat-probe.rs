//! Prints per cpu run delay and cpu time for the mackerel agent.
//!
//! Definitions are printed when `MACKEREL_AGENT_PLUGIN_META` is set
//! or `--definitions` is passed.

use schedstat_probe::ClockTicks;
use schedstat_probe::plugin::{Mode, Plugin, META_ENV};
use schedstat_probe::probe::{Probe, ProbeConfig};

use std::env;
use std::ffi::OsStr;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "schedstat-probe")]
#[command(about = "Report per cpu run queue delay and cpu time from /proc/schedstat")]
#[command(version)]
struct Cli {
	/// File to read
	#[arg(long, default_value = "/proc/schedstat")]
	path: PathBuf,

	/// Milliseconds between the two reads
	#[arg(long, default_value_t = 1000)]
	interval_ms: u64,

	/// Clock ticks per second, defaults to the rate of this system
	#[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
	clock_ticks: Option<u64>,

	/// Prefix of every metric name
	#[arg(long, default_value = "schedstat")]
	metric_key_prefix: String,

	/// Print graph definitions instead of values
	#[arg(long)]
	definitions: bool
}

impl Cli {
	fn config(&self) -> ProbeConfig {
		let clock_ticks = self.clock_ticks
			.and_then(ClockTicks::new)
			.or_else(ClockTicks::from_system)
			.unwrap_or_default();

		ProbeConfig {
			path: self.path.clone(),
			interval: Duration::from_millis(self.interval_ms),
			clock_ticks
		}
	}

	fn mode(&self) -> Mode {
		self.mode_from(env::var_os(META_ENV).as_deref())
	}

	/// `--definitions` wins over the agent variable.
	fn mode_from(&self, meta: Option<&OsStr>) -> Mode {
		if self.definitions {
			return Mode::Definitions
		}
		Mode::from_meta_env(meta)
	}
}

fn main() -> ExitCode {
	env_logger::init();

	let cli = Cli::parse();
	let config = cli.config();
	log::debug!("{:?}", config);

	let probe = Probe::new(config);
	let plugin = Plugin::new(cli.metric_key_prefix.as_str());

	match plugin.dispatch(cli.mode(), &probe, io::stdout().lock()) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			log::error!("{}", e);
			ExitCode::FAILURE
		}
	}
}
