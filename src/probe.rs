//! Takes two snapshots separated by an interval and diffs them.

use crate::schedstat::{Schedstat, SCHEMA_VERSION};
use crate::delta::{diff, ClockTicks, Deltas};
use crate::error::Error;

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
	/// File to read, `/proc/schedstat` by default.
	pub path: PathBuf,
	/// Time between the two reads.
	pub interval: Duration,
	pub clock_ticks: ClockTicks
}

impl Default for ProbeConfig {
	fn default() -> Self {
		Self {
			path: PathBuf::from("/proc/schedstat"),
			interval: Duration::from_secs(1),
			clock_ticks: ClockTicks::from_system().unwrap_or_default()
		}
	}
}

#[derive(Debug, Clone)]
pub struct Probe {
	config: ProbeConfig
}

impl Probe {

	pub fn new(config: ProbeConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &ProbeConfig {
		&self.config
	}

	/// Runs one sampling cycle.
	///
	/// Nothing is kept between calls, a failed cycle does not affect
	/// the next one.
	pub fn sample(&self) -> Result<Deltas, Error> {
		let path = &self.config.path;

		let mut stat = Schedstat::read_from(path)?;
		check_version(&stat);
		let previous = stat.snapshot()?;
		let start = stat.timestamp();

		thread::sleep(self.config.interval);

		stat.reload_from(path)?;
		let observed = unix_secs(SystemTime::now());
		let current = stat.snapshot()?;

		if let (Some(start), Some(end)) = (start, stat.timestamp()) {
			log::debug!(
				"sampled {} cpus over {} jiffies",
				current.len(),
				end.wrapping_sub(start)
			);
		}

		Ok(diff(&previous, &current, self.config.clock_ticks, observed)?)
	}

}

fn check_version(stat: &Schedstat) {
	match stat.version() {
		Some(SCHEMA_VERSION) => {},
		Some(v) => log::warn!(
			"schedstat version {} differs from {}, fields may be misread",
			v, SCHEMA_VERSION
		),
		None => log::warn!("schedstat has no version line")
	}
}

fn unix_secs(time: SystemTime) -> u64 {
	match time.duration_since(UNIX_EPOCH) {
		Ok(d) => d.as_secs(),
		Err(e) => {
			log::warn!(
				"system clock is {:?} before the unix epoch, reporting timestamp 0",
				e.duration()
			);
			0
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use std::fs;

	const FIXTURE: &str = "\
version 15
timestamp 4297299139
cpu0 0 0 96548476 28816741 51484452 21431349 2045936778163039 343796328169361 4767485306
cpu1 0 0 91227418 26820312 48732307 20219916 1967461837547346 327802612356470 4546773102
";

	fn config(path: PathBuf) -> ProbeConfig {
		ProbeConfig {
			path,
			interval: Duration::ZERO,
			clock_ticks: ClockTicks::new(100).unwrap()
		}
	}

	#[test]
	fn default_config() {
		let cfg = ProbeConfig::default();
		assert_eq!(cfg.path, PathBuf::from("/proc/schedstat"));
		assert_eq!(cfg.interval, Duration::from_secs(1));
		assert!(cfg.clock_ticks.get() > 0);
	}

	#[test]
	fn unchanged_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("schedstat");
		fs::write(&path, FIXTURE).unwrap();

		let deltas = Probe::new(config(path)).sample().unwrap();
		assert_eq!(deltas.len(), 2);
		assert!(deltas.timestamp > 0);
		for (_, d) in deltas.iter() {
			assert_eq!(d.run_delay_delta_ticks, 0);
			assert_eq!(d.cpu_time_delta_ticks, 0);
		}
	}

	#[test]
	fn observation_time() {
		let after = UNIX_EPOCH + Duration::from_secs(1700000000);
		assert_eq!(unix_secs(after), 1700000000);

		let before = UNIX_EPOCH - Duration::from_secs(5);
		assert_eq!(unix_secs(before), 0);
	}

	#[test]
	fn missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let probe = Probe::new(config(dir.path().join("nope")));
		assert!(matches!(probe.sample(), Err(Error::Io(_))));
	}

	#[test]
	fn invalid_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("schedstat");
		fs::write(&path, "version 15\ncpu0 1 2 x 4 5 6 7 8 9\n").unwrap();

		let probe = Probe::new(config(path));
		assert!(matches!(probe.sample(), Err(Error::Format(_))));
	}

}
