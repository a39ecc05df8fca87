//!
//! Compares two [`Snapshot`]s and scales the change of the run delay and
//! cpu time counters into a percentage.
//!
//! ```
//! use schedstat_probe::delta::{diff, ClockTicks};
//! use schedstat_probe::schedstat::Snapshot;
//!
//! let prev: Snapshot = "cpu0 0 0 1 2 3 4 1000 200 7".parse().unwrap();
//! let curr: Snapshot = "cpu0 0 0 1 2 3 4 1500 260 7".parse().unwrap();
//! let ticks = ClockTicks::new(100).unwrap();
//! let deltas = diff(&prev, &curr, ticks, 1700000000).unwrap();
//! assert_eq!(deltas.get("0").unwrap().run_delay_delta_ticks, 60);
//! ```

use crate::schedstat::{Snapshot, CpuSchedRecord, CpuId};
use crate::util;

use std::collections::BTreeMap;
use std::num::NonZeroU64;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde1::Serialize;

/// A cpu was present in the first snapshot but not in the second.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cpu{cpu} disappeared between snapshots")]
pub struct MissingCpuError {
	pub cpu: String
}

/// Clock ticks per second (`USER_HZ`), never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockTicks(NonZeroU64);

impl ClockTicks {

	pub fn new(ticks: u64) -> Option<Self> {
		NonZeroU64::new(ticks).map(Self)
	}

	/// The rate the running kernel reports.
	pub fn from_system() -> Option<Self> {
		util::clock_ticks()
			.and_then(Self::new)
	}

	pub fn get(&self) -> u64 {
		self.0.get()
	}

	/// `delta / (hz² * 1000) * 100`
	pub fn normalize(&self, delta_ticks: i64) -> f64 {
		let hz = self.get() as f64;
		delta_ticks as f64 / (hz * hz * 1000.0) * 100.0
	}

}

/// 100, the value most architectures use.
const DEFAULT_TICKS: NonZeroU64 = match NonZeroU64::new(100) {
	Some(t) => t,
	None => unreachable!()
};

impl Default for ClockTicks {
	fn default() -> Self {
		Self(DEFAULT_TICKS)
	}
}

/// Change of one cpu over the sampling window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(crate = "serde1"))]
pub struct DeltaRecord {
	pub run_delay_delta_ticks: i64,
	pub cpu_time_delta_ticks: i64,
	pub run_delay_pct: f64,
	pub cpu_time_pct: f64
}

impl DeltaRecord {

	/// Computes `current - previous` without clamping, a counter reset
	/// results in a negative delta.
	pub fn between(
		previous: &CpuSchedRecord,
		current: &CpuSchedRecord,
		ticks: ClockTicks
	) -> Self {
		let run_delay = signed_delta(previous.run_delay_ticks, current.run_delay_ticks);
		let cpu_time = signed_delta(previous.cpu_time_ticks, current.cpu_time_ticks);

		Self {
			run_delay_delta_ticks: run_delay,
			cpu_time_delta_ticks: cpu_time,
			run_delay_pct: ticks.normalize(run_delay),
			cpu_time_pct: ticks.normalize(cpu_time)
		}
	}

}

fn signed_delta(previous: u64, current: u64) -> i64 {
	current.wrapping_sub(previous) as i64
}

/// Result of one sampling cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(crate = "serde1"))]
pub struct Deltas {
	/// Seconds since the unix epoch when the second snapshot was taken.
	pub timestamp: u64,
	cpus: BTreeMap<CpuId, DeltaRecord>
}

impl Deltas {

	pub fn get(&self, cpu: &str) -> Option<&DeltaRecord> {
		self.cpus.get(&CpuId::new(cpu))
	}

	/// Ordered by cpu number.
	pub fn iter<'a>(&'a self) -> impl Iterator<Item=(&'a str, &'a DeltaRecord)> {
		self.cpus.iter()
			.map(|(k, v)| (k.as_str(), v))
	}

	pub fn len(&self) -> usize {
		self.cpus.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cpus.is_empty()
	}

}

/// Diffs every cpu of `previous` against `current`.
///
/// Cpus which only exist in `current` are skipped. A cpu missing
/// from `current` returns an error since the window can't be trusted.
pub fn diff(
	previous: &Snapshot,
	current: &Snapshot,
	ticks: ClockTicks,
	timestamp: u64
) -> Result<Deltas, MissingCpuError> {
	let cpus = previous.iter()
		.map(|(cpu, prev)| {
			let curr = current.get(cpu)
				.ok_or_else(|| MissingCpuError { cpu: cpu.into() })?;
			Ok((CpuId::new(cpu), DeltaRecord::between(prev, curr, ticks)))
		})
		.collect::<Result<BTreeMap<_, _>, _>>()?;

	for cpu in current.cpus().filter(|cpu| !previous.contains(cpu)) {
		log::debug!("cpu{} appeared after the first snapshot, skipping", cpu);
	}

	Ok(Deltas { timestamp, cpus })
}
