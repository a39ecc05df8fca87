//!
//! The data is retrieved from `/proc/schedstat`
//!
//! ```no_run
//! use schedstat_probe::schedstat::Schedstat;
//! let stat = Schedstat::read().unwrap();
//! let snapshot = stat.snapshot().unwrap();
//! for (cpu, record) in snapshot.iter() {
//! 	println!("cpu{} waited {} ticks", cpu, record.run_delay_ticks);
//! }
//! ```
//!
//! The field layout is described in the kernel documentation
//! [sched-stats](https://docs.kernel.org/scheduler/sched-stats.html).

use crate::util::{read_to_string_mut, parse_u64_token};

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::{fs, io};

use thiserror::Error;

#[cfg(feature = "serde")]
use serde1::Serialize;

/// The schema version the field table below describes.
pub const SCHEMA_VERSION: u32 = 15;

/// Every per cpu line starts with this prefix followed by the identifier.
pub const CPU_PREFIX: &str = "cpu";

/// Width of a cpu record, not counting the `cpu<N>` token.
pub const FIELD_COUNT: usize = 10;

/// Fields needed to reach the last entry in [`FIELDS`].
pub const MIN_FIELD_COUNT: usize = 9;

/// A named counter of a cpu line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
	YieldCount,
	RunQueueSwitchCount,
	RunQueueGoesIdleCount,
	WakeupCount,
	LocalWakeupCount,
	CpuTimeTicks,
	RunDelayTicks,
	ProcessCount
}

/// Position of each field after the `cpu<N>` token.
/// Position 1 is a legacy counter which is always zero and not stored.
pub const FIELDS: [(usize, Field); 8] = [
	(0, Field::YieldCount),
	(2, Field::RunQueueSwitchCount),
	(3, Field::RunQueueGoesIdleCount),
	(4, Field::WakeupCount),
	(5, Field::LocalWakeupCount),
	(6, Field::CpuTimeTicks),
	(7, Field::RunDelayTicks),
	(8, Field::ProcessCount)
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
	#[error("line {line}: `{token}` has no cpu identifier")]
	MissingCpuId { line: usize, token: String },
	#[error("cpu{cpu}: expected {min} to {max} fields, found {found}", min = MIN_FIELD_COUNT, max = FIELD_COUNT)]
	FieldCount { cpu: String, found: usize },
	#[error("cpu{cpu}: field {index} `{value}` is not a non-negative integer")]
	InvalidNumber { cpu: String, index: usize, value: String },
	#[error("cpu{cpu} is listed more than once")]
	DuplicateCpu { cpu: String }
}

/// Read scheduler statistics from /proc/schedstat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedstat {
	raw: String
}

impl Schedstat {

	fn path() -> &'static Path {
		Path::new("/proc/schedstat")
	}

	/// Wraps already read schedstat content.
	pub fn from_string(raw: String) -> Self {
		Self {raw}
	}

	/// Read scheduler statistics from /proc/schedstat.
	pub fn read() -> io::Result<Self> {
		Self::read_from(Self::path())
	}

	/// Read scheduler statistics from another file with the same format.
	pub fn read_from(path: impl AsRef<Path>) -> io::Result<Self> {
		Ok(Self {
			raw: fs::read_to_string(path)?
		})
	}

	/// Reloads information without allocating.
	pub fn reload(&mut self) -> io::Result<()> {
		read_to_string_mut(Self::path(), &mut self.raw)
	}

	/// Reloads information from `path` without allocating.
	pub fn reload_from(&mut self, path: impl AsRef<Path>) -> io::Result<()> {
		read_to_string_mut(path, &mut self.raw)
	}

	/// Returns the raw content.
	pub fn raw(&self) -> &str {
		&self.raw
	}

	fn header(&self, key: &str) -> Option<&str> {
		self.raw.lines()
			.find_map(|line| {
				let (k, v) = line.split_once(' ')?;
				(k == key).then(|| v.trim())
			})
	}

	/// The schema version from the `version` line.
	pub fn version(&self) -> Option<u32> {
		self.header("version")?
			.parse().ok()
	}

	/// Kernel time in jiffies when the file was generated.
	pub fn timestamp(&self) -> Option<u64> {
		self.header("timestamp")?
			.parse().ok()
	}

	/// Parses every cpu line.
	pub fn snapshot(&self) -> Result<Snapshot, FormatError> {
		parse(&self.raw)
	}

}

/// Counters of a single cpu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(crate = "serde1"))]
pub struct CpuSchedRecord {
	/// How many times `sched_yield()` was called.
	pub yield_count: u64,
	/// How many times `schedule()` was called.
	pub run_queue_switch_count: u64,
	/// How many times `schedule()` left the processor idle.
	pub run_queue_goes_idle_count: u64,
	/// How many times `try_to_wake_up()` was called.
	pub wakeup_count: u64,
	/// Wakeups of a task on the local cpu.
	pub local_wakeup_count: u64,
	/// Time spent running tasks, in clock ticks.
	pub cpu_time_ticks: u64,
	/// Time tasks spent waiting to run, in clock ticks.
	pub run_delay_ticks: u64,
	/// Timeslices run on this cpu.
	pub process_count: u64
}

impl CpuSchedRecord {

	/// Returns the value of a field.
	pub fn get(&self, field: Field) -> u64 {
		match field {
			Field::YieldCount => self.yield_count,
			Field::RunQueueSwitchCount => self.run_queue_switch_count,
			Field::RunQueueGoesIdleCount => self.run_queue_goes_idle_count,
			Field::WakeupCount => self.wakeup_count,
			Field::LocalWakeupCount => self.local_wakeup_count,
			Field::CpuTimeTicks => self.cpu_time_ticks,
			Field::RunDelayTicks => self.run_delay_ticks,
			Field::ProcessCount => self.process_count
		}
	}

	fn set(&mut self, field: Field, value: u64) {
		let slot = match field {
			Field::YieldCount => &mut self.yield_count,
			Field::RunQueueSwitchCount => &mut self.run_queue_switch_count,
			Field::RunQueueGoesIdleCount => &mut self.run_queue_goes_idle_count,
			Field::WakeupCount => &mut self.wakeup_count,
			Field::LocalWakeupCount => &mut self.local_wakeup_count,
			Field::CpuTimeTicks => &mut self.cpu_time_ticks,
			Field::RunDelayTicks => &mut self.run_delay_ticks,
			Field::ProcessCount => &mut self.process_count
		};
		*slot = value;
	}

	/// Parses the numeric fields following the `cpu<N>` token.
	fn from_values(cpu: &str, values: &[&str]) -> Result<Self, FormatError> {
		if !(MIN_FIELD_COUNT..=FIELD_COUNT).contains(&values.len()) {
			return Err(FormatError::FieldCount {
				cpu: cpu.into(),
				found: values.len()
			})
		}

		let numbers = values.iter()
			.enumerate()
			.map(|(index, value)| {
				parse_u64_token(value)
					.ok_or_else(|| FormatError::InvalidNumber {
						cpu: cpu.into(),
						index,
						value: value.to_string()
					})
			})
			.collect::<Result<Vec<_>, _>>()?;

		let mut record = Self::default();
		for &(index, field) in FIELDS.iter() {
			record.set(field, numbers[index]);
		}
		Ok(record)
	}

}

/// The part of the `cpu<N>` token after the prefix.
///
/// Numeric identifiers sort by their value so `cpu2` comes before `cpu10`,
/// anything else sorts after them by text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(crate = "serde1", transparent))]
pub struct CpuId(String);

impl CpuId {

	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	fn number(&self) -> Option<u64> {
		self.0.parse().ok()
	}

}

impl Ord for CpuId {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self.number(), other.number()) {
			(Some(a), Some(b)) => a.cmp(&b)
				.then_with(|| self.0.cmp(&other.0)),
			(Some(_), None) => Ordering::Less,
			(None, Some(_)) => Ordering::Greater,
			(None, None) => self.0.cmp(&other.0)
		}
	}
}

impl PartialOrd for CpuId {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Every cpu record of one read, keyed by the cpu identifier (`cpu3` -> `3`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(crate = "serde1"))]
pub struct Snapshot {
	cpus: BTreeMap<CpuId, CpuSchedRecord>
}

impl Snapshot {

	pub fn get(&self, cpu: &str) -> Option<&CpuSchedRecord> {
		self.cpus.get(&CpuId::new(cpu))
	}

	pub fn contains(&self, cpu: &str) -> bool {
		self.cpus.contains_key(&CpuId::new(cpu))
	}

	/// Returns every cpu identifier, ordered by cpu number.
	pub fn cpus<'a>(&'a self) -> impl Iterator<Item=&'a str> {
		self.cpus.keys()
			.map(CpuId::as_str)
	}

	pub fn iter<'a>(&'a self) -> impl Iterator<Item=(&'a str, &'a CpuSchedRecord)> {
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

impl FromStr for Snapshot {
	type Err = FormatError;

	fn from_str(s: &str) -> Result<Self, FormatError> {
		parse(s)
	}
}

/// Parses every line starting with `cpu` into a [`Snapshot`].
/// Other lines (`version`, `timestamp`, `domain<N>`) are skipped.
/// Any invalid cpu line fails the whole parse.
pub fn parse(raw: &str) -> Result<Snapshot, FormatError> {
	let mut cpus = BTreeMap::new();

	for (nr, line) in raw.lines().enumerate() {
		let mut tokens = line.split_whitespace();
		let cpu = match tokens.next()
			.and_then(|t| t.strip_prefix(CPU_PREFIX).map(|id| (t, id)))
		{
			Some((token, "")) => return Err(FormatError::MissingCpuId {
				line: nr + 1,
				token: token.into()
			}),
			Some((_, id)) => id,
			None => continue
		};

		let values: Vec<_> = tokens.collect();
		let record = CpuSchedRecord::from_values(cpu, &values)?;

		if cpus.insert(CpuId::new(cpu), record).is_some() {
			return Err(FormatError::DuplicateCpu { cpu: cpu.into() })
		}
	}

	Ok(Snapshot { cpus })
}
