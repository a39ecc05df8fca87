//!
//! A crate that samples the scheduler statistics from `/proc/schedstat`.  
//! Two snapshots are taken an interval apart and the change of the
//! run queue delay and cpu time counters is reported per cpu.
//!
//! ```no_run
//! use schedstat_probe::probe::{Probe, ProbeConfig};
//! let deltas = Probe::new(ProbeConfig::default()).sample().unwrap();
//! for (cpu, d) in deltas.iter() {
//! 	println!("cpu{} run_delay {:.6}", cpu, d.run_delay_pct);
//! }
//! ```

/// Parse /proc/schedstat.
pub mod schedstat;
/// Diff two snapshots.
pub mod delta;
/// Read, wait, read again.
pub mod probe;
// Plugin output for the monitoring agent.
pub mod plugin;

mod error;
mod util;

pub use error::Error;
pub use schedstat::{parse, Snapshot, CpuSchedRecord, CpuId, FormatError};
pub use delta::{diff, ClockTicks, DeltaRecord, Deltas, MissingCpuError};
