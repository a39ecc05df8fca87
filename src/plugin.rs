//!
//! Output in the format the mackerel agent expects from a plugin.
//!
//! When the agent sets `MACKEREL_AGENT_PLUGIN_META` the plugin prints its
//! graph definitions, otherwise one line per metric:
//! `<name>\t<value>\t<unix timestamp>`.

use crate::delta::Deltas;
use crate::probe::Probe;
use crate::error::Error;

use std::ffi::OsStr;
use std::io::Write;

use serde_json::json;

/// Environment variable the agent sets to request definitions.
pub const META_ENV: &str = "MACKEREL_AGENT_PLUGIN_META";

const META_HEADER: &str = "# mackerel-agent-plugin";

/// Metric names below a cpu, with the value that gets reported.
const METRICS: [&str; 2] = ["run_delay", "cpu_time"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
	/// Print graph definitions.
	Definitions,
	/// Sample and print values.
	Values
}

impl Mode {

	/// Selects the mode from the value of [`META_ENV`].
	/// A set and non empty value means definitions.
	pub fn from_meta_env(value: Option<&OsStr>) -> Self {
		match value {
			Some(v) if !v.is_empty() => Self::Definitions,
			_ => Self::Values
		}
	}

}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
	prefix: String
}

impl Plugin {

	pub fn new(prefix: impl Into<String>) -> Self {
		Self { prefix: prefix.into() }
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	pub fn write_definitions<W: Write>(&self, mut w: W) -> Result<(), Error> {
		let metrics: Vec<_> = METRICS.iter()
			.map(|name| json!({
				"name": name,
				"label": name,
				"stacked": false
			}))
			.collect();

		let graph_key = format!("{}.cpu.#", self.prefix);
		let defs = json!({
			"graphs": {
				graph_key: {
					"label": "CPU Schedstat",
					"unit": "float",
					"metrics": metrics
				}
			}
		});

		writeln!(w, "{}", META_HEADER)?;
		serde_json::to_writer(&mut w, &defs)?;
		writeln!(w)?;
		Ok(())
	}

	pub fn write_values<W: Write>(&self, mut w: W, deltas: &Deltas) -> Result<(), Error> {
		for (cpu, d) in deltas.iter() {
			for (name, value) in METRICS.iter().zip([d.run_delay_pct, d.cpu_time_pct]) {
				writeln!(
					w, "{}.cpu.cpu{}.{}\t{:.6}\t{}",
					self.prefix, cpu, name, value, deltas.timestamp
				)?;
			}
		}
		Ok(())
	}

	/// Prints definitions or samples `probe` once and prints the values.
	pub fn dispatch<W: Write>(&self, mode: Mode, probe: &Probe, w: W) -> Result<(), Error> {
		match mode {
			Mode::Definitions => self.write_definitions(w),
			Mode::Values => {
				let deltas = probe.sample()?;
				log::debug!("reporting {} cpus", deltas.len());
				self.write_values(w, &deltas)
			}
		}
	}

}

impl Default for Plugin {
	fn default() -> Self {
		Self::new("schedstat")
	}
}
