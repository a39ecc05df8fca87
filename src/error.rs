use crate::schedstat::FormatError;
use crate::delta::MissingCpuError;

use std::io;

use thiserror::Error;

/// Everything that can fail during one sampling cycle.
#[derive(Debug, Error)]
pub enum Error {
	#[error("could not read schedstat: {0}")]
	Io(#[from] io::Error),
	#[error("invalid schedstat format: {0}")]
	Format(#[from] FormatError),
	#[error("unstable sampling window: {0}")]
	MissingCpu(#[from] MissingCpuError),
	#[error("could not serialize graph definitions: {0}")]
	Json(#[from] serde_json::Error)
}
