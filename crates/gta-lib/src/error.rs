//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

use crate::identifier::{DependencyIdentifier, ProjectRoot};

/// Errors that abort a run.
///
/// Failures scoped to a single candidate version are not represented here,
/// see [`crate::solver::SolveError`] and [`crate::vendor::TreeWriteError`].
#[derive(Debug, Error)]
pub enum Error {
	#[error("{0}")]
	Argument(String),
	#[error("{0}")]
	InvalidConstraintSpec(String),
	#[error("could not determine project root: {0}")]
	ProjectRoot(String),
	#[error("error on trying to read project manifest and lock: {0}")]
	Manifest(String),
	#[error("source error: {0}")]
	Source(#[from] crate::source::SourceError),
	#[error("no versions could be located for {0}")]
	NoVersionsFound(DependencyIdentifier),
	#[error("{root} has {total} versions, but none matched constraint {spec}")]
	NoMatchingVersions {
		root: ProjectRoot,
		total: usize,
		spec: String,
	},
	#[error("{0}")]
	Backup(#[from] crate::vendor::BackupError),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
}
