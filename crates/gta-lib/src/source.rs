//! Access to the sources of dependencies.

use std::path::Path;

use crate::identifier::{DependencyIdentifier, ProjectRoot};
use crate::version::CandidateVersion;

mod git;
pub use git::GitSourceManager;

/// Errors from a [`SourceManager`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	/// The import path doesn't map to a known project layout.
	#[error("could not detect source info for {0}")]
	UnknownSource(String),
	#[error("version {version} of {project} is not available")]
	VersionNotFound {
		project: String,
		version: String,
	},
	#[error("`git {command}` failed: {stderr}")]
	Git {
		command: String,
		stderr: String,
	},
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
}

/// Lists and fetches versions of projects.
pub trait SourceManager {
	/// Reduces an import path to the root of the project containing it.
	fn deduce_project_root(&self, import_path: &str) -> Result<ProjectRoot, SourceError>;

	/// Every version the project's source currently offers, in no particular order.
	fn list_versions(&self, ident: &DependencyIdentifier) -> Result<Vec<CandidateVersion>, SourceError>;

	/// Writes the project's files at `version` into `target`, without any VCS metadata.
	fn export_project(&self, ident: &DependencyIdentifier, version: &CandidateVersion, target: &Path) -> Result<(), SourceError>;
}
