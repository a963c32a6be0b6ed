//! The interface to the dependency solver.
//!
//! Solving itself is not done here, a [`Solver`] is handed the constraints for one candidate version
//! and either finds a [`Solution`] or explains why there is none.

use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::identifier::ProjectRoot;
use crate::manifest::{ConstraintSet, Lock, LockedProject};

mod external;
pub use external::ExternalSolver;

/// Everything a solver is given for a single solve.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SolveParameters<'a> {
	pub manifest: &'a ConstraintSet,
	/// Preferred versions, a solver may move away from them.
	pub lock: Option<&'a Lock>,
	pub root_dir: &'a Path,
	pub import_root: &'a ProjectRoot,
}

/// A version for every project the root project transitively depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
	projects: Vec<LockedProject>,
}

impl Solution {
	/// Projects are kept sorted by root, the first entry for a root wins.
	pub fn new(projects: impl IntoIterator<Item = LockedProject>) -> Self {
		let mut projects: Vec<LockedProject> = projects.into_iter().collect();
		projects.sort_by(|a, b| a.ident.root.cmp(&b.ident.root));
		projects.dedup_by(|later, earlier| later.ident.root == earlier.ident.root);
		Self { projects }
	}

	pub fn projects(&self) -> &[LockedProject] {
		&self.projects
	}

	pub fn get(&self, root: &ProjectRoot) -> Option<&LockedProject> {
		self.projects.iter().find(|p| &p.ident.root == root)
	}
}

/// Why a solve failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
	/// The constraints can't be satisfied, the message comes from the solver.
	#[error("{0}")]
	NoSolution(String),
	#[error("failed to run solver: {0}")]
	Spawn(String),
	#[error("solver produced unreadable output: {0}")]
	Protocol(String),
}

pub trait Solver {
	/// Solves synchronously, there is no timeout.
	fn solve(&self, params: &SolveParameters<'_>) -> Result<Solution, SolveError>;
}
