//! Constraints the root project places on its dependencies, and the lock it was last built with.
//!
//! Manifests and locks are read by a [`ProjectAnalyzer`]. The only format understood natively is
//! the legacy [`godeps`] import list.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::identifier::{DependencyIdentifier, ProjectRoot};
use crate::version::CandidateVersion;

pub mod godeps;

mod baseline;
pub use baseline::Baseline;
pub use baseline::BaselineBuilder;

/// A version requirement on a single project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Constraint {
	#[default] Any,
	Branch(String),
	Version(String),
	/// A semver range expression.
	Semver(String),
	/// Exactly this version, used to pin the focal dependency.
	Exact(CandidateVersion),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConstraint {
	pub ident: DependencyIdentifier,
	#[serde(default)]
	pub constraint: Constraint,
}

impl ProjectConstraint {
	pub fn new(ident: impl Into<DependencyIdentifier>, constraint: Constraint) -> Self {
		Self {
			ident: ident.into(),
			constraint,
		}
	}

	pub fn root(&self) -> &ProjectRoot {
		&self.ident.root
	}
}

/// A root project's manifest as read from disk, duplicates and all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
	pub dependencies: Vec<ProjectConstraint>,
	pub test_dependencies: Vec<ProjectConstraint>,
	pub overrides: Vec<ProjectConstraint>,
	/// Import paths the solver should not follow.
	pub ignored: Vec<String>,
}

/// A project pinned by a lock or chosen by a solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedProject {
	pub ident: DependencyIdentifier,
	pub version: CandidateVersion,
}

/// Versions the root project was last built with. Solvers treat these as preferences, not requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
	pub projects: Vec<LockedProject>,
}

impl Lock {
	pub fn get(&self, root: &ProjectRoot) -> Option<&LockedProject> {
		self.projects.iter().find(|p| &p.ident.root == root)
	}
}

/// The deduplicated constraints handed to a solver.
///
/// Only [`BaselineBuilder`] fills a set, after that it is only ever copied with [`with_focus()`](ConstraintSet::with_focus()).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
	dependencies: BTreeMap<ProjectRoot, ProjectConstraint>,
	test_dependencies: BTreeMap<ProjectRoot, ProjectConstraint>,
	overrides: BTreeMap<ProjectRoot, ProjectConstraint>,
	ignored: BTreeSet<String>,
}

impl ConstraintSet {
	pub fn dependencies(&self) -> impl Iterator<Item = &ProjectConstraint> {
		self.dependencies.values()
	}

	pub fn test_dependencies(&self) -> impl Iterator<Item = &ProjectConstraint> {
		self.test_dependencies.values()
	}

	pub fn overrides(&self) -> impl Iterator<Item = &ProjectConstraint> {
		self.overrides.values()
	}

	pub fn ignored(&self) -> impl Iterator<Item = &String> {
		self.ignored.iter()
	}

	pub fn dependency(&self, root: &ProjectRoot) -> Option<&ProjectConstraint> {
		self.dependencies.get(root)
	}

	pub fn test_dependency(&self, root: &ProjectRoot) -> Option<&ProjectConstraint> {
		self.test_dependencies.get(root)
	}

	/// A copy of this set with `focus` as a normal dependency, replacing any entry for the same root.
	pub fn with_focus(&self, focus: ProjectConstraint) -> ConstraintSet {
		let mut set = self.clone();
		set.test_dependencies.remove(focus.root());
		set.overrides.remove(focus.root());
		set.dependencies.insert(focus.root().clone(), focus);
		set
	}

	/// Returns `false` and keeps the existing entry when `root` is already present.
	fn insert_first(map: &mut BTreeMap<ProjectRoot, ProjectConstraint>, constraint: ProjectConstraint) -> bool {
		match map.entry(constraint.root().clone()) {
			std::collections::btree_map::Entry::Occupied(_) => false,
			std::collections::btree_map::Entry::Vacant(e) => {
				e.insert(constraint);
				true
			},
		}
	}
}

/// Reads the root project's manifest and lock.
pub trait ProjectAnalyzer {
	/// `None` means the project has no manifest, or no lock, in a format this analyzer understands.
	fn derive_manifest_and_lock(&self, root_dir: &Path, import_root: &ProjectRoot) -> crate::Result<(Option<Manifest>, Option<Lock>)>;
}
