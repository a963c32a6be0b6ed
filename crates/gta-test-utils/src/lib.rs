//! Various helper functions for testing
//!
//! functions in this module should use results and not use any panics to avoid confusion in callers

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use gta::manifest::{ConstraintSet, Constraint, LockedProject};
use gta::solver::{Solution, SolveError, SolveParameters, Solver};
use gta::source::{SourceError, SourceManager};
use gta::{CandidateVersion, DependencyIdentifier, ProjectContext, ProjectRoot};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("copy error: {0}")]
	FsExtra(#[from] fs_extra::error::Error),
	#[error("walk error: {0}")]
	WalkDir(#[from] walkdir::Error),
	#[error("{0} is not inside {1}")]
	StripPrefix(PathBuf, PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Import root given to scratch projects.
pub const SCRATCH_IMPORT_ROOT: &str = "github.com/me/proj";

/// A [`SourceManager`] serving fixed version lists.
///
/// Exports write a `VERSION` file holding the exported version's name.
#[derive(Default)]
pub struct FakeSourceManager {
	versions: HashMap<ProjectRoot, Vec<CandidateVersion>>,
	failing_exports: HashSet<ProjectRoot>,
	exports: Mutex<Vec<(DependencyIdentifier, CandidateVersion)>>,
}

impl FakeSourceManager {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_versions(mut self, root: &str, versions: impl IntoIterator<Item = CandidateVersion>) -> Self {
		self.versions.entry(ProjectRoot::new(root)).or_default().extend(versions);
		self
	}

	/// Exports of `root` fail as if the version disappeared upstream.
	pub fn with_failing_export(mut self, root: &str) -> Self {
		self.failing_exports.insert(ProjectRoot::new(root));
		self
	}

	/// Every successful export so far, in order.
	pub fn exports(&self) -> Vec<(DependencyIdentifier, CandidateVersion)> {
		self.exports.lock().map(|e| e.clone()).unwrap_or_default()
	}
}

impl SourceManager for FakeSourceManager {
	fn deduce_project_root(&self, import_path: &str) -> std::result::Result<ProjectRoot, SourceError> {
		let (root, _) = gta::identifier::normalize_name(import_path);
		if root.as_str().is_empty() {
			return Err(SourceError::UnknownSource(import_path.to_string()));
		}
		Ok(root)
	}

	fn list_versions(&self, ident: &DependencyIdentifier) -> std::result::Result<Vec<CandidateVersion>, SourceError> {
		Ok(self.versions.get(&ident.root).cloned().unwrap_or_default())
	}

	fn export_project(&self, ident: &DependencyIdentifier, version: &CandidateVersion, target: &Path) -> std::result::Result<(), SourceError> {
		if self.failing_exports.contains(&ident.root) {
			return Err(SourceError::VersionNotFound {
				project: ident.to_string(),
				version: version.to_string(),
			});
		}

		std::fs::create_dir_all(target)?;
		std::fs::write(target.join("VERSION"), version.to_string())?;
		if let Ok(mut exports) = self.exports.lock() {
			exports.push((ident.clone(), version.clone()));
		}
		Ok(())
	}
}

/// A [`Solver`] whose answers are decided up front.
///
/// The solution holds the focal dependency at its pinned version plus every non-focal project of the lock.
pub struct ScriptedSolver {
	focus: ProjectRoot,
	failures: HashMap<String, String>,
	seen: Mutex<Vec<ConstraintSet>>,
}

impl ScriptedSolver {
	pub fn new(focus: &str) -> Self {
		Self {
			focus: ProjectRoot::new(focus),
			failures: HashMap::new(),
			seen: Mutex::new(Vec::new()),
		}
	}

	/// Solving with the focal dependency at `version` fails with `message`.
	pub fn fail_on(mut self, version: &str, message: &str) -> Self {
		self.failures.insert(version.to_string(), message.to_string());
		self
	}

	/// Every manifest handed to the solver, in order.
	pub fn seen(&self) -> Vec<ConstraintSet> {
		self.seen.lock().map(|s| s.clone()).unwrap_or_default()
	}
}

impl Solver for ScriptedSolver {
	fn solve(&self, params: &SolveParameters<'_>) -> std::result::Result<Solution, SolveError> {
		if let Ok(mut seen) = self.seen.lock() {
			seen.push(params.manifest.clone());
		}

		let focus = params.manifest.dependency(&self.focus)
			.ok_or_else(|| SolveError::NoSolution(format!("{} is not a dependency", self.focus)))?;
		let version = match &focus.constraint {
			Constraint::Exact(v) => v,
			c => return Err(SolveError::NoSolution(format!("{} is not pinned: {:?}", self.focus, c))),
		};

		if let Some(message) = self.failures.get(&version.to_string()) {
			return Err(SolveError::NoSolution(message.clone()));
		}

		let locked = params.lock.map(|l| l.projects.as_slice()).unwrap_or_default();
		Ok(Solution::new(
			std::iter::once(LockedProject { ident: focus.ident.clone(), version: version.clone() })
				.chain(locked.iter().filter(|p| p.ident.root != self.focus).cloned())
		))
	}
}

/// A file or directory found by [`snapshot_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEntry {
	Dir,
	File(Vec<u8>),
}

/// Contents of everything below `dir`, keyed by relative path. A missing `dir` gives an empty snapshot.
pub fn snapshot_dir(dir: impl AsRef<Path>) -> Result<BTreeMap<PathBuf, SnapshotEntry>> {
	let dir = dir.as_ref();
	let mut snapshot = BTreeMap::new();
	if !dir.exists() {
		return Ok(snapshot);
	}

	for entry in walkdir::WalkDir::new(dir).min_depth(1) {
		let entry = entry?;
		let relative = entry.path().strip_prefix(dir)
			.map_err(|_| Error::StripPrefix(entry.path().to_path_buf(), dir.to_path_buf()))?
			.to_path_buf();
		let value = if entry.file_type().is_dir() {
			SnapshotEntry::Dir
		} else {
			SnapshotEntry::File(std::fs::read(entry.path())?)
		};
		snapshot.insert(relative, value);
	}
	Ok(snapshot)
}

/// Copies the contents of `fixture` into `target`.
pub fn copy_fixture(fixture: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<()> {
	std::fs::create_dir_all(target.as_ref())?;
	let mut options = fs_extra::dir::CopyOptions::new();
	options.content_only = true;
	options.overwrite = true;
	fs_extra::dir::copy(fixture, target, &options)?;
	Ok(())
}

/// A project in a fresh temporary directory, `files` are written relative to its root.
///
/// The project lives as long as the returned [`tempfile::TempDir`].
pub fn scratch_project(files: &[(&str, &str)]) -> Result<(tempfile::TempDir, ProjectContext)> {
	let dir = tempfile::tempdir()?;
	for (path, content) in files {
		let path = dir.path().join(path);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, content)?;
	}
	let project = ProjectContext::new(dir.path(), SCRATCH_IMPORT_ROOT);
	Ok((dir, project))
}

/// A `Godeps/Godeps.json` body listing `deps` as `(import path, revision)`.
pub fn godeps_json(deps: &[(&str, &str)]) -> String {
	let deps: Vec<String> = deps.iter()
		.map(|(path, rev)| format!(r#"{{ "ImportPath": "{}", "Rev": "{}" }}"#, path, rev))
		.collect();
	format!(r#"{{ "ImportPath": "{}", "GoVersion": "go1.7", "Deps": [ {} ] }}"#, SCRATCH_IMPORT_ROOT, deps.join(", "))
}
