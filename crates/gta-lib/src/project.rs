//! The project being checked.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::identifier::ProjectRoot;

/// Where the project lives on disk and the import path it is known by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
	root_dir: PathBuf,
	import_root: ProjectRoot,
}

impl ProjectContext {
	pub fn new(root_dir: impl Into<PathBuf>, import_root: impl Into<ProjectRoot>) -> Self {
		Self {
			root_dir: root_dir.into(),
			import_root: import_root.into(),
		}
	}

	/// Uses the current directory and the `GOPATH` environment variable, see [`discover()`](ProjectContext::discover()).
	pub fn from_env() -> crate::Result<Self> {
		let working_dir = std::env::current_dir()
			.map_err(|e| crate::Error::ProjectRoot(format!("could not get working directory: {}", e)))?;

		let gopath = std::env::var_os("GOPATH").or_else(|| {
			std::env::var_os("HOME").map(|h| PathBuf::from(h).join("go").into_os_string())
		});

		Self::discover(&working_dir, gopath.as_deref())
	}

	/// Derives the import root of `working_dir` from the first `GOPATH` entry whose `src` directory contains it.
	///
	/// # Errors
	/// [`ProjectRoot`](crate::Error::ProjectRoot) when `working_dir` is not inside any `GOPATH` entry.
	pub fn discover(working_dir: &Path, gopath: Option<&OsStr>) -> crate::Result<Self> {
		let gopath = gopath.ok_or_else(|| crate::Error::ProjectRoot("GOPATH is not set".to_string()))?;

		for entry in std::env::split_paths(gopath).filter(|p| p.is_absolute()) {
			let src = entry.join("src");
			let relative = match pathdiff::diff_paths(working_dir, &src) {
				Some(r) => r,
				None => continue,
			};

			let mut parts = Vec::<&str>::new();
			let mut inside = true;
			for component in relative.components() {
				match component {
					Component::Normal(p) => match p.to_str() {
						Some(p) => parts.push(p),
						None => inside = false,
					},
					_ => inside = false,
				}
			}

			if inside && !parts.is_empty() {
				let import_root = parts.join("/");
				log::debug!("Project at {} has import root {}", working_dir.display(), import_root);
				return Ok(Self::new(working_dir, import_root));
			}
		}

		Err(crate::Error::ProjectRoot(format!("{} is not inside the src directory of any GOPATH entry", working_dir.display())))
	}

	pub fn root_dir(&self) -> &Path {
		&self.root_dir
	}

	pub fn import_root(&self) -> &ProjectRoot {
		&self.import_root
	}
}

#[cfg(all(test, unix))]
mod test {
	use super::*;

	#[test]
	fn import_root_is_relative_to_gopath_src() {
		let project = ProjectContext::discover(Path::new("/home/me/go/src/github.com/me/proj"), Some(OsStr::new("/home/me/go"))).unwrap();
		assert_eq!(project.import_root().as_str(), "github.com/me/proj");
		assert_eq!(project.root_dir(), Path::new("/home/me/go/src/github.com/me/proj"));
	}

	#[test]
	fn later_gopath_entries_are_searched() {
		let project = ProjectContext::discover(Path::new("/work/src/example.org/x"), Some(OsStr::new("/home/me/go:/work"))).unwrap();
		assert_eq!(project.import_root().as_str(), "example.org/x");
	}

	#[test]
	fn outside_gopath_is_an_error() {
		assert!(matches!(ProjectContext::discover(Path::new("/tmp/proj"), Some(OsStr::new("/home/me/go"))), Err(crate::Error::ProjectRoot(_))));
	}

	#[test]
	fn gopath_src_itself_is_not_a_project() {
		assert!(ProjectContext::discover(Path::new("/home/me/go/src"), Some(OsStr::new("/home/me/go"))).is_err());
	}
}
