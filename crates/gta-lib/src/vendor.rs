//! Writing solutions into the root project's `vendor` directory.
//!
//! A sweep writes many trees into the same location. [`VendorTreeTransaction`] moves whatever the
//! project had there aside first and puts it back when it ends, whether it ends normally,
//! with an error or by unwinding.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::solver::Solution;
use crate::source::{SourceError, SourceManager};

pub const VENDOR_DIR: &str = "vendor";
pub const BACKUP_DIR: &str = "_origvendor";
/// Where a solution tree that could not be deleted is moved, so the original can still be put back.
pub const LEFTOVER_DIR: &str = "_gtaleftover";

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
	/// A backup from an earlier run was never restored, it may hold the user's only copy of their vendor tree.
	#[error("failed to back up vendor folder: {0} already exists, restore or remove it first")]
	StaleBackup(PathBuf),
	#[error("failed to back up vendor folder: {0}")]
	IO(#[from] io::Error),
}

/// Failure to write one solution, only that candidate's check is skipped.
#[derive(Debug, thiserror::Error)]
pub enum TreeWriteError {
	#[error("IO error: {0}")]
	IO(#[from] io::Error),
	#[error("{0} is not a valid project root")]
	InvalidRoot(String),
	#[error("failed to export {project}: {source}")]
	Export {
		project: String,
		source: SourceError,
	},
}

/// Exclusive use of `<root>/vendor` for the lifetime of the value.
pub struct VendorTreeTransaction<'s> {
	vendor: PathBuf,
	backup: PathBuf,
	has_backup: bool,
	sources: &'s dyn SourceManager,
	remove_tree: fn(&Path) -> io::Result<()>,
	released: bool,
}

impl<'s> VendorTreeTransaction<'s> {
	/// Moves an existing `vendor` directory to `_origvendor`.
	///
	/// # Errors
	/// - [`BackupError::StaleBackup`] when `_origvendor` already exists, nothing is touched.
	/// - [`BackupError::IO`] when the move fails.
	pub fn begin(root_dir: &Path, sources: &'s dyn SourceManager) -> Result<Self, BackupError> {
		let vendor = root_dir.join(VENDOR_DIR);
		let backup = root_dir.join(BACKUP_DIR);

		if backup.symlink_metadata().is_ok() {
			return Err(BackupError::StaleBackup(backup));
		}

		let has_backup = match vendor.symlink_metadata() {
			Ok(_) => {
				log::debug!("Backing up {} to {}", vendor.display(), backup.display());
				std::fs::rename(&vendor, &backup)?;
				true
			},
			Err(e) if e.kind() == io::ErrorKind::NotFound => false,
			Err(e) => return Err(e.into()),
		};

		Ok(Self {
			vendor,
			backup,
			has_backup,
			sources,
			remove_tree: remove_path,
			released: false,
		})
	}

	pub fn vendor_path(&self) -> &Path {
		&self.vendor
	}

	/// Replaces the vendor directory with the projects of `solution`, each at `vendor/<root>`.
	///
	/// On failure the partial tree is removed again.
	pub fn materialize(&self, solution: &Solution) -> Result<(), TreeWriteError> {
		self.remove()?;
		std::fs::create_dir_all(&self.vendor)?;

		let result = solution.projects().iter().try_for_each(|project| {
			let root = project.ident.root.as_str();
			let relative = Path::new(root);
			if root.is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
				return Err(TreeWriteError::InvalidRoot(root.to_string()));
			}

			log::debug!("Writing {}@{} to vendor", project.ident, project.version.describe());
			self.sources.export_project(&project.ident, &project.version, &self.vendor.join(relative))
				.map_err(|source| TreeWriteError::Export {
					project: project.ident.to_string(),
					source,
				})
		});

		if result.is_err() {
			if let Err(e) = self.remove() {
				log::warn!("Failed to clean up partial vendor tree: {}", e);
			}
		}
		result
	}

	/// Deletes the vendor directory if there is one.
	pub fn remove(&self) -> io::Result<()> {
		(self.remove_tree)(&self.vendor)
	}

	/// Ends the transaction, putting the original vendor directory back.
	pub fn finish(mut self) -> io::Result<()> {
		self.restore()
	}

	/// Puts the original back even when the last solution tree cannot be deleted.
	///
	/// The transaction only counts as released once the original is back in place, so a failed
	/// attempt is retried on drop.
	fn restore(&mut self) -> io::Result<()> {
		if self.released {
			return Ok(());
		}

		let removal = match self.remove() {
			Err(e) if self.vendor.symlink_metadata().is_ok() => {
				let leftover = self.leftover_path();
				log::warn!("Failed to remove solution tree, moving it to {}: {}", leftover.display(), e);
				std::fs::rename(&self.vendor, &leftover)?;
				Err(io::Error::new(e.kind(), format!("could not remove solution tree, it was left at {}: {}", leftover.display(), e)))
			},
			other => other,
		};

		if self.has_backup {
			log::debug!("Restoring {} from {}", self.vendor.display(), self.backup.display());
			std::fs::rename(&self.backup, &self.vendor)?;
		}
		self.released = true;
		removal
	}

	/// First of `_gtaleftover`, `_gtaleftover.1`, ... that does not exist yet.
	fn leftover_path(&self) -> PathBuf {
		let parent = self.vendor.parent().unwrap_or_else(|| Path::new("."));
		let mut path = parent.join(LEFTOVER_DIR);
		let mut n = 0;
		while path.symlink_metadata().is_ok() {
			n += 1;
			path = parent.join(format!("{}.{}", LEFTOVER_DIR, n));
		}
		path
	}
}

fn remove_path(path: &Path) -> io::Result<()> {
	match path.symlink_metadata() {
		Ok(m) if m.is_dir() => std::fs::remove_dir_all(path),
		Ok(_) => std::fs::remove_file(path),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(e),
	}
}

impl Drop for VendorTreeTransaction<'_> {
	fn drop(&mut self) {
		if let Err(e) = self.restore() {
			log::error!("Failed to restore vendor folder, the original is at {}: {}", self.backup.display(), e);
		}
	}
}

#[cfg(test)]
mod test {
	use std::sync::Mutex;

	use super::*;
	use crate::identifier::{DependencyIdentifier, ProjectRoot};
	use crate::manifest::LockedProject;
	use crate::version::{CandidateVersion, UnpairedVersion};

	/// Writes a `VERSION` file, fails for roots containing `broken`.
	#[derive(Default)]
	struct Sources {
		exported: Mutex<Vec<String>>,
	}

	impl SourceManager for Sources {
		fn deduce_project_root(&self, import_path: &str) -> Result<ProjectRoot, SourceError> {
			Ok(ProjectRoot::new(import_path))
		}

		fn list_versions(&self, _: &DependencyIdentifier) -> Result<Vec<CandidateVersion>, SourceError> {
			Ok(vec![])
		}

		fn export_project(&self, ident: &DependencyIdentifier, version: &CandidateVersion, target: &Path) -> Result<(), SourceError> {
			if ident.root.as_str().contains("broken") {
				return Err(SourceError::UnknownSource(ident.to_string()));
			}
			std::fs::create_dir_all(target)?;
			std::fs::write(target.join("VERSION"), version.to_string())?;
			self.exported.lock().unwrap().push(ident.to_string());
			Ok(())
		}
	}

	fn solution(roots: &[&str]) -> Solution {
		Solution::new(roots.iter().map(|r| LockedProject {
			ident: DependencyIdentifier::new(*r),
			version: UnpairedVersion::tag("v1.0.0").into(),
		}))
	}

	fn project_with_vendor() -> tempfile::TempDir {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir_all(dir.path().join("vendor/github.com/old/dep")).unwrap();
		std::fs::write(dir.path().join("vendor/github.com/old/dep/main.go"), "package dep").unwrap();
		dir
	}

	#[test]
	fn original_vendor_is_restored() {
		let dir = project_with_vendor();
		let sources = Sources::default();

		let tx = VendorTreeTransaction::begin(dir.path(), &sources).unwrap();
		assert!(dir.path().join(BACKUP_DIR).is_dir());
		tx.materialize(&solution(&["github.com/a/a"])).unwrap();
		assert_eq!(std::fs::read_to_string(dir.path().join("vendor/github.com/a/a/VERSION")).unwrap(), "v1.0.0");
		assert!(!dir.path().join("vendor/github.com/old").exists());
		tx.finish().unwrap();

		assert_eq!(std::fs::read_to_string(dir.path().join("vendor/github.com/old/dep/main.go")).unwrap(), "package dep");
		assert!(!dir.path().join(BACKUP_DIR).exists());
		assert!(!dir.path().join("vendor/github.com/a").exists());
	}

	#[test]
	fn no_vendor_means_none_after() {
		let dir = tempfile::tempdir().unwrap();
		let sources = Sources::default();

		let tx = VendorTreeTransaction::begin(dir.path(), &sources).unwrap();
		tx.materialize(&solution(&["github.com/a/a"])).unwrap();
		tx.finish().unwrap();

		assert!(!dir.path().join(VENDOR_DIR).exists());
		assert!(!dir.path().join(BACKUP_DIR).exists());
	}

	#[test]
	fn stale_backup_is_refused() {
		let dir = project_with_vendor();
		std::fs::create_dir(dir.path().join(BACKUP_DIR)).unwrap();
		let sources = Sources::default();

		assert!(matches!(VendorTreeTransaction::begin(dir.path(), &sources), Err(BackupError::StaleBackup(_))));
		assert!(dir.path().join("vendor/github.com/old/dep/main.go").is_file());
	}

	#[test]
	fn failed_export_leaves_no_partial_tree() {
		let dir = tempfile::tempdir().unwrap();
		let sources = Sources::default();

		let tx = VendorTreeTransaction::begin(dir.path(), &sources).unwrap();
		let result = tx.materialize(&solution(&["github.com/a/a", "github.com/broken/b"]));
		assert!(matches!(result, Err(TreeWriteError::Export { .. })));
		assert!(!tx.vendor_path().exists());
	}

	#[test]
	fn escaping_roots_are_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let sources = Sources::default();

		let tx = VendorTreeTransaction::begin(dir.path(), &sources).unwrap();
		assert!(matches!(tx.materialize(&solution(&["../outside"])), Err(TreeWriteError::InvalidRoot(_))));
		assert!(!dir.path().join("outside").exists());
		assert!(sources.exported.lock().unwrap().is_empty());
	}

	fn read_only(_: &Path) -> io::Result<()> {
		Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
	}

	#[test]
	fn undeletable_tree_is_moved_aside() {
		let dir = project_with_vendor();
		std::fs::create_dir(dir.path().join(LEFTOVER_DIR)).unwrap();
		let sources = Sources::default();

		let mut tx = VendorTreeTransaction::begin(dir.path(), &sources).unwrap();
		tx.materialize(&solution(&["github.com/a/a"])).unwrap();
		tx.remove_tree = read_only;
		let result = tx.finish();

		let message = result.unwrap_err().to_string();
		assert!(message.contains("_gtaleftover.1"), "{}", message);
		assert_eq!(std::fs::read_to_string(dir.path().join("vendor/github.com/old/dep/main.go")).unwrap(), "package dep");
		assert!(!dir.path().join(BACKUP_DIR).exists());
		assert_eq!(std::fs::read_to_string(dir.path().join("_gtaleftover.1/github.com/a/a/VERSION")).unwrap(), "v1.0.0");
	}

	#[test]
	fn unwinding_restores_vendor() {
		let dir = project_with_vendor();
		let sources = Sources::default();

		let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
			let tx = VendorTreeTransaction::begin(dir.path(), &sources).unwrap();
			tx.materialize(&solution(&["github.com/a/a"])).unwrap();
			panic!("interrupted");
		}));

		assert!(result.is_err());
		assert!(dir.path().join("vendor/github.com/old/dep/main.go").is_file());
		assert!(!dir.path().join(BACKUP_DIR).exists());
	}
}
