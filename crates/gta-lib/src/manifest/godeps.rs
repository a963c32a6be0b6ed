//! Importing of legacy `Godeps/Godeps.json` files.
//!
//! Godeps only records the revision each import path was built with. Every project is imported
//! without a version constraint and the revision goes into the lock, so the solver prefers it but
//! can move away from it.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::*;
use crate::identifier::normalize_name;
use crate::version::Revision;

/// The subset of a Godeps file that is read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Godeps {
	#[serde(default)]
	import_path: String,
	#[serde(default)]
	deps: Vec<GodepsDependency>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GodepsDependency {
	import_path: String,
	#[serde(default)]
	comment: Option<String>,
	rev: String,
}

pub fn godeps_path(dir: impl AsRef<Path>) -> PathBuf {
	dir.as_ref().join("Godeps").join("Godeps.json")
}

/// Checks if `dir` contains a Godeps file.
pub fn has(dir: impl AsRef<Path>) -> bool {
	godeps_path(dir).is_file()
}

/// Reads the Godeps file in `dir` as a manifest and lock.
///
/// Import paths are reduced to their project roots and only the first entry for each root is kept,
/// later entries for the same root are dropped even when they name a different revision.
///
/// # Errors
/// - [`IO`](crate::Error::IO) when the file can't be opened.
/// - [`SerdeJSON`](crate::Error::SerdeJSON) when the file isn't a Godeps file.
pub fn as_metadata_pair(dir: impl AsRef<Path>) -> crate::Result<(Manifest, Lock)> {
	let path = godeps_path(dir);
	log::debug!("Parsing Godeps metadata from {}", path.display());

	let file = std::fs::File::open(&path)?;
	let godeps: Godeps = serde_json::from_reader(std::io::BufReader::new(file))?;

	Ok(import(godeps))
}

fn import(godeps: Godeps) -> (Manifest, Lock) {
	let mut manifest = Manifest::default();
	let mut lock = Lock::default();
	let mut seen = std::collections::HashSet::<ProjectRoot>::new();

	for dep in godeps.deps {
		let (root, _) = normalize_name(&dep.import_path);
		if !seen.insert(root.clone()) {
			log::trace!("Skipping {}, {} is already imported", dep.import_path, root);
			continue;
		}

		if let Some(comment) = &dep.comment {
			log::trace!("Importing {} at {} ({})", root, dep.rev, comment);
		}

		/* TODO: Godeps doesn't separate test imports, everything lands in `dependencies` until imports are analyzed. */
		manifest.dependencies.push(ProjectConstraint::new(root.clone(), Constraint::Any));
		lock.projects.push(LockedProject {
			ident: DependencyIdentifier::new(root),
			version: CandidateVersion::Revision(Revision::new(dep.rev)),
		});
	}

	if godeps.import_path.is_empty() {
		log::warn!("Godeps file has no ImportPath");
	}

	(manifest, lock)
}

/// A [`ProjectAnalyzer`] reading `Godeps/Godeps.json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GodepsAnalyzer;

impl ProjectAnalyzer for GodepsAnalyzer {
	fn derive_manifest_and_lock(&self, root_dir: &Path, import_root: &ProjectRoot) -> crate::Result<(Option<Manifest>, Option<Lock>)> {
		if !has(root_dir) {
			log::debug!("No Godeps file found for {}", import_root);
			return Ok((None, None));
		}

		let (manifest, lock) = as_metadata_pair(root_dir)
			.map_err(|e| crate::Error::Manifest(format!("{}: {}", godeps_path(root_dir).display(), e)))?;
		log::info!("Found Godeps.json file in {}, imported {} projects", import_root, manifest.dependencies.len());
		Ok((Some(manifest), Some(lock)))
	}
}
