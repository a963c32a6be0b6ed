//! A [`SourceManager`] backed by the `git` executable.
//!
//! Each project gets a bare mirror in the cache directory, fetched at most once per process.
//! Versions are exported with `git archive` so the tree never contains a `.git` directory.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use super::*;
use crate::identifier::normalize_name;
use crate::version::{Revision, UnpairedVersion};

pub struct GitSourceManager {
	cache_dir: PathBuf,
	https_only: bool,
	/// Mirrors already brought up to date.
	synced: Mutex<HashSet<PathBuf>>,
}

impl GitSourceManager {
	pub fn new(config: &crate::Config) -> Self {
		Self {
			cache_dir: config.cache_dir().join("sources"),
			https_only: config.https_only(),
			synced: Default::default(),
		}
	}

	fn remote_url(&self, ident: &DependencyIdentifier) -> String {
		let name = ident.network_name();
		if name.contains("://") {
			name.to_string()
		} else if self.https_only {
			format!("https://{}", name)
		} else {
			format!("git://{}", name)
		}
	}

	fn mirror_path(&self, ident: &DependencyIdentifier) -> PathBuf {
		let name: String = ident.network_name()
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '-' })
			.collect();
		self.cache_dir.join(name)
	}

	fn git(args: &[&str]) -> Result<Vec<u8>, SourceError> {
		log::trace!("Running git {}", args.join(" "));
		let output = Command::new("git")
			.args(args)
			.env("GIT_TERMINAL_PROMPT", "0")
			.output()?;

		if output.status.success() {
			Ok(output.stdout)
		} else {
			Err(SourceError::Git {
				command: args.join(" "),
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			})
		}
	}

	/// Clones or updates the mirror for `ident`, returning its path.
	fn sync_mirror(&self, ident: &DependencyIdentifier) -> Result<PathBuf, SourceError> {
		let mirror = self.mirror_path(ident);
		let mut synced = self.synced.lock().unwrap_or_else(|e| e.into_inner());
		if synced.contains(&mirror) {
			return Ok(mirror);
		}

		let mirror_str = mirror.to_string_lossy().to_string();
		if mirror.exists() {
			log::debug!("Updating mirror of {} in {}", ident, mirror.display());
			Self::git(&["--git-dir", &mirror_str, "remote", "update", "--prune"])?;
		} else {
			log::info!("Mirroring {} into {}", ident, mirror.display());
			std::fs::create_dir_all(&self.cache_dir)?;
			Self::git(&["clone", "--mirror", "--quiet", &self.remote_url(ident), &mirror_str])?;
		}

		synced.insert(mirror.clone());
		Ok(mirror)
	}
}

impl SourceManager for GitSourceManager {
	fn deduce_project_root(&self, import_path: &str) -> Result<ProjectRoot, SourceError> {
		let (root, _) = normalize_name(import_path);
		if root.as_str().is_empty() || !root.as_str().contains('.') {
			return Err(SourceError::UnknownSource(import_path.to_string()));
		}
		Ok(root)
	}

	fn list_versions(&self, ident: &DependencyIdentifier) -> Result<Vec<CandidateVersion>, SourceError> {
		log::debug!("Listing versions of {}", ident);
		let out = Self::git(&["ls-remote", "--heads", "--tags", &self.remote_url(ident)])?;
		Ok(parse_ls_remote(&String::from_utf8_lossy(&out)))
	}

	fn export_project(&self, ident: &DependencyIdentifier, version: &CandidateVersion, target: &Path) -> Result<(), SourceError> {
		let mirror = self.sync_mirror(ident)?;
		let mirror_str = mirror.to_string_lossy().to_string();

		log::debug!("Exporting {}@{} to {}", ident, version.describe(), target.display());
		let archive = Self::git(&["--git-dir", &mirror_str, "archive", "--format=tar", version.checkout_ref()])
			.map_err(|e| match e {
				SourceError::Git { .. } => SourceError::VersionNotFound {
					project: ident.to_string(),
					version: version.to_string(),
				},
				e => e,
			})?;

		std::fs::create_dir_all(target)?;
		tar::Archive::new(archive.as_slice()).unpack(target)?;
		Ok(())
	}
}

/// Turns `git ls-remote` output into paired versions.
///
/// Annotated tags are listed twice, the peeled `^{}` line names the commit and wins.
fn parse_ls_remote(output: &str) -> Vec<CandidateVersion> {
	let mut branches = Vec::<(String, Revision)>::new();
	let mut tags = BTreeMap::<String, Revision>::new();
	let mut peeled = BTreeMap::<String, Revision>::new();

	for line in output.lines() {
		let (hash, refname) = match line.split_once('\t') {
			Some((h, r)) => (h.trim(), r.trim()),
			None => continue,
		};

		if let Some(branch) = refname.strip_prefix("refs/heads/") {
			branches.push((branch.to_string(), Revision::new(hash)));
		} else if let Some(tag) = refname.strip_prefix("refs/tags/") {
			match tag.strip_suffix("^{}") {
				Some(tag) => { peeled.insert(tag.to_string(), Revision::new(hash)); },
				None => { tags.insert(tag.to_string(), Revision::new(hash)); },
			}
		}
	}

	let mut versions = branches.into_iter()
		.map(|(name, rev)| UnpairedVersion::branch(name).pair(rev))
		.collect::<Vec<_>>();

	for (name, rev) in tags {
		let rev = peeled.remove(&name).unwrap_or(rev);
		versions.push(UnpairedVersion::tag(name).pair(rev));
	}

	versions
}

#[cfg(test)]
mod test {
	use super::*;

	const LS_REMOTE: &str = "\
aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\tHEAD
aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\trefs/heads/master
bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb\trefs/tags/v1.0.0
cccccccccccccccccccccccccccccccccccccccc\trefs/tags/v1.0.0^{}
dddddddddddddddddddddddddddddddddddddddd\trefs/tags/nightly
eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee\trefs/pull/1/head
";

	#[test]
	fn peeled_tags_win() {
		let versions = parse_ls_remote(LS_REMOTE);
		let v1 = versions.iter().find(|v| v.to_string() == "v1.0.0").unwrap();
		assert_eq!(v1.revision().unwrap().as_str(), "cccccccccccccccccccccccccccccccccccccccc");
	}

	#[test]
	fn only_heads_and_tags_are_listed() {
		let versions = parse_ls_remote(LS_REMOTE);
		let names: Vec<_> = versions.iter().map(|v| v.to_string()).collect();
		assert_eq!(names, ["master", "nightly", "v1.0.0"]);
		assert!(matches!(versions[0].unpaired(), Some(UnpairedVersion::Branch(_))));
		assert!(matches!(versions[1].unpaired(), Some(UnpairedVersion::Plain(_))));
	}

	#[test]
	fn remote_url_defaults_to_https() {
		let sources = GitSourceManager::new(&crate::Config::default());
		assert_eq!(sources.remote_url(&DependencyIdentifier::new("github.com/foo/bar")), "https://github.com/foo/bar");
		assert_eq!(sources.remote_url(&DependencyIdentifier::new("github.com/foo/bar").with_source("ssh://git@host/bar")), "ssh://git@host/bar");
	}

	#[test]
	fn remote_url_without_https() {
		let mut config = crate::Config::default();
		config.set_https_only(false);
		let sources = GitSourceManager::new(&config);
		assert_eq!(sources.remote_url(&DependencyIdentifier::new("github.com/foo/bar")), "git://github.com/foo/bar");
	}

	#[test]
	fn deduce_rejects_hostless_paths() {
		let config = crate::Config::default();
		let sources = GitSourceManager::new(&config);
		assert!(matches!(sources.deduce_project_root("fmt"), Err(SourceError::UnknownSource(_))));
		assert_eq!(sources.deduce_project_root("github.com/foo/bar/baz").unwrap().as_str(), "github.com/foo/bar");
	}
}
