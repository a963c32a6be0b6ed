//! Names of the projects taking part in a solve.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Deserialize};

/// The root import path of a project, e.g. `github.com/foo/bar`.
///
/// Every package below the root belongs to the same project and is versioned with it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectRoot(String);

impl ProjectRoot {
	pub fn new(root: impl Into<String>) -> Self {
		Self(root.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ProjectRoot {
	fn from(value: &str) -> Self { Self::new(value) }
}

impl From<String> for ProjectRoot {
	fn from(value: String) -> Self { Self::new(value) }
}

impl AsRef<str> for ProjectRoot {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for ProjectRoot {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Identifies a dependency by its root and, optionally, an alternate location to fetch it from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyIdentifier {
	pub root: ProjectRoot,
	/// Network name of a fork or mirror. `None` fetches from `root`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
}

impl DependencyIdentifier {
	pub fn new(root: impl Into<ProjectRoot>) -> Self {
		Self {
			root: root.into(),
			source: None,
		}
	}

	pub fn with_source(mut self, source: impl Into<String>) -> Self {
		self.source = Some(source.into());
		self
	}

	/// The name used to reach the project over the network.
	pub fn network_name(&self) -> &str {
		self.source.as_deref().unwrap_or(self.root.as_str())
	}
}

impl From<ProjectRoot> for DependencyIdentifier {
	fn from(value: ProjectRoot) -> Self { Self::new(value) }
}

impl std::fmt::Display for DependencyIdentifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.source {
			Some(source) if source != self.root.as_str() => write!(f, "{} (from {})", self.root, source),
			_ => write!(f, "{}", self.root),
		}
	}
}

/// Splits an import path into the root of the project that contains it and the remaining subpackage path.
///
/// Paths pointing into a `vendor/` directory are reduced to the vendored import path first.
/// Hosts with a known layout are cut to their repository root, anything else is taken as a root as-is.
pub fn normalize_name(import_path: &str) -> (ProjectRoot, String) {
	let path = import_path.replace('\\', "/");
	let path = path.trim_matches('/');
	let path = match path.rfind("/vendor/") {
		Some(i) => &path[i + "/vendor/".len()..],
		None => path.strip_prefix("vendor/").unwrap_or(path),
	};

	let root = known_root(path).unwrap_or(path);
	let extra = path[root.len()..].trim_start_matches('/');
	(ProjectRoot::new(root), extra.to_string())
}

fn known_root(path: &str) -> Option<&str> {
	static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
	let patterns = PATTERNS.get_or_init(|| {
		[
			r"^(github\.com|bitbucket\.org|gitlab\.com)/[A-Za-z0-9_.\-]+/[A-Za-z0-9_.\-]+",
			r"^golang\.org/x/[A-Za-z0-9_.\-]+",
			r"^gopkg\.in/([A-Za-z0-9_\-]+/)?[A-Za-z0-9_.\-]+\.v[0-9]+",
		]
		.iter()
		.map(|p| Regex::new(p).expect("root patterns should compile."))
		.collect()
	});

	patterns.iter()
		.find_map(|re| re.find(path))
		.map(|m| &path[..m.end()])
}

#[cfg(test)]
mod test {
	use super::*;

	fn root(path: &str) -> String { normalize_name(path).0.as_str().to_string() }

	#[test] fn github_subpackage_is_cut_to_repo() { assert_eq!(normalize_name("github.com/foo/bar/baz/qux"), (ProjectRoot::new("github.com/foo/bar"), "baz/qux".to_string())) }
	#[test] fn github_root_is_unchanged() { assert_eq!(root("github.com/foo/bar"), "github.com/foo/bar") }
	#[test] fn golang_x_is_cut_to_repo() { assert_eq!(root("golang.org/x/crypto/ssh"), "golang.org/x/crypto") }
	#[test] fn gopkg_in_without_user() { assert_eq!(root("gopkg.in/yaml.v2/sub"), "gopkg.in/yaml.v2") }
	#[test] fn gopkg_in_with_user() { assert_eq!(root("gopkg.in/foo/bar.v1/sub"), "gopkg.in/foo/bar.v1") }
	#[test] fn vendored_path_is_unvendored() { assert_eq!(root("github.com/a/b/vendor/github.com/c/d/e"), "github.com/c/d") }
	#[test] fn unknown_host_is_kept_whole() { assert_eq!(root("example.org/some/deep/pkg/"), "example.org/some/deep/pkg") }

	#[test]
	fn identifier_display_includes_distinct_source() {
		let id = DependencyIdentifier::new("github.com/foo/bar");
		assert_eq!(id.to_string(), "github.com/foo/bar");
		assert_eq!(id.clone().with_source("github.com/foo/bar").to_string(), "github.com/foo/bar");
		assert_eq!(id.with_source("github.com/fork/bar").to_string(), "github.com/foo/bar (from github.com/fork/bar)");
	}
}
