//! Versions of a project as reported by its source.
//!
//! # Format
//! A version is one of
//! - a bare [`Revision`], the immutable id of a commit.
//! - an [`UnpairedVersion`], a movable name such as a tag or branch.
//! - a paired version, a name together with the revision it pointed at when listed.

use std::cmp::Ordering;

use serde::{Serialize, Deserialize};

mod spec;
pub use spec::VersionSpec;

/// Number of characters of a revision hash shown in listings.
pub const REVISION_DISPLAY_LEN: usize = 7;

/// An immutable commit id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
	pub fn new(hash: impl Into<String>) -> Self {
		Self(hash.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// The hash truncated to [`REVISION_DISPLAY_LEN`] characters.
	pub fn short(&self) -> &str {
		self.0.get(..REVISION_DISPLAY_LEN).unwrap_or(&self.0)
	}
}

impl std::fmt::Display for Revision {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// A version name not tied to a revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum UnpairedVersion {
	/// A tag that reads as a semantic version, see [`parse_semver`].
	Semver(String),
	/// Any other tag.
	Plain(String),
	Branch(String),
}

impl UnpairedVersion {
	/// Classifies a tag name as [`Semver`](UnpairedVersion::Semver) or [`Plain`](UnpairedVersion::Plain).
	pub fn tag(name: impl Into<String>) -> Self {
		let name = name.into();
		if parse_semver(&name).is_some() {
			UnpairedVersion::Semver(name)
		} else {
			UnpairedVersion::Plain(name)
		}
	}

	pub fn branch(name: impl Into<String>) -> Self {
		UnpairedVersion::Branch(name.into())
	}

	pub fn name(&self) -> &str {
		match self {
			UnpairedVersion::Semver(n) | UnpairedVersion::Plain(n) | UnpairedVersion::Branch(n) => n,
		}
	}

	pub fn semver(&self) -> Option<semver::Version> {
		match self {
			UnpairedVersion::Semver(n) => parse_semver(n),
			_ => None,
		}
	}

	pub fn pair(self, revision: Revision) -> CandidateVersion {
		CandidateVersion::Paired(self, revision)
	}
}

impl std::fmt::Display for UnpairedVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name())
	}
}

/// One version of the focal dependency, or of any project in a solution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateVersion {
	Revision(Revision),
	Unpaired(UnpairedVersion),
	Paired(UnpairedVersion, Revision),
}

impl CandidateVersion {
	pub fn unpaired(&self) -> Option<&UnpairedVersion> {
		match self {
			CandidateVersion::Revision(_) => None,
			CandidateVersion::Unpaired(u) | CandidateVersion::Paired(u, _) => Some(u),
		}
	}

	pub fn revision(&self) -> Option<&Revision> {
		match self {
			CandidateVersion::Revision(r) | CandidateVersion::Paired(_, r) => Some(r),
			CandidateVersion::Unpaired(_) => None,
		}
	}

	/// Something a source can check out, preferring the revision over the movable name.
	pub fn checkout_ref(&self) -> &str {
		match self {
			CandidateVersion::Revision(r) | CandidateVersion::Paired(_, r) => r.as_str(),
			CandidateVersion::Unpaired(u) => u.name(),
		}
	}

	/// Long form used in listings, revisions are truncated to [`REVISION_DISPLAY_LEN`].
	pub fn describe(&self) -> String {
		match self {
			CandidateVersion::Revision(r) => r.short().to_string(),
			CandidateVersion::Unpaired(u) => u.to_string(),
			CandidateVersion::Paired(u, r) => format!("{} ({})", u, r.short()),
		}
	}
}

impl From<UnpairedVersion> for CandidateVersion {
	fn from(value: UnpairedVersion) -> Self { CandidateVersion::Unpaired(value) }
}

impl From<Revision> for CandidateVersion {
	fn from(value: Revision) -> Self { CandidateVersion::Revision(value) }
}

impl std::fmt::Display for CandidateVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			CandidateVersion::Revision(r) => write!(f, "{}", r),
			CandidateVersion::Unpaired(u) | CandidateVersion::Paired(u, _) => write!(f, "{}", u),
		}
	}
}

/// Parses a tag as a semantic version.
///
/// Tags are commonly written `v1.2.3` or shortened to `1.2`, both are accepted.
pub fn parse_semver(text: &str) -> Option<semver::Version> {
	let text = text.strip_prefix('v').unwrap_or(text);
	if let Ok(v) = semver::Version::parse(text) {
		return Some(v);
	}

	let split = text.find(|c: char| c == '-' || c == '+').unwrap_or(text.len());
	let (core, rest) = text.split_at(split);
	let padding = match core.split('.').count() {
		1 => ".0.0",
		2 => ".0",
		_ => return None,
	};
	semver::Version::parse(&format!("{}{}{}", core, padding, rest)).ok()
}

/// Sorts versions so the ones most worth trying come first.
///
/// 1. semver releases, newest first, then semver prereleases, newest first.
/// 1. branches, alphabetically.
/// 1. other tags, alphabetically.
/// 1. bare revisions, alphabetically.
///
/// Paired and unpaired forms of a version sort together, the sort is stable.
pub fn sort_for_upgrade(versions: &mut [CandidateVersion]) {
	versions.sort_by(upgrade_order);
}

/// Comparison used by [`sort_for_upgrade`], `Less` means tried earlier.
pub fn upgrade_order(lhs: &CandidateVersion, rhs: &CandidateVersion) -> Ordering {
	fn class(v: &CandidateVersion) -> (u8, Option<semver::Version>) {
		match v.unpaired() {
			Some(u @ UnpairedVersion::Semver(_)) => match u.semver() {
				Some(sv) if sv.pre.is_empty() => (0, Some(sv)),
				Some(sv) => (1, Some(sv)),
				None => (3, None),
			},
			Some(UnpairedVersion::Branch(_)) => (2, None),
			Some(UnpairedVersion::Plain(_)) => (3, None),
			None => (4, None),
		}
	}

	let (lhs_class, lhs_semver) = class(lhs);
	let (rhs_class, rhs_semver) = class(rhs);

	match lhs_class.cmp(&rhs_class) {
		Ordering::Equal => {},
		ord => return ord,
	}

	match (lhs_semver, rhs_semver) {
		(Some(l), Some(r)) => r.cmp(&l),
		_ => lhs.to_string().cmp(&rhs.to_string()),
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn tag(s: &str) -> CandidateVersion { UnpairedVersion::tag(s).into() }
	fn sorted(mut v: Vec<CandidateVersion>) -> Vec<String> { sort_for_upgrade(&mut v); v.iter().map(|v| v.to_string()).collect() }

	#[test] fn v_prefix_is_semver() { assert!(matches!(UnpairedVersion::tag("v1.2.3"), UnpairedVersion::Semver(_))) }
	#[test] fn short_version_is_semver() { assert_eq!(parse_semver("v1.2"), Some(semver::Version::new(1, 2, 0))) }
	#[test] fn short_prerelease_keeps_prerelease() { assert_eq!(parse_semver("1-beta").map(|v| v.pre.to_string()), Some("beta".to_string())) }
	#[test] fn words_are_plain() { assert!(matches!(UnpairedVersion::tag("release-candidate"), UnpairedVersion::Plain(_))) }
	#[test] fn semver_is_not_compared_lexically() { assert_eq!(sorted(vec![tag("v1.2.4"), tag("v1.2.10")]), ["v1.2.10", "v1.2.4"]) }
	#[test] fn prereleases_follow_all_releases() { assert_eq!(sorted(vec![tag("v2.0.0-rc1"), tag("v1.0.0"), tag("v1.1.0")]), ["v1.1.0", "v1.0.0", "v2.0.0-rc1"]) }

	#[test]
	fn classes_are_ordered() {
		let versions = vec![
			CandidateVersion::Revision(Revision::new("abcdef0123")),
			tag("beta"),
			UnpairedVersion::branch("master").into(),
			tag("alpha"),
			UnpairedVersion::branch("develop").into(),
			tag("v0.1.0"),
		];
		assert_eq!(sorted(versions), ["v0.1.0", "develop", "master", "alpha", "beta", "abcdef0123"]);
	}

	#[test]
	fn paired_and_unpaired_sort_together() {
		let paired = UnpairedVersion::tag("v1.0.0").pair(Revision::new("ffff"));
		assert_eq!(upgrade_order(&paired, &tag("v1.0.0")), Ordering::Equal);
	}

	#[test]
	fn describe_truncates_revisions() {
		let rev = Revision::new("0123456789abcdef");
		assert_eq!(CandidateVersion::Revision(rev.clone()).describe(), "0123456");
		assert_eq!(UnpairedVersion::tag("v1.0.0").pair(rev.clone()).describe(), "v1.0.0 (0123456)");
		assert_eq!(UnpairedVersion::tag("v1.0.0").pair(rev).to_string(), "v1.0.0");
	}
}
