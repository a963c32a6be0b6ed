//! The versions of the focal dependency, in the order they are tried.

use crate::identifier::DependencyIdentifier;
use crate::source::SourceManager;
use crate::version::{sort_for_upgrade, CandidateVersion, VersionSpec};

#[derive(Debug, Clone)]
pub struct VersionCatalog {
	ident: DependencyIdentifier,
	versions: Vec<CandidateVersion>,
}

impl VersionCatalog {
	/// Lists every version `sources` knows for `ident`.
	///
	/// # Errors
	/// - [`Source`](crate::Error::Source) when the listing fails.
	/// - [`NoVersionsFound`](crate::Error::NoVersionsFound) when the listing is empty.
	pub fn fetch(sources: &dyn SourceManager, ident: &DependencyIdentifier) -> crate::Result<Self> {
		let versions = sources.list_versions(ident)?;
		Self::from_versions(ident.clone(), versions)
	}

	pub fn from_versions(ident: DependencyIdentifier, mut versions: Vec<CandidateVersion>) -> crate::Result<Self> {
		if versions.is_empty() {
			return Err(crate::Error::NoVersionsFound(ident));
		}

		sort_for_upgrade(&mut versions);
		log::debug!("Found {} versions of {}", versions.len(), ident);
		Ok(Self { ident, versions })
	}

	pub fn ident(&self) -> &DependencyIdentifier {
		&self.ident
	}

	/// All versions, most preferred first.
	pub fn versions(&self) -> &[CandidateVersion] {
		&self.versions
	}

	pub fn len(&self) -> usize {
		self.versions.len()
	}

	/// Never true, a catalog can't be built without versions.
	pub fn is_empty(&self) -> bool {
		self.versions.is_empty()
	}

	/// Versions matching `spec`, keeping catalog order.
	///
	/// # Errors
	/// [`NoMatchingVersions`](crate::Error::NoMatchingVersions) when nothing matches.
	pub fn filter(&self, spec: &VersionSpec) -> crate::Result<Vec<CandidateVersion>> {
		let matching: Vec<CandidateVersion> = self.versions.iter()
			.filter(|v| spec.matches(v))
			.cloned()
			.collect();

		if matching.is_empty() {
			return Err(crate::Error::NoMatchingVersions {
				root: self.ident.root.clone(),
				total: self.versions.len(),
				spec: spec.to_string(),
			});
		}

		log::debug!("{} of {} versions of {} match {}", matching.len(), self.versions.len(), self.ident, spec);
		Ok(matching)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::version::{Revision, UnpairedVersion};

	fn catalog() -> VersionCatalog {
		let rev = |s: &str| Revision::new(s);
		VersionCatalog::from_versions(DependencyIdentifier::new("github.com/foo/bar"), vec![
			UnpairedVersion::branch("master").pair(rev("1111111")),
			UnpairedVersion::tag("v1.0.0").pair(rev("2222222")),
			UnpairedVersion::tag("v1.1.0").pair(rev("3333333")),
			UnpairedVersion::tag("v2.0.0").pair(rev("4444444")),
		]).unwrap()
	}

	fn names(versions: &[CandidateVersion]) -> Vec<String> {
		versions.iter().map(|v| v.to_string()).collect()
	}

	#[test]
	fn versions_are_in_upgrade_order() {
		assert_eq!(names(catalog().versions()), ["v2.0.0", "v1.1.0", "v1.0.0", "master"]);
	}

	#[test]
	fn any_keeps_everything() {
		let catalog = catalog();
		assert_eq!(catalog.filter(&VersionSpec::Any).unwrap(), catalog.versions());
	}

	#[test]
	fn range_keeps_order() {
		let matching = catalog().filter(&VersionSpec::semver_range("^1").unwrap()).unwrap();
		assert_eq!(names(&matching), ["v1.1.0", "v1.0.0"]);
	}

	#[test]
	fn missing_branch_is_an_error() {
		match catalog().filter(&VersionSpec::Branch("develop".into())) {
			Err(crate::Error::NoMatchingVersions { root, total, spec }) => {
				assert_eq!(root.as_str(), "github.com/foo/bar");
				assert_eq!(total, 4);
				assert_eq!(spec, "branch develop");
			},
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn empty_listing_is_an_error() {
		let result = VersionCatalog::from_versions(DependencyIdentifier::new("github.com/foo/bar"), vec![]);
		assert!(matches!(result, Err(crate::Error::NoVersionsFound(_))));
	}
}
