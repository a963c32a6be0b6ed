use super::*;

/// The root project's constraints with the focal dependency taken out.
///
/// Built once per run. Each candidate gets its own copy via [`Baseline::pinned_to()`].
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
	constraints: ConstraintSet,
	focus: DependencyIdentifier,
}

impl Baseline {
	/// Constraints on every project except the focal one.
	pub fn constraints(&self) -> &ConstraintSet {
		&self.constraints
	}

	pub fn focus(&self) -> &DependencyIdentifier {
		&self.focus
	}

	/// A fresh constraint set with the focal dependency pinned to `version`.
	pub fn pinned_to(&self, version: &CandidateVersion) -> ConstraintSet {
		self.constraints.with_focus(ProjectConstraint::new(self.focus.clone(), Constraint::Exact(version.clone())))
	}
}

pub struct BaselineBuilder<'a> {
	focus: ProjectRoot,
	manifest: Option<&'a Manifest>,
	lock: Option<&'a Lock>,
}

impl<'a> BaselineBuilder<'a> {
	pub fn new(focus: ProjectRoot) -> Self {
		Self {
			focus,
			manifest: None,
			lock: None,
		}
	}

	pub fn manifest(mut self, manifest: Option<&'a Manifest>) -> Self {
		self.manifest = manifest;
		self
	}

	pub fn lock(mut self, lock: Option<&'a Lock>) -> Self {
		self.lock = lock;
		self
	}

	/// Copies every non-focal constraint, the first entry for a root wins.
	///
	/// The focal identity is taken from the manifest, then the lock, so a focal dependency fetched
	/// from a fork keeps its source.
	pub fn build(self) -> Baseline {
		let mut constraints = ConstraintSet::default();
		let mut focus: Option<DependencyIdentifier> = None;

		if let Some(manifest) = self.manifest {
			let groups = [
				(&manifest.dependencies, &mut constraints.dependencies),
				(&manifest.test_dependencies, &mut constraints.test_dependencies),
				(&manifest.overrides, &mut constraints.overrides),
			];

			for (source, target) in groups {
				for c in source {
					if c.root() == &self.focus {
						focus.get_or_insert_with(|| c.ident.clone());
						continue;
					}
					if !ConstraintSet::insert_first(target, c.clone()) {
						log::debug!("Dropping duplicate constraint on {}", c.ident);
					}
				}
			}

			constraints.ignored = manifest.ignored.iter().cloned().collect();
		}

		let focus = focus
			.or_else(|| self.lock.and_then(|l| l.get(&self.focus)).map(|p| p.ident.clone()))
			.unwrap_or_else(|| DependencyIdentifier::new(self.focus));

		Baseline {
			constraints,
			focus,
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn dep(root: &str, constraint: Constraint) -> ProjectConstraint { ProjectConstraint::new(ProjectRoot::new(root), constraint) }

	fn manifest() -> Manifest {
		Manifest {
			dependencies: vec![
				dep("github.com/a/a", Constraint::Branch("master".into())),
				dep("github.com/focus/f", Constraint::Version("v1".into())),
				dep("github.com/a/a", Constraint::Branch("other".into())),
			],
			test_dependencies: vec![dep("github.com/t/t", Constraint::Any)],
			overrides: vec![dep("github.com/focus/f", Constraint::Any)],
			ignored: vec!["github.com/ignored/pkg".to_string()],
		}
	}

	#[test]
	fn focus_is_excluded_everywhere() {
		let m = manifest();
		let baseline = BaselineBuilder::new(ProjectRoot::new("github.com/focus/f")).manifest(Some(&m)).build();
		let focus = ProjectRoot::new("github.com/focus/f");
		assert!(baseline.constraints().dependency(&focus).is_none());
		assert!(baseline.constraints().overrides().all(|c| c.root() != &focus));
		assert_eq!(baseline.constraints().test_dependencies().count(), 1);
		assert_eq!(baseline.constraints().ignored().count(), 1);
	}

	#[test]
	fn later_duplicates_are_dropped() {
		let m = manifest();
		let baseline = BaselineBuilder::new(ProjectRoot::new("github.com/focus/f")).manifest(Some(&m)).build();
		assert_eq!(baseline.constraints().dependency(&ProjectRoot::new("github.com/a/a")).unwrap().constraint, Constraint::Branch("master".into()));
	}

	#[test]
	fn building_is_repeatable() {
		let m = manifest();
		let builder = || BaselineBuilder::new(ProjectRoot::new("github.com/focus/f")).manifest(Some(&m)).build();
		assert_eq!(builder(), builder());
	}

	#[test]
	fn focus_source_comes_from_lock_when_manifest_is_silent() {
		let lock = Lock {
			projects: vec![LockedProject {
				ident: DependencyIdentifier::new("github.com/focus/f").with_source("github.com/fork/f"),
				version: CandidateVersion::Revision(crate::version::Revision::new("abc")),
			}],
		};
		let baseline = BaselineBuilder::new(ProjectRoot::new("github.com/focus/f")).lock(Some(&lock)).build();
		assert_eq!(baseline.focus().network_name(), "github.com/fork/f");
	}

	#[test]
	fn pinning_does_not_touch_baseline() {
		let m = manifest();
		let baseline = BaselineBuilder::new(ProjectRoot::new("github.com/focus/f")).manifest(Some(&m)).build();
		let before = baseline.clone();
		let v = crate::version::UnpairedVersion::tag("v1.0.0").into();
		let pinned = baseline.pinned_to(&v);
		assert_eq!(baseline, before);
		assert_eq!(pinned.dependency(&ProjectRoot::new("github.com/focus/f")).unwrap().constraint, Constraint::Exact(v));
	}
}
