//! Solving the root project once per candidate version of the focal dependency.

use crate::identifier::DependencyIdentifier;
use crate::manifest::{Baseline, Lock};
use crate::project::ProjectContext;
use crate::solver::{Solution, SolveError, SolveParameters, Solver};
use crate::version::CandidateVersion;

/// How solving went for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord {
	pub version: CandidateVersion,
	pub result: Result<Solution, SolveError>,
}

impl OutcomeRecord {
	pub fn solution(&self) -> Option<&Solution> {
		self.result.as_ref().ok()
	}

	pub fn solved(&self) -> bool {
		self.result.is_ok()
	}
}

/// Told about a sweep's progress as it happens. `()` ignores everything.
pub trait SweepObserver {
	fn planned(&self, _focus: &DependencyIdentifier, _candidates: &[CandidateVersion]) {}
	fn solving(&self, _focus: &DependencyIdentifier, _version: &CandidateVersion) {}
	fn solved(&self, _focus: &DependencyIdentifier, _outcome: &OutcomeRecord) {}
	/// Every candidate has been solved.
	fn swept(&self, _focus: &DependencyIdentifier) {}
}

impl SweepObserver for () {}

/// Runs the solver against the baseline pinned to each candidate in turn.
///
/// The baseline is only ever read, every candidate gets a fresh copy of the constraints.
pub struct CompatibilityMatrixRunner<'a> {
	solver: &'a dyn Solver,
	baseline: &'a Baseline,
	lock: Option<&'a Lock>,
	project: &'a ProjectContext,
	observer: &'a dyn SweepObserver,
}

impl<'a> CompatibilityMatrixRunner<'a> {
	pub fn new(solver: &'a dyn Solver, baseline: &'a Baseline, lock: Option<&'a Lock>, project: &'a ProjectContext) -> Self {
		Self {
			solver,
			baseline,
			lock,
			project,
			observer: &(),
		}
	}

	pub fn with_observer(mut self, observer: &'a dyn SweepObserver) -> Self {
		self.observer = observer;
		self
	}

	pub fn solve_for(&self, version: &CandidateVersion) -> OutcomeRecord {
		let focus = self.baseline.focus();
		log::info!("Looking for solution with {}@{}...", focus.root, version);
		self.observer.solving(focus, version);

		let manifest = self.baseline.pinned_to(version);
		let params = SolveParameters {
			manifest: &manifest,
			lock: self.lock,
			root_dir: self.project.root_dir(),
			import_root: self.project.import_root(),
		};

		let result = self.solver.solve(&params);
		match &result {
			Ok(s) => log::info!("Solved with {}@{}, {} projects", focus.root, version, s.projects().len()),
			Err(e) => log::info!("No solution with {}@{}: {}", focus.root, version, e),
		}

		let outcome = OutcomeRecord {
			version: version.clone(),
			result,
		};
		self.observer.solved(focus, &outcome);
		outcome
	}

	/// One outcome per candidate, in the order given. A failed solve doesn't stop the sweep.
	pub fn sweep(&self, candidates: &[CandidateVersion]) -> Vec<OutcomeRecord> {
		self.observer.planned(self.baseline.focus(), candidates);
		let outcomes = candidates.iter().map(|v| self.solve_for(v)).collect();
		self.observer.swept(self.baseline.focus());
		outcomes
	}
}
