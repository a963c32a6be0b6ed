use crate::catalog::VersionCatalog;
use crate::identifier::DependencyIdentifier;
use crate::manifest::{BaselineBuilder, ProjectAnalyzer};
use crate::project::ProjectContext;
use crate::report::{CandidateCheck, Report, ResultAggregator};
use crate::solver::Solver;
use crate::source::SourceManager;
use crate::sweep::{CompatibilityMatrixRunner, OutcomeRecord, SweepObserver};
use crate::validation::ValidationRunner;
use crate::vendor::VendorTreeTransaction;
use crate::{Config, SweepOptions};

/// The external services a run depends on.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
	pub sources: &'a dyn SourceManager,
	pub solver: &'a dyn Solver,
	pub analyzer: &'a dyn ProjectAnalyzer,
	pub observer: &'a dyn SweepObserver,
}

/// Every candidate solved, nothing on disk touched yet.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedSweep {
	focus: DependencyIdentifier,
	outcomes: Vec<OutcomeRecord>,
}

/// Solves the root project once for each version of the dependency named in `options`.
///
/// This only reads the project, so stopping part way needs no cleanup.
///
/// # Errors
/// Only for problems that stop the whole run, a candidate that fails to solve is recorded in the result.
pub fn solve(options: &SweepOptions, project: &ProjectContext, collaborators: &Collaborators<'_>) -> crate::Result<SolvedSweep> {
	let root = collaborators.sources.deduce_project_root(&options.dependency)?;
	log::debug!("{} belongs to project {}", options.dependency, root);

	let (manifest, lock) = collaborators.analyzer.derive_manifest_and_lock(project.root_dir(), project.import_root())?;
	let baseline = BaselineBuilder::new(root)
		.manifest(manifest.as_ref())
		.lock(lock.as_ref())
		.build();

	let catalog = VersionCatalog::fetch(collaborators.sources, baseline.focus())?;
	let candidates = catalog.filter(&options.spec)?;
	log::info!("Checking {} versions of {}", candidates.len(), baseline.focus());

	let outcomes = CompatibilityMatrixRunner::new(collaborators.solver, &baseline, lock.as_ref(), project)
		.with_observer(collaborators.observer)
		.sweep(&candidates);

	Ok(SolvedSweep {
		focus: baseline.focus().clone(),
		outcomes,
	})
}

impl SolvedSweep {
	pub fn focus(&self) -> &DependencyIdentifier {
		&self.focus
	}

	pub fn outcomes(&self) -> &[OutcomeRecord] {
		&self.outcomes
	}

	/// Runs the validation command of `options` against each solution and builds the report.
	///
	/// Each solution is written to `vendor` and checked in turn, with the project's own `vendor`
	/// directory set aside for the duration and restored afterwards. Dropping the returned future
	/// part way also restores it. Without a command the report holds the solve results only.
	///
	/// # Errors
	/// When the project's `vendor` directory can't be set aside. A candidate that fails to be
	/// written or to validate, and a failure to restore `vendor` afterwards, are recorded in the [`Report`].
	pub async fn check(self, config: &Config, options: &SweepOptions, project: &ProjectContext, collaborators: &Collaborators<'_>) -> crate::Result<Report> {
		let mut aggregator = ResultAggregator::new(self.focus, options.run.is_some());

		let command = match &options.run {
			Some(c) => c.clone(),
			None => {
				self.outcomes.into_iter().for_each(|o| aggregator.record(o, None));
				return Ok(aggregator.finish());
			},
		};

		let validator = ValidationRunner::new(command, project.root_dir())
			.with_timeout(config.validation_timeout());
		let transaction = VendorTreeTransaction::begin(project.root_dir(), collaborators.sources)?;

		for outcome in self.outcomes {
			let solution = match outcome.solution() {
				Some(s) => s,
				None => {
					aggregator.record(outcome, None);
					continue;
				},
			};

			let check = match transaction.materialize(solution) {
				Ok(()) => {
					let result = validator.run(&outcome.version).await;
					if let Err(e) = transaction.remove() {
						log::warn!("Failed to remove vendor tree for {}: {}", outcome.version, e);
					}
					CandidateCheck::Validated(result)
				},
				Err(e) => {
					log::warn!("Could not write tree for {}: {}", outcome.version, e);
					CandidateCheck::TreeWriteFailed(e.to_string())
				},
			};
			aggregator.record(outcome, Some(check));
		}

		if let Err(e) = transaction.finish() {
			log::error!("Failed to restore vendor folder: {}", e);
			aggregator.restore_failed(e.to_string());
		}
		Ok(aggregator.finish())
	}
}

/// Sweeps the dependency named in `options` across its matching versions, [`solve()`] then [`SolvedSweep::check()`].
pub async fn run(config: &Config, options: &SweepOptions, project: &ProjectContext, collaborators: &Collaborators<'_>) -> crate::Result<Report> {
	solve(options, project, collaborators)?
		.check(config, options, project, collaborators)
		.await
}
