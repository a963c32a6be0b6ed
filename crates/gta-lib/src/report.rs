//! Summarizing a run, one line per candidate and an overall verdict.

use crate::identifier::DependencyIdentifier;
use crate::solver::Solution;
use crate::sweep::OutcomeRecord;
use crate::validation::ValidationResult;

/// What happened after a candidate was solved, only present when validation was requested.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateCheck {
	Validated(ValidationResult),
	/// The solution couldn't be written to `vendor`, the command was not run.
	TreeWriteFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
	pub outcome: OutcomeRecord,
	pub check: Option<CandidateCheck>,
}

impl ReportEntry {
	pub fn passed(&self) -> bool {
		self.outcome.solved() && match &self.check {
			None => true,
			Some(CandidateCheck::Validated(r)) => r.passed(),
			Some(CandidateCheck::TreeWriteFailed(_)) => false,
		}
	}

	fn status_line(&self, focus: &DependencyIdentifier) -> String {
		let nv = format!("{}@{}", focus.root, self.outcome.version);
		match (&self.outcome.result, &self.check) {
			(Err(e), _) => format!("{} failed solving: {}", nv, e),
			(Ok(_), Some(CandidateCheck::TreeWriteFailed(e))) => format!("skipping check: could not write tree for {} (err {})", nv, e),
			(Ok(_), Some(CandidateCheck::Validated(r))) if !r.passed() => format!("{} failed with {}", nv, r.status),
			(Ok(_), _) => format!("{} succeeded", nv),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
	Pass,
	Fail,
}

/// Collects entries in sweep order.
pub struct ResultAggregator {
	focus: DependencyIdentifier,
	validation_requested: bool,
	entries: Vec<ReportEntry>,
	restore_error: Option<String>,
}

impl ResultAggregator {
	pub fn new(focus: DependencyIdentifier, validation_requested: bool) -> Self {
		Self {
			focus,
			validation_requested,
			entries: Vec::new(),
			restore_error: None,
		}
	}

	pub fn record(&mut self, outcome: OutcomeRecord, check: Option<CandidateCheck>) {
		if self.validation_requested && outcome.solved() && check.is_none() {
			log::warn!("No check recorded for {}@{}", self.focus.root, outcome.version);
		}
		self.entries.push(ReportEntry { outcome, check });
	}

	/// The project's own vendor directory could not be put back after validation.
	pub fn restore_failed(&mut self, message: impl Into<String>) {
		self.restore_error = Some(message.into());
	}

	pub fn finish(self) -> Report {
		Report {
			focus: self.focus,
			entries: self.entries,
			restore_error: self.restore_error,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
	focus: DependencyIdentifier,
	entries: Vec<ReportEntry>,
	restore_error: Option<String>,
}

impl Report {
	pub fn focus(&self) -> &DependencyIdentifier {
		&self.focus
	}

	pub fn entries(&self) -> &[ReportEntry] {
		&self.entries
	}

	pub fn restore_error(&self) -> Option<&str> {
		self.restore_error.as_deref()
	}

	/// `Fail` when any candidate failed to solve or failed its check, or the vendor directory wasn't restored.
	pub fn verdict(&self) -> Verdict {
		if self.restore_error.is_none() && self.entries.iter().all(ReportEntry::passed) {
			Verdict::Pass
		} else {
			Verdict::Fail
		}
	}

	/// One line per candidate, in sweep order.
	pub fn status_lines(&self) -> Vec<String> {
		self.entries.iter().map(|e| e.status_line(&self.focus)).collect()
	}

	pub fn closing_line(&self) -> String {
		match self.verdict() {
			Verdict::Pass => format!("All {} versions of {} succeeded.", self.entries.len(), self.focus.root),
			Verdict::Fail => "Encountered one or more errors.".to_string(),
		}
	}

	/// The full report as printed. `verbose` adds each solution's projects and the output of failed checks.
	pub fn render(&self, verbose: bool) -> String {
		let mut lines = Vec::new();
		for entry in &self.entries {
			lines.push(entry.status_line(&self.focus));
			if !verbose {
				continue;
			}

			if let Ok(solution) = &entry.outcome.result {
				lines.extend(describe_solution(solution));
			}
			if let Some(CandidateCheck::Validated(r)) = &entry.check {
				if !r.passed() && !r.output.is_empty() {
					lines.push("output:".to_string());
					lines.push(r.output.trim_end().to_string());
				}
			}
		}
		if let Some(e) = &self.restore_error {
			lines.push(format!("failed to restore vendor folder: {}", e));
		}
		lines.push(String::new());
		lines.push(self.closing_line());
		lines.join("\n")
	}
}

fn describe_solution(solution: &Solution) -> impl Iterator<Item = String> + '_ {
	solution.projects().iter().map(|p| format!("\t{} at {}", p.ident, p.version.describe()))
}
