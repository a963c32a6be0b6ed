//! # gta (gotta test 'em all)
//!
//! Checks that a project keeps building across the released versions of one of its dependencies.
//!
//! # Usage
//! 1. Describe the project with a [`ProjectContext`] and the sweep with [`SweepOptions`].
//! 1. Provide the external collaborators: a [`source::SourceManager`], a [`solver::Solver`]
//! and a [`manifest::ProjectAnalyzer`].
//! 1. [`run()`] to sweep every matching version and get a [`report::Report`], or [`solve()`] first and
//! [`SolvedSweep::check()`] the solutions afterwards.

pub mod error;
pub use error::Result;
pub use error::Error;

pub mod config;
pub use config::Config;
pub use config::SweepOptions;

pub mod identifier;
pub use identifier::ProjectRoot;
pub use identifier::DependencyIdentifier;

pub mod version;
pub use version::CandidateVersion;
pub use version::VersionSpec;

pub mod project;
pub use project::ProjectContext;

pub mod catalog;
pub mod manifest;
pub mod source;
pub mod solver;
pub mod sweep;
pub mod vendor;
pub mod validation;
pub mod report;

mod run;
pub use run::run;
pub use run::solve;
pub use run::Collaborators;
pub use run::SolvedSweep;
