//! A [`Solver`] that runs a separate solver program.
//!
//! # Protocol
//! - The program runs in the root project's directory.
//! - [`SolveParameters`] are written to its stdin as JSON.
//! - On exit status 0 stdout holds a [`Solution`] as JSON.
//! - Any other exit status means no solution, stderr explains why.

use std::io::Write;
use std::process::{Command, Stdio};

use super::*;

pub struct ExternalSolver {
	program: String,
	args: Vec<String>,
}

impl ExternalSolver {
	/// `command` is the program followed by its arguments. `None` when `command` is empty.
	pub fn new(command: &[String]) -> Option<Self> {
		let (program, args) = command.split_first()?;
		Some(Self {
			program: program.clone(),
			args: args.to_vec(),
		})
	}
}

impl Solver for ExternalSolver {
	fn solve(&self, params: &SolveParameters<'_>) -> Result<Solution, SolveError> {
		let input = serde_json::to_vec(params).map_err(|e| SolveError::Protocol(e.to_string()))?;

		log::debug!("Running solver {} for {}", self.program, params.import_root);
		let mut child = Command::new(&self.program)
			.args(&self.args)
			.current_dir(params.root_dir)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|e| SolveError::Spawn(format!("{}: {}", self.program, e)))?;

		/* Written from its own thread so a solver filling its output pipes cannot block on us. */
		let writer = child.stdin.take().map(|mut stdin| std::thread::spawn(move || stdin.write_all(&input)));

		let output = child.wait_with_output().map_err(|e| SolveError::Spawn(e.to_string()))?;

		/* The solver may exit without reading its input, its exit status is checked below. */
		match writer.map(|w| w.join()) {
			Some(Ok(Err(e))) => log::debug!("Failed to write solve parameters to solver: {}", e),
			Some(Err(_)) => log::debug!("Solve parameter writer panicked"),
			_ => {}
		}

		if output.status.success() {
			serde_json::from_slice(&output.stdout).map_err(|e| SolveError::Protocol(e.to_string()))
		} else {
			let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
			Err(SolveError::NoSolution(if stderr.is_empty() {
				format!("solver exited with {}", output.status)
			} else {
				stderr
			}))
		}
	}
}

#[cfg(all(test, unix))]
mod test {
	use super::*;
	use crate::manifest::{BaselineBuilder, Constraint, ConstraintSet, Manifest, ProjectConstraint};

	fn solve_with(command: &[&str]) -> Result<Solution, SolveError> {
		solve_manifest_with(command, &ConstraintSet::default())
	}

	fn solve_manifest_with(command: &[&str], manifest: &ConstraintSet) -> Result<Solution, SolveError> {
		let dir = tempfile::tempdir().unwrap();
		let command: Vec<String> = command.iter().map(|s| s.to_string()).collect();
		let solver = ExternalSolver::new(&command).unwrap();
		let import_root = ProjectRoot::new("github.com/me/proj");
		solver.solve(&SolveParameters { manifest, lock: None, root_dir: dir.path(), import_root: &import_root })
	}

	#[test] fn empty_command_has_no_solver() { assert!(ExternalSolver::new(&[]).is_none()) }
	#[test] fn failing_solver_is_no_solution() { assert!(matches!(solve_with(&["false"]), Err(SolveError::NoSolution(_)))) }
	#[test] fn missing_solver_is_spawn_error() { assert!(matches!(solve_with(&["gta-no-such-solver-binary"]), Err(SolveError::Spawn(_)))) }
	#[test] fn garbage_output_is_protocol_error() { assert!(matches!(solve_with(&["echo", "nope"]), Err(SolveError::Protocol(_)))) }
	#[test]
	fn chatty_solver_with_large_input_finishes() {
		let manifest = Manifest {
			dependencies: (0..3000)
				.map(|i| ProjectConstraint::new(ProjectRoot::new(format!("github.com/dep/n{}", i)), Constraint::Any))
				.collect(),
			..Manifest::default()
		};
		let baseline = BaselineBuilder::new(ProjectRoot::new("github.com/foo/bar")).manifest(Some(&manifest)).build();
		let script = r#"head -c 200000 /dev/zero >&2; cat >/dev/null; echo '{"projects":[]}'"#;
		assert_eq!(solve_manifest_with(&["sh", "-c", script], baseline.constraints()).unwrap(), Solution::default());
	}

	#[test] fn json_output_is_solution() { assert_eq!(solve_with(&["echo", r#"{"projects":[]}"#]).unwrap(), Solution::default()) }
}
