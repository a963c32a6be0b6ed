//! Checking a written vendor tree by running a user supplied command, e.g. `go test ./...`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::version::CandidateVersion;

/// A program and its arguments, split on whitespace. No shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationCommand {
	program: String,
	args: Vec<String>,
}

impl ValidationCommand {
	/// # Errors
	/// [`Argument`](crate::Error::Argument) when `command` has no words.
	pub fn parse(command: &str) -> crate::Result<Self> {
		let mut words = command.split_whitespace().map(str::to_string);
		let program = words.next().ok_or_else(|| crate::Error::Argument("command to run must not be empty".to_string()))?;
		Ok(Self {
			program,
			args: words.collect(),
		})
	}

	pub fn program(&self) -> &str {
		&self.program
	}

	pub fn args(&self) -> &[String] {
		&self.args
	}
}

impl std::fmt::Display for ValidationCommand {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.program)?;
		for arg in &self.args {
			write!(f, " {}", arg)?;
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationStatus {
	Exited(i32),
	/// Ended by a signal, there is no exit code.
	Terminated,
	SpawnFailed(String),
	TimedOut(Duration),
}

impl std::fmt::Display for ValidationStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ValidationStatus::Exited(code) => write!(f, "exit status {}", code),
			ValidationStatus::Terminated => write!(f, "termination by signal"),
			ValidationStatus::SpawnFailed(e) => write!(f, "error starting command: {}", e),
			ValidationStatus::TimedOut(d) => write!(f, "timeout after {}s", d.as_secs()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
	pub version: CandidateVersion,
	pub status: ValidationStatus,
	/// Standard output followed by standard error.
	pub output: String,
}

impl ValidationResult {
	pub fn passed(&self) -> bool {
		self.status == ValidationStatus::Exited(0)
	}
}

pub struct ValidationRunner {
	command: ValidationCommand,
	working_dir: PathBuf,
	timeout: Option<Duration>,
}

impl ValidationRunner {
	pub fn new(command: ValidationCommand, working_dir: impl Into<PathBuf>) -> Self {
		Self {
			command,
			working_dir: working_dir.into(),
			timeout: None,
		}
	}

	/// A command still running after `timeout` is killed and counted as failed.
	pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn command(&self) -> &ValidationCommand {
		&self.command
	}

	/// Runs the command once in the working directory. Never fails, problems are part of the result.
	pub async fn run(&self, version: &CandidateVersion) -> ValidationResult {
		log::info!("Running `{}` against {}", self.command, version);

		let child = tokio::process::Command::new(&self.command.program)
			.args(&self.command.args)
			.current_dir(&self.working_dir)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn();

		let mut child = match child {
			Ok(c) => c,
			Err(e) => {
				log::warn!("Failed to start `{}`: {}", self.command, e);
				return ValidationResult {
					version: version.clone(),
					status: ValidationStatus::SpawnFailed(e.to_string()),
					output: String::new(),
				};
			},
		};

		/* Read as it arrives so a command that times out still leaves its output behind. */
		let stdout = child.stdout.take();
		let stderr = child.stderr.take();
		let (mut out, mut err) = (Vec::new(), Vec::new());
		let finished = async {
			let (read_out, read_err) = tokio::join!(drain(stdout, &mut out), drain(stderr, &mut err));
			let status = child.wait().await;
			read_out.and(read_err).and(status)
		};

		let waited = match self.timeout {
			Some(limit) => tokio::time::timeout(limit, finished).await.map_err(|_| limit),
			None => Ok(finished.await),
		};

		let status = match waited {
			Ok(Ok(status)) => match status.code() {
				Some(code) => ValidationStatus::Exited(code),
				None => ValidationStatus::Terminated,
			},
			Ok(Err(e)) => ValidationStatus::SpawnFailed(e.to_string()),
			Err(limit) => {
				log::warn!("`{}` timed out after {:?}", self.command, limit);
				let _ = child.kill().await;
				ValidationStatus::TimedOut(limit)
			},
		};

		let mut output = String::from_utf8_lossy(&out).to_string();
		output.push_str(&String::from_utf8_lossy(&err));

		log::debug!("`{}` against {} finished with {}", self.command, version, status);
		ValidationResult {
			version: version.clone(),
			status,
			output,
		}
	}
}

/// Appends everything read from `pipe` to `into` until it closes.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>, into: &mut Vec<u8>) -> std::io::Result<()> {
	let mut pipe = match pipe {
		Some(p) => p,
		None => return Ok(()),
	};
	let mut buf = [0u8; 8192];
	loop {
		match pipe.read(&mut buf).await? {
			0 => return Ok(()),
			n => into.extend_from_slice(&buf[..n]),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::version::UnpairedVersion;

	fn v1() -> CandidateVersion { UnpairedVersion::tag("v1.0.0").into() }

	#[test]
	fn command_is_split_on_whitespace() {
		let command = ValidationCommand::parse("  go   test ./... ").unwrap();
		assert_eq!(command.program(), "go");
		assert_eq!(command.args(), ["test", "./..."]);
		assert_eq!(command.to_string(), "go test ./...");
	}

	#[test]
	fn empty_command_is_rejected() {
		assert!(matches!(ValidationCommand::parse(" \t"), Err(crate::Error::Argument(_))));
	}

	#[tokio::test]
	async fn missing_program_fails_to_spawn() {
		let dir = tempfile::tempdir().unwrap();
		let runner = ValidationRunner::new(ValidationCommand::parse("gta-no-such-validation-binary").unwrap(), dir.path());
		let result = runner.run(&v1()).await;
		assert!(matches!(result.status, ValidationStatus::SpawnFailed(_)));
		assert!(!result.passed());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn exit_status_decides() {
		let dir = tempfile::tempdir().unwrap();
		assert!(ValidationRunner::new(ValidationCommand::parse("true").unwrap(), dir.path()).run(&v1()).await.passed());

		let failed = ValidationRunner::new(ValidationCommand::parse("false").unwrap(), dir.path()).run(&v1()).await;
		assert_eq!(failed.status, ValidationStatus::Exited(1));
		assert_eq!(failed.version, v1());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn output_is_captured() {
		let dir = tempfile::tempdir().unwrap();
		let result = ValidationRunner::new(ValidationCommand::parse("echo hello").unwrap(), dir.path()).run(&v1()).await;
		assert_eq!(result.output, "hello\n");
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn runs_in_working_dir() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir(dir.path().join("vendor")).unwrap();
		let result = ValidationRunner::new(ValidationCommand::parse("test -d vendor").unwrap(), dir.path()).run(&v1()).await;
		assert!(result.passed());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn slow_commands_time_out() {
		let dir = tempfile::tempdir().unwrap();
		let runner = ValidationRunner::new(ValidationCommand::parse("sleep 5").unwrap(), dir.path())
			.with_timeout(Some(Duration::from_millis(100)));
		assert_eq!(runner.run(&v1()).await.status, ValidationStatus::TimedOut(Duration::from_millis(100)));
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn timed_out_command_keeps_its_output() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("slow.sh"), "echo started\necho warming up >&2\nsleep 10\n").unwrap();
		let runner = ValidationRunner::new(ValidationCommand::parse("sh slow.sh").unwrap(), dir.path())
			.with_timeout(Some(Duration::from_millis(500)));

		let result = runner.run(&v1()).await;
		assert_eq!(result.status, ValidationStatus::TimedOut(Duration::from_millis(500)));
		assert_eq!(result.output, "started\nwarming up\n");
	}
}
