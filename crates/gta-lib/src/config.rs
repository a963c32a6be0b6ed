use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Serialize, Deserialize};

use crate::validation::ValidationCommand;
use crate::version::VersionSpec;

/// Settings shared across runs, read from `gta/config.json` in the user's config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	cache_dir: PathBuf,
	solver: Vec<String>,
	validation_timeout_secs: Option<u64>,
	https_only: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			cache_dir: {
				#[cfg(target_os = "windows")]
				let path = std::env::var_os("LOCALAPPDATA").map(PathBuf::from);

				#[cfg(not(target_os = "windows"))]
				let path = if let Some(e) = std::env::var_os("XDG_CACHE_HOME") {
					Some(PathBuf::from(e))
				} else {
					std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache"))
				};

				path.unwrap_or_else(std::env::temp_dir).join("gta")
			},
			solver: vec!["gps-solve".to_string()],
			validation_timeout_secs: None,
			https_only: true,
		}
	}
}

impl Config {
	/// Location of the config file, `None` when no config directory can be determined.
	pub fn config_path() -> Option<PathBuf> {
		#[cfg(target_os = "windows")]
		let path = std::env::var_os("APPDATA").map(PathBuf::from);

		#[cfg(not(target_os = "windows"))]
		let path = if let Some(e) = std::env::var_os("XDG_CONFIG_HOME") {
			Some(PathBuf::from(e))
		} else {
			std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config"))
		};

		path.map(|p| p.join("gta").join("config.json"))
	}

	/// Loads the config from [`config_path()`](Config::config_path()).
	///
	/// # Errors
	/// - [`IO`](crate::Error::IO) when the file can't be read, including when it doesn't exist.
	/// - [`SerdeJSON`](crate::Error::SerdeJSON) when the file isn't a valid config.
	pub fn load_from_disk() -> crate::Result<Self> {
		let path = Self::config_path()
			.ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no config directory"))?;
		Self::load_from_file(path)
	}

	pub fn load_from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
		let file = std::fs::File::open(path)?;
		Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
	}

	/// Where fetched sources are mirrored.
	pub fn cache_dir(&self) -> &Path {
		&self.cache_dir
	}
	pub fn set_cache_dir(&mut self, cache_dir: PathBuf) {
		self.cache_dir = cache_dir;
	}

	/// Command line of the external solver, see [`crate::solver::ExternalSolver`].
	pub fn solver(&self) -> &[String] {
		&self.solver
	}
	pub fn set_solver(&mut self, solver: Vec<String>) {
		self.solver = solver;
	}

	/// How long a validation command may run before it is killed. `None` waits forever.
	pub fn validation_timeout(&self) -> Option<Duration> {
		self.validation_timeout_secs.map(Duration::from_secs)
	}
	pub fn set_validation_timeout(&mut self, timeout: Option<Duration>) {
		self.validation_timeout_secs = timeout.map(|d| d.as_secs());
	}

	/// Reach git remotes over https, otherwise the `git://` protocol is used.
	pub fn https_only(&self) -> bool {
		self.https_only
	}
	pub fn set_https_only(&mut self, https_only: bool) {
		self.https_only = https_only;
	}
}

/// Everything a single run was asked to do, built once from the command line.
#[derive(Debug, Clone)]
pub struct SweepOptions {
	/// Import path of the dependency to sweep.
	pub dependency: String,
	pub spec: VersionSpec,
	/// When present each solution is also checked by running this command.
	pub run: Option<ValidationCommand>,
	pub verbose: bool,
}

impl SweepOptions {
	/// # Errors
	/// - [`InvalidConstraintSpec`](crate::Error::InvalidConstraintSpec) from [`VersionSpec::from_selectors`].
	/// - [`Argument`](crate::Error::Argument) when `run` is given but empty.
	pub fn new(dependency: impl Into<String>, branch: Option<&str>, version: Option<&str>, semver: Option<&str>, run: Option<&str>, verbose: bool) -> crate::Result<Self> {
		let dependency = dependency.into();
		if dependency.trim().is_empty() {
			return Err(crate::Error::Argument("dependency to check must not be empty".to_string()));
		}

		Ok(Self {
			dependency,
			spec: VersionSpec::from_selectors(branch, version, semver)?,
			run: run.map(ValidationCommand::parse).transpose()?,
			verbose,
		})
	}
}
