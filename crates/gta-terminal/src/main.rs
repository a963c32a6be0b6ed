use std::io::Write;

use gta::report::Verdict;
use gta::sweep::{OutcomeRecord, SweepObserver};
use gta::{CandidateVersion, DependencyIdentifier};

#[tokio::main]
async fn main() {
	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag( "h", "help",       "Show help");
		opts.optflag( "v", "verbose",    "Print solutions and the output of failed commands");
		opts.optopt(  "r", "run",        "Command to run against each solution, e.g. \"go test ./...\"", "COMMAND");
		opts.optopt(  "",  "branch",     "Only check this branch", "NAME");
		opts.optopt(  "",  "version",    "Only check this tag", "TAG");
		opts.optopt(  "",  "semver",     "Only check tags matching this semver range", "RANGE");
		opts.parsing_style(getopts::ParsingStyle::FloatingFrees);

		let parsed_options = match opts.parse(&args[1..]) {
			Ok(m)  => { m }
			Err(e) => { eprintln!("Unable to parse options: {}", e); std::process::exit(1) }
		};

		if parsed_options.opt_present("h") {
			eprintln!("{}", opts.usage("Usage: gta [OPTIONS] DEPENDENCY"));
			return;
		}

		parsed_options
	};

	let verbose = parsed_options.opt_present("v");
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "warn" })).init();

	let config = gta::Config::load_from_disk().unwrap_or_else(|e| {
		match e {
			gta::Error::IO(ref inner) if inner.kind() == std::io::ErrorKind::NotFound => {
				log::debug!("No config file, using default config.");
			},
			e => {
				log::warn!("Failed to read config file: {}", e);
				log::warn!("Using default config.");
			},
		}
		gta::Config::default()
	});

	match check_dependency(&config, &parsed_options, verbose).await {
		Ok(Verdict::Pass) => {},
		Ok(Verdict::Fail) => std::process::exit(1),
		Err(e) => {
			eprintln!("{}", e);
			std::process::exit(1);
		},
	}
}

async fn check_dependency(config: &gta::Config, parsed_options: &getopts::Matches, verbose: bool) -> Result<Verdict, Error> {
	let dependency = match parsed_options.free.as_slice() {
		[dependency] => dependency,
		[] => return Err(Error::MissingArgument),
		_ => return Err(Error::TooManyArguments),
	};

	let options = gta::SweepOptions::new(
		dependency.as_str(),
		parsed_options.opt_str("branch").as_deref(),
		parsed_options.opt_str("version").as_deref(),
		parsed_options.opt_str("semver").as_deref(),
		parsed_options.opt_str("r").as_deref(),
		verbose,
	)?;

	let project = gta::ProjectContext::from_env()?;
	log::debug!("Checking {} from {} ({})", options.dependency, project.import_root(), project.root_dir().display());

	let sources = gta::source::GitSourceManager::new(config);
	let solver = gta::solver::ExternalSolver::new(config.solver()).ok_or(Error::NoSolver)?;
	let analyzer = gta::manifest::godeps::GodepsAnalyzer;
	let collaborators = gta::Collaborators {
		sources: &sources,
		solver: &solver,
		analyzer: &analyzer,
		observer: &ConsoleProgress,
	};

	/* Solving blocks and only reads the project, the default Ctrl-C handling stops it. */
	let solved = gta::solve(&options, &project, &collaborators)?;

	/* Once vendor may have been moved an interrupt has to unwind through the check so it gets put back. */
	let report = tokio::select! {
		report = solved.check(config, &options, &project, &collaborators) => report?,
		_ = tokio::signal::ctrl_c() => return Err(Error::Interrupted),
	};
	println!("{}", report.render(options.verbose));
	Ok(report.verdict())
}

/// Prints progress of the sweep to stdout.
struct ConsoleProgress;

impl SweepObserver for ConsoleProgress {
	fn planned(&self, focus: &DependencyIdentifier, candidates: &[CandidateVersion]) {
		let names: Vec<String> = candidates.iter().map(|v| v.to_string()).collect();
		println!("Checking {} with the following versions:\n\t[{}]", focus.root, names.join(" "));
	}

	fn solving(&self, focus: &DependencyIdentifier, version: &CandidateVersion) {
		print!("Looking for solution with {}@{}...", focus.root, version);
		let _ = std::io::stdout().flush();
	}

	fn solved(&self, _focus: &DependencyIdentifier, outcome: &OutcomeRecord) {
		println!("{}", if outcome.solved() { "success!" } else { "failed." });
	}

	fn swept(&self, _focus: &DependencyIdentifier) {
		println!();
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Gta(#[from] gta::Error),
	#[error("Missing argument: the import path of the dependency to check")]
	MissingArgument,
	#[error("Too many arguments: only one dependency can be checked at a time")]
	TooManyArguments,
	#[error("No solver command configured")]
	NoSolver,
	#[error("Interrupted")]
	Interrupted,
}
