use super::*;

/// The user's selection of which versions of the focal dependency to check.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum VersionSpec {
	#[default] Any,
	Branch(String),
	/// A single tag, compared as a semantic version when it reads as one.
	ExactVersion(String),
	/// Any of the `||` separated requirements must match.
	SemverRange {
		expression: String,
		requirements: Vec<semver::VersionReq>,
	},
}

impl VersionSpec {
	/// Builds a spec from the selector flags, empty strings count as unset.
	///
	/// # Errors
	/// [`InvalidConstraintSpec`](crate::Error::InvalidConstraintSpec) when more than one selector is given
	/// or the range does not parse.
	pub fn from_selectors(branch: Option<&str>, version: Option<&str>, semver: Option<&str>) -> crate::Result<VersionSpec> {
		fn set(s: Option<&str>) -> Option<&str> {
			s.map(str::trim).filter(|s| !s.is_empty())
		}

		match (set(branch), set(version), set(semver)) {
			(None, None, None) => Ok(VersionSpec::Any),
			(Some(b), None, None) => Ok(VersionSpec::Branch(b.to_string())),
			(None, Some(v), None) => Ok(VersionSpec::ExactVersion(v.to_string())),
			(None, None, Some(s)) => VersionSpec::semver_range(s),
			_ => Err(crate::Error::InvalidConstraintSpec("please specify only one type of constraint - branch, version, or semver".to_string())),
		}
	}

	/// Parses a range of `||` separated alternatives.
	///
	/// Each alternative is either `A - B` (inclusive) or comparators separated by spaces or commas,
	/// all of which must hold. Versions may carry a `v` prefix and a version without an operator
	/// matches only itself, so `1.2.0` is exactly `1.2.0` and `1.2` is any `1.2.x`.
	pub fn semver_range(expression: &str) -> crate::Result<VersionSpec> {
		let invalid = || crate::Error::InvalidConstraintSpec(format!("{} is not a valid semver constraint", expression));

		let requirements = expression.split("||")
			.map(|part| {
				let normalized = normalize_requirement(part).ok_or_else(invalid)?;
				semver::VersionReq::parse(&normalized).map_err(|_| invalid())
			})
			.collect::<crate::Result<Vec<_>>>()?;

		Ok(VersionSpec::SemverRange {
			expression: expression.to_string(),
			requirements,
		})
	}

	pub fn matches(&self, version: &CandidateVersion) -> bool {
		let unpaired = match version.unpaired() {
			Some(u) => u,
			None => return matches!(self, VersionSpec::Any),
		};

		match self {
			VersionSpec::Any => true,
			VersionSpec::Branch(name) => matches!(unpaired, UnpairedVersion::Branch(b) if b == name),
			VersionSpec::ExactVersion(tag) => match (parse_semver(tag), unpaired) {
				(Some(wanted), UnpairedVersion::Semver(_)) => unpaired.semver().as_ref() == Some(&wanted),
				(None, UnpairedVersion::Plain(name)) => name == tag,
				_ => false,
			},
			VersionSpec::SemverRange { requirements, .. } => match unpaired.semver() {
				Some(v) => requirements.iter().any(|r| r.matches(&v)),
				None => false,
			},
		}
	}
}

impl std::fmt::Display for VersionSpec {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			VersionSpec::Any => write!(f, "*"),
			VersionSpec::Branch(b) => write!(f, "branch {}", b),
			VersionSpec::ExactVersion(v) => write!(f, "version {}", v),
			VersionSpec::SemverRange { expression, .. } => write!(f, "semver {}", expression),
		}
	}
}

/// Rewrites one alternative of a range into the comma separated form [`semver::VersionReq`] reads.
fn normalize_requirement(part: &str) -> Option<String> {
	fn strip_v(version: &str) -> &str {
		version.strip_prefix('v').unwrap_or(version)
	}

	let part = part.trim();
	if let Some((low, high)) = part.split_once(" - ") {
		return Some(format!(">={}, <={}", strip_v(low.trim()), strip_v(high.trim())));
	}

	let mut comparators = Vec::new();
	let mut pending_op: Option<&str> = None;
	for token in part.split(|c: char| c.is_whitespace() || c == ',').filter(|t| !t.is_empty()) {
		let split = token.find(|c: char| !matches!(c, '<' | '>' | '=' | '~' | '^')).unwrap_or(token.len());
		let (op, version) = token.split_at(split);

		/* `>= 1.0` puts the operator in its own token */
		if version.is_empty() {
			if pending_op.replace(op).is_some() {
				return None;
			}
			continue;
		}

		let op = match (pending_op.take(), op) {
			(Some(_), op) if !op.is_empty() => return None,
			(Some(pending), _) => pending,
			(None, op) => op,
		};

		let version = strip_v(version);
		let wildcard = version.split('.').any(|p| matches!(p, "*" | "x" | "X"));
		let op = if op.is_empty() && !wildcard { "=" } else { op };
		comparators.push(format!("{}{}", op, version));
	}

	if pending_op.is_some() || comparators.is_empty() {
		return None;
	}
	Some(comparators.join(", "))
}
