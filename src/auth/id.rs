//! Strongly typed Strava resource identifiers used as holder registry keys.
//!
//! Athletes are numeric, gear ids are a `b` (bike) or `g` (shoe) prefix followed by digits,
//! and clubs are either numeric or a vanity slug.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $shape:literal, $accepts:path) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Parses an identifier, rejecting values Strava would never issue.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				check($kind, $shape, &value, $accepts)?;

				Ok(Self(value))
			}

			/// The identifier as it appears in API paths.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "#{}"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

macro_rules! numeric_id {
	($name:ident) => {
		impl From<u64> for $name {
			fn from(value: u64) -> Self {
				Self(value.to_string())
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 64;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (athlete, gear, club).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (athlete, gear, club).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The identifier does not have the shape Strava uses for this kind.
	#[error("{kind} identifier `{value}` is not {shape}.")]
	Malformed {
		/// Kind of identifier (athlete, gear, club).
		kind: &'static str,
		/// Offending value.
		value: String,
		/// Description of the accepted shape.
		shape: &'static str,
	},
}

def_id! { AthleteId, "Strava athlete identifier.", "Athlete", "numeric", is_numeric }
def_id! {
	GearId,
	"Strava gear identifier (`b…` for bikes, `g…` for shoes).",
	"Gear",
	"a `b`/`g` prefix followed by digits",
	is_gear
}
def_id! {
	ClubId,
	"Strava club identifier (numeric id or vanity slug).",
	"Club",
	"numeric or a vanity slug",
	is_club
}
numeric_id!(AthleteId);
numeric_id!(ClubId);

fn check(
	kind: &'static str,
	shape: &'static str,
	value: &str,
	accepts: fn(&str) -> bool,
) -> Result<(), IdentifierError> {
	if value.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if value.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}
	if !accepts(value) {
		return Err(IdentifierError::Malformed { kind, value: value.to_owned(), shape });
	}

	Ok(())
}

fn is_numeric(value: &str) -> bool {
	value.bytes().all(|b| b.is_ascii_digit())
}

fn is_gear(value: &str) -> bool {
	value
		.strip_prefix(['b', 'g'])
		.is_some_and(|digits| !digits.is_empty() && is_numeric(digits))
}

fn is_club(value: &str) -> bool {
	value.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_'))
}
