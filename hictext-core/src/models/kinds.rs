use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::HicError;

/// Which value a contact record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixType {
    Observed,
    /// observed over expected
    Oe,
    Expected,
}

impl FromStr for MatrixType {
    type Err = HicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "observed" => Ok(MatrixType::Observed),
            "oe" => Ok(MatrixType::Oe),
            "expected" => Ok(MatrixType::Expected),
            _ => Err(HicError::UnknownMatrixType(s.to_string())),
        }
    }
}

impl Display for MatrixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatrixType::Observed => "observed",
            MatrixType::Oe => "oe",
            MatrixType::Expected => "expected",
        };
        write!(f, "{}", s)
    }
}

///
/// Normalization vector type. Files can carry custom vectors, those are kept by name.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms, non_camel_case_types)]
pub enum Normalization {
    NONE,
    VC,
    VC_SQRT,
    KR,
    SCALE,
    Other(String),
}

impl Normalization {
    pub fn as_str(&self) -> &str {
        match self {
            Normalization::NONE => "NONE",
            Normalization::VC => "VC",
            Normalization::VC_SQRT => "VC_SQRT",
            Normalization::KR => "KR",
            Normalization::SCALE => "SCALE",
            Normalization::Other(name) => name.as_str(),
        }
    }
}

impl FromStr for Normalization {
    type Err = HicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(Normalization::NONE),
            "VC" => Ok(Normalization::VC),
            "VC_SQRT" => Ok(Normalization::VC_SQRT),
            "KR" => Ok(Normalization::KR),
            "SCALE" => Ok(Normalization::SCALE),
            other => Ok(Normalization::Other(other.to_string())),
        }
    }
}

impl Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bin unit: base pairs or restriction fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum Unit {
    BP,
    FRAG,
}

impl FromStr for Unit {
    type Err = HicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BP" => Ok(Unit::BP),
            "FRAG" => Ok(Unit::FRAG),
            _ => Err(HicError::UnknownUnit(s.to_string())),
        }
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::BP => write!(f, "BP"),
            Unit::FRAG => write!(f, "FRAG"),
        }
    }
}
