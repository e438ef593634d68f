//! Severity definitions
//!
//! Severities are ordered by their numeric rank, never by label. `Silent`
//! sits above every emittable level and is only ever used as a threshold.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
    Silent,
}

impl Severity {
    /// Every severity that can appear on an emitted record
    pub const EMITTABLE: [Severity; 6] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Numeric rank; `Silent` is unbounded
    pub const fn rank(&self) -> u32 {
        match self {
            Severity::Trace => 10,
            Severity::Debug => 20,
            Severity::Info => 30,
            Severity::Warn => 40,
            Severity::Error => 50,
            Severity::Fatal => 60,
            Severity::Silent => u32::MAX,
        }
    }

    pub fn from_rank(rank: u32) -> Option<Self> {
        match rank {
            10 => Some(Severity::Trace),
            20 => Some(Severity::Debug),
            30 => Some(Severity::Info),
            40 => Some(Severity::Warn),
            50 => Some(Severity::Error),
            60 => Some(Severity::Fatal),
            u32::MAX => Some(Severity::Silent),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
            Severity::Silent => "SILENT",
        }
    }

    /// `true` when this severity is at or above `threshold`
    #[inline]
    pub fn meets_threshold(&self, threshold: Severity) -> bool {
        self.rank() >= threshold.rank()
    }

    /// Whether a record may carry this severity
    #[inline]
    pub fn is_emittable(&self) -> bool {
        *self != Severity::Silent
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" => Ok(Severity::Trace),
            "DEBUG" => Ok(Severity::Debug),
            "INFO" => Ok(Severity::Info),
            "WARN" | "WARNING" => Ok(Severity::Warn),
            "ERROR" => Ok(Severity::Error),
            "FATAL" => Ok(Severity::Fatal),
            "SILENT" | "OFF" => Ok(Severity::Silent),
            other => other
                .parse::<u32>()
                .ok()
                .and_then(Severity::from_rank)
                .ok_or_else(|| format!("Invalid severity: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks() {
        assert_eq!(Severity::Trace.rank(), 10);
        assert_eq!(Severity::Warn.rank(), 40);
        assert_eq!(Severity::Fatal.rank(), 60);
        assert!(Severity::Silent.rank() > Severity::Fatal.rank());
    }

    #[test]
    fn test_ordering_follows_rank() {
        assert!(Severity::Trace < Severity::Debug);
        assert!(Severity::Error > Severity::Warn);
        for level in Severity::EMITTABLE {
            assert!(Severity::Silent > level);
        }
    }

    #[test]
    fn test_meets_threshold() {
        assert!(Severity::Error.meets_threshold(Severity::Warn));
        assert!(Severity::Warn.meets_threshold(Severity::Warn));
        assert!(!Severity::Info.meets_threshold(Severity::Warn));
        for level in Severity::EMITTABLE {
            assert!(!level.meets_threshold(Severity::Silent));
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warn));
        assert_eq!(" Info ".parse::<Severity>(), Ok(Severity::Info));
        assert_eq!("50".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("off".parse::<Severity>(), Ok(Severity::Silent));
        assert!("loud".parse::<Severity>().is_err());
        assert!("35".parse::<Severity>().is_err());
    }

    #[test]
    fn test_from_rank_roundtrip() {
        for level in Severity::EMITTABLE {
            assert_eq!(Severity::from_rank(level.rank()), Some(level));
        }
    }
}
