//! Run settings for the command surface, and its defaulting policy.
//!
//! Numeric answers that are not positive integers never abort a run: the documented default is
//! substituted and the substitution is reported as a [`ConfigFallback`].

use std::fmt;

use crate::spreading::SpreadingConfig;

pub const DEFAULT_ALPHA: f64 = 0.99;
pub const DEFAULT_ITERATIVE_ITERATIONS: usize = 10;
pub const DEFAULT_FINAL_ITERATIONS: usize = 100;
pub const DEFAULT_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunMode {
    /// Every snapshot is kept and animated.
    Iterative,
    /// Only the last snapshot is shown.
    Final,
}

impl RunMode {
    /// Parse a menu answer: `"1"`/`"iterative"` or `"2"`/`"final"`.
    pub fn from_choice(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "iterative" => Some(Self::Iterative),
            "2" | "final" => Some(Self::Final),
            _ => None,
        }
    }

    pub fn default_iterations(&self) -> usize {
        match self {
            Self::Iterative => DEFAULT_ITERATIVE_ITERATIONS,
            Self::Final => DEFAULT_FINAL_ITERATIONS,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Iterative => "iterative",
            Self::Final => "final",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    NotANumber,
    NotPositive,
}

/// A user-supplied value replaced by its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFallback {
    pub field: &'static str,
    pub input: String,
    pub default: u64,
    pub reason: FallbackReason,
}

impl fmt::Display for ConfigFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let why = match self.reason {
            FallbackReason::NotANumber => "is not a whole number",
            FallbackReason::NotPositive => "must be a positive number",
        };
        write!(
            f,
            "{} {:?} {}; using default {}",
            self.field, self.input, why, self.default
        )
    }
}

/// Parse a positive integer, falling back to `default` on anything else.
pub fn parse_positive_or_default(
    input: &str,
    field: &'static str,
    default: u64,
) -> (u64, Option<ConfigFallback>) {
    let trimmed = input.trim();
    let reason = match trimmed.parse::<i64>() {
        Ok(v) if v > 0 => return (v as u64, None),
        Ok(_) => FallbackReason::NotPositive,
        Err(_) => FallbackReason::NotANumber,
    };
    let fallback = ConfigFallback {
        field,
        input: trimmed.to_string(),
        default,
        reason,
    };
    tracing::warn!(%fallback, "configuration fallback");
    (default, Some(fallback))
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSettings {
    pub mode: RunMode,
    pub alpha: f64,
    pub iterations: usize,
    /// Consumed by the renderer only.
    pub interval_ms: u64,
}

impl RunSettings {
    pub fn for_mode(mode: RunMode) -> Self {
        Self {
            mode,
            alpha: DEFAULT_ALPHA,
            iterations: mode.default_iterations(),
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }

    /// Apply a raw iteration-count answer; returns the fallback if the default was used.
    pub fn set_iterations(&mut self, input: &str) -> Option<ConfigFallback> {
        let default = self.mode.default_iterations() as u64;
        let (value, fallback) = parse_positive_or_default(input, "iterations", default);
        self.iterations = usize::try_from(value).unwrap_or(self.mode.default_iterations());
        fallback
    }

    pub fn set_interval(&mut self, input: &str) -> Option<ConfigFallback> {
        let (value, fallback) =
            parse_positive_or_default(input, "animation interval (ms)", DEFAULT_INTERVAL_MS);
        self.interval_ms = value;
        fallback
    }

    pub fn spreading_config(&self) -> SpreadingConfig {
        SpreadingConfig {
            alpha: self.alpha,
            iterations: self.iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_integers_are_accepted() {
        assert_eq!(parse_positive_or_default(" 25\n", "iterations", 10), (25, None));
    }

    #[test]
    fn non_numeric_input_falls_back() {
        let (v, fb) = parse_positive_or_default("ten", "iterations", 10);
        assert_eq!(v, 10);
        let fb = fb.unwrap();
        assert_eq!(fb.reason, FallbackReason::NotANumber);
        assert!(fb.to_string().contains("using default 10"));
    }

    #[test]
    fn non_positive_input_falls_back() {
        for input in ["0", "-3"] {
            let (v, fb) = parse_positive_or_default(input, "animation interval (ms)", 100);
            assert_eq!(v, 100);
            assert_eq!(fb.unwrap().reason, FallbackReason::NotPositive);
        }
        let (v, fb) = parse_positive_or_default("", "iterations", 10);
        assert_eq!((v, fb.map(|f| f.reason)), (10, Some(FallbackReason::NotANumber)));
    }

    #[test]
    fn mode_defaults() {
        assert_eq!(RunMode::from_choice("1"), Some(RunMode::Iterative));
        assert_eq!(RunMode::from_choice(" Final "), Some(RunMode::Final));
        assert_eq!(RunMode::from_choice("3"), None);
        assert_eq!(RunSettings::for_mode(RunMode::Iterative).iterations, 10);
        assert_eq!(RunSettings::for_mode(RunMode::Final).iterations, 100);
    }

    #[test]
    fn settings_fall_back_per_mode() {
        let mut s = RunSettings::for_mode(RunMode::Final);
        assert!(s.set_iterations("abc").is_some());
        assert_eq!(s.iterations, 100);
        assert!(s.set_iterations("7").is_none());
        assert_eq!(s.spreading_config().iterations, 7);
        assert!(s.set_interval("-1").is_some());
        assert_eq!(s.interval_ms, 100);
    }
}
