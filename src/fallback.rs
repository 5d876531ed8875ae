//! Outcome of a provider call that is total by contract.
//!
//! Providers never return an error for per-call failures. Instead they return
//! `Fetched::Fallback` carrying the documented neutral value and the reason,
//! so callers can score with it and telemetry can still tell the paths apart.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The remote call exceeded the configured per-call timeout.
    Timeout,
    /// The remote call failed (network, status, decode, auth).
    ProviderError,
    /// The remote answered but with too little data to compute a signal.
    InsufficientData,
    /// No candidate in the answer carried metrics.
    NoMetrics,
    /// No usable target account id configured.
    MissingAccount,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::Timeout => "timeout",
            FallbackReason::ProviderError => "provider_error",
            FallbackReason::InsufficientData => "insufficient_data",
            FallbackReason::NoMetrics => "no_metrics",
            FallbackReason::MissingAccount => "missing_account",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Live(T),
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Fetched<T> {
    pub fn value(&self) -> &T {
        match self {
            Fetched::Live(v) => v,
            Fetched::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Fetched::Live(v) => v,
            Fetched::Fallback { value, .. } => value,
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            Fetched::Live(_) => None,
            Fetched::Fallback { reason, .. } => Some(*reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Fetched::Fallback { .. })
    }
}
