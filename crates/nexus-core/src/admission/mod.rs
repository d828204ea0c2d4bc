//! Admission control in front of every state-mutating user action.
//!
//! Counters live in the [`SharedStore`](crate::store::SharedStore), so limits
//! hold across all worker processes. Gates are evaluated severity-first:
//!
//! 1. global in-flight requests
//! 2. per-user requests per minute
//! 3. per-user requests per hour
//! 4. per-user AI calls per minute (generation only)
//!
//! Denial is a normal outcome carried in [`AdmissionDecision`](nexus_types::AdmissionDecision),
//! never an error. Store failures admit the request.

mod gate;
mod key;
mod limiter;

pub use gate::{Admission, AdmissionGate, InFlightPermit};
pub use key::CounterKey;
pub use limiter::{RateDecision, RateLimiter};

#[cfg(test)]
mod tests;
