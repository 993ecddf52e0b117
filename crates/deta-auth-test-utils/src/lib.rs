// deta-auth-test-utils
//
// Adapter testing infrastructure:
// - `fixtures` builds unique creation inputs for every entity
// - `AdapterSuite` runs the conformance checks against any `AuthAdapter`
// - `SuiteStats` reports what ran and how long it took

pub mod fixtures;
pub mod suite;

pub use suite::{AdapterSuite, CheckFn, CheckFuture, SuiteCheck, SuiteError, SuiteLogger, SuiteResult, SuiteStats};
