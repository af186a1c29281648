//! Scheduler layer
//!
//! The two loops that act on the cluster queue: the submission throttler,
//! which feeds rendered job scripts in under the admission ceiling, and the
//! duplicate reconciler, which cancels redundant copies of running jobs.

pub mod reconcile;
pub mod throttle;

pub use reconcile::{
    CancelReport, DuplicateReconciler, FailedCancel, Reconciliation, SweepReport, find_duplicates,
};
pub use throttle::{AdmissionState, SubmissionThrottler, SubmitReport, ThrottleError};
