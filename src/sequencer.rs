//! Callback sequencer - ordered execution of a phase
//!
//! Runs a borrowed list of callbacks strictly in order, one at a time,
//! awaiting each completion before starting the next. Holds no state
//! across calls.

use tracing::debug;

use crate::callback::SharedCallback;
use crate::error::HordeError;

/// Run every callback in the list exactly once, in order
///
/// Returns after the last callback completes, or immediately for an empty
/// list. Operates on a defensive copy of the list, so the registry handed
/// in stays untouched and reusable for a later run.
///
/// Failure semantics: the sequencer does not catch or retry. A failing
/// callback aborts the remaining steps and its error propagates unchanged
/// to the caller. A callback whose future never resolves stalls the
/// sequence indefinitely - that is a bug in the callback, and the
/// sequencer applies no timeout or detection.
pub async fn run_sequence(phase: &str, callbacks: &[SharedCallback]) -> Result<(), HordeError> {
    let steps: Vec<SharedCallback> = callbacks.to_vec();
    debug!(phase, steps = steps.len(), "running sequence");

    for step in steps {
        debug!(phase, callback = step.name(), "invoking callback");
        step.invoke().await?;
    }

    Ok(())
}
