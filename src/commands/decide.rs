//! Implementation of the `gatekeep decide` command.
//!
//! Decides a candidate-set file and prints the canonical decision record.
//! Nothing is persisted and nothing is executed.

use super::{absolute, resolve_workspace};
use crate::cli::{DecideArgs, GlobalArgs};
use crate::decision::{RunId, decide_bytes, validate_record};
use crate::error::{GateError, Result};

/// Execute the `gatekeep decide` command.
pub fn cmd_decide(global: &GlobalArgs, args: DecideArgs) -> Result<()> {
    print!("{}", decide_file(global, &args)?);
    Ok(())
}

/// Canonical JSON of the decision for `args.candidates`.
fn decide_file(global: &GlobalArgs, args: &DecideArgs) -> Result<String> {
    let (_, ws) = resolve_workspace(global)?;
    let run_id = RunId::new(args.run_id.as_str())?;

    let path = absolute(args.candidates.clone())?;
    let bytes = std::fs::read(&path).map_err(|e| {
        GateError::UserError(format!(
            "failed to read candidate set '{}': {}",
            path.display(),
            e
        ))
    })?;

    let candidate_set_ref = args
        .candidate_set_ref
        .clone()
        .unwrap_or_else(|| ws.ref_for(&path));

    let record = decide_bytes(&bytes, &run_id, &args.input_ref, &candidate_set_ref);

    // Caller-supplied refs must still yield a well-formed record.
    if let Err(errors) = validate_record(&record.to_value()?) {
        return Err(GateError::UserError(format!(
            "refs produce an invalid decision record: {}\n\
             Fix: use relative refs of at most 512 characters.",
            errors.join(", ")
        )));
    }

    record.to_canonical_json()
}
