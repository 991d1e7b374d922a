//! Implementation of the `gatekeep check` command.
//!
//! Structurally validates a decision record file, the same way the
//! execution gateway does before acting on one.

use crate::cli::CheckArgs;
use crate::decision::{DecisionRecord, validate_record};
use crate::error::{GateError, Result};
use serde_json::Value;
use std::path::Path;

/// Execute the `gatekeep check` command.
///
/// Prints a one-line summary for a valid record; an invalid one is an
/// `InvalidRecord` error listing every code.
pub fn cmd_check(args: CheckArgs) -> Result<()> {
    let record = check_file(&args.record)?;
    println!(
        "valid decision={} run_id={}",
        record.verdict().label(),
        record.run_id()
    );
    Ok(())
}

fn check_file(path: &Path) -> Result<DecisionRecord> {
    let content = std::fs::read(path).map_err(|e| {
        GateError::UserError(format!(
            "failed to read decision record '{}': {}",
            path.display(),
            e
        ))
    })?;

    let data: Value = serde_json::from_slice(&content)
        .map_err(|_| GateError::InvalidRecord(vec!["NOT_JSON".to_string()]))?;

    validate_record(&data).map_err(GateError::InvalidRecord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes;
    use crate::test_support::{decision_value, route_candidate};
    use tempfile::TempDir;

    #[test]
    fn test_check_valid_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("decision.json");
        let record = decision_value(vec![route_candidate("STATUS_QUERY", "alpha")], "r1");
        std::fs::write(&path, record.to_string()).unwrap();

        let record = check_file(&path).unwrap();

        assert!(record.is_accept());
        assert_eq!(record.run_id().as_str(), "r1");
    }

    #[test]
    fn test_check_invalid_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("decision.json");
        let mut record = decision_value(vec![], "r1");
        record["surprise"] = Value::Bool(true);
        std::fs::write(&path, record.to_string()).unwrap();

        let err = check_file(&path).unwrap_err();

        assert_eq!(err.exit_code(), exit_codes::BOUNDARY_VIOLATION);
        match err {
            GateError::InvalidRecord(codes) => {
                assert_eq!(codes, vec!["UNEXPECTED_ROOT_FIELDS:surprise".to_string()]);
            }
            other => panic!("expected InvalidRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_check_not_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("decision.json");
        std::fs::write(&path, "not json").unwrap();

        let err = check_file(&path).unwrap_err();

        assert!(matches!(err, GateError::InvalidRecord(ref codes) if codes == &vec!["NOT_JSON".to_string()]));
    }

    #[test]
    fn test_check_missing_file_is_operational() {
        let temp_dir = TempDir::new().unwrap();
        let err = check_file(&temp_dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::OPERATIONAL_FAILURE);
    }
}
