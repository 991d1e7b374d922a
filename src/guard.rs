//! Exactly-once capabilities for a single run.
//!
//! A [`RunGuard`] is created per run and hands out one [`SeamTicket`] and one
//! [`GateTicket`]. Tickets are consumed by value by the candidate seam and the
//! execution gateway respectively. Asking for either a second time is a
//! boundary violation, never a silent no-op.

use crate::decision::RunId;
use crate::error::{GateError, Result};

/// Permission to call the candidate source once.
#[derive(Debug)]
pub struct SeamTicket {
    run_id: RunId,
}

impl SeamTicket {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }
}

/// Permission to call the execution gateway once.
#[derive(Debug)]
pub struct GateTicket {
    run_id: RunId,
}

impl GateTicket {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }
}

/// Issues the per-run tickets.
#[derive(Debug)]
pub struct RunGuard {
    run_id: RunId,
    seam_taken: bool,
    gate_taken: bool,
}

impl RunGuard {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            seam_taken: false,
            gate_taken: false,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Take the candidate seam ticket.
    pub fn take_seam(&mut self) -> Result<SeamTicket> {
        if self.seam_taken {
            return Err(GateError::ExactlyOnce("candidate seam ticket"));
        }
        self.seam_taken = true;
        Ok(SeamTicket {
            run_id: self.run_id.clone(),
        })
    }

    /// Take the execution gate ticket.
    pub fn take_gate(&mut self) -> Result<GateTicket> {
        if self.gate_taken {
            return Err(GateError::ExactlyOnce("execution gate ticket"));
        }
        self.gate_taken = true;
        Ok(GateTicket {
            run_id: self.run_id.clone(),
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::new(RunId::new("test-run").unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_ticket_once() {
        let mut guard = RunGuard::for_tests();

        let seam = guard.take_seam().unwrap();
        let gate = guard.take_gate().unwrap();
        assert_eq!(seam.run_id().as_str(), "test-run");
        assert_eq!(gate.run_id().as_str(), "test-run");
    }

    #[test]
    fn test_second_seam_ticket_raises() {
        let mut guard = RunGuard::for_tests();
        let _seam = guard.take_seam().unwrap();

        let err = guard.take_seam().unwrap_err();
        assert!(matches!(err, GateError::ExactlyOnce(_)));
        assert!(err.is_boundary_violation());
    }

    #[test]
    fn test_second_gate_ticket_raises() {
        let mut guard = RunGuard::for_tests();
        let _gate = guard.take_gate().unwrap();

        assert!(matches!(
            guard.take_gate(),
            Err(GateError::ExactlyOnce("execution gate ticket"))
        ));
        // The seam is independent of the gate.
        assert!(guard.take_seam().is_ok());
    }
}
