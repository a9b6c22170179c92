use crate::sim_if::SIM_IF;
use crate::value::Val;
use crate::TbResult;
use std::collections::VecDeque;

/// Ordered reference-model comparison. Expectations are enqueued the moment
/// an operand pair is committed towards the DUT; each captured output is
/// compared against the oldest pending expectation.
pub struct Scoreboard {
    reference: fn(u32, u32) -> u32,
    exp_q: VecDeque<u32>,
    checked: u32,
    mismatches: u32,
}

impl Scoreboard {
    pub fn new(reference: fn(u32, u32) -> u32) -> Self {
        Self {
            reference,
            exp_q: VecDeque::new(),
            checked: 0,
            mismatches: 0,
        }
    }

    pub fn expect(&mut self, a: u32, b: u32) {
        self.exp_q.push_back((self.reference)(a, b));
    }

    /// Compares `actual` against the oldest expectation. An output with no
    /// pending expectation is a monitoring anomaly, not a failure: it is
    /// logged and otherwise ignored so it cannot mask earlier mismatches.
    pub fn check(&mut self, actual: u32) {
        let expected = match self.exp_q.pop_front() {
            Some(e) => e,
            None => {
                SIM_IF.log("Warning: unexpected output received");
                return;
            }
        };
        self.checked += 1;
        SIM_IF.log(&format!("Expected: {}, Actual: {}", expected, actual));
        if actual != expected {
            self.mismatches += 1;
            SIM_IF.log("  -> Mismatch detected!");
        }
    }

    pub fn pending(&self) -> usize {
        self.exp_q.len()
    }

    pub fn mismatches(&self) -> u32 {
        self.mismatches
    }

    pub fn checked(&self) -> u32 {
        self.checked
    }

    pub fn result_str(&self) -> String {
        format!(
            "checked={}, mismatches={}, pending={}",
            self.checked,
            self.mismatches,
            self.exp_q.len()
        )
    }

    /// End-of-run verdict: any mismatch fails, and so does a non-empty
    /// expectation queue (results were lost or never read back).
    pub fn result(&self) -> TbResult {
        if self.mismatches > 0 {
            Err(Val::String(format!("{} mismatches", self.mismatches)))
        } else if !self.exp_q.is_empty() {
            Err(Val::String(format!(
                "{} expected results never checked",
                self.exp_q.len()
            )))
        } else {
            Ok(Val::String(self.result_str()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn or_fn(a: u32, b: u32) -> u32 {
        a | b
    }

    #[test]
    fn matches_in_submission_order() {
        let mut sb = Scoreboard::new(or_fn);
        sb.expect(0, 0);
        sb.expect(1, 0);
        sb.check(0);
        sb.check(1);
        assert_eq!(sb.mismatches(), 0);
        assert_eq!(sb.checked(), 2);
        assert!(sb.result().is_ok());
    }

    #[test]
    fn counts_mismatches_without_aborting() {
        let mut sb = Scoreboard::new(or_fn);
        sb.expect(1, 1);
        sb.expect(0, 0);
        sb.check(0);
        sb.check(0);
        assert_eq!(sb.mismatches(), 1);
        assert!(sb.result().is_err());
    }

    #[test]
    fn unexpected_output_is_nonfatal_and_does_not_mutate() {
        let mut sb = Scoreboard::new(or_fn);
        sb.check(1);
        assert_eq!(sb.mismatches(), 0);
        assert_eq!(sb.checked(), 0);
        assert!(sb.result().is_ok());
    }

    #[test]
    fn undrained_queue_fails_the_run() {
        let mut sb = Scoreboard::new(or_fn);
        sb.expect(0, 1);
        let err = sb.result().unwrap_err();
        assert_eq!(err, Val::String("1 expected results never checked".to_string()));
    }
}
