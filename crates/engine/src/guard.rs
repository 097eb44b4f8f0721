use crate::EngineError;

/// Synchronous in-flight flag for one submit control.
///
/// A second `try_start` before `finish` fails with [`EngineError::InFlight`]
/// and no request must be sent.
#[derive(Debug, Default, Clone)]
pub struct SubmitGuard {
    in_flight: bool,
}

impl SubmitGuard {
    pub fn try_start(&mut self) -> Result<(), EngineError> {
        if self.in_flight {
            return Err(EngineError::InFlight);
        }
        self.in_flight = true;
        Ok(())
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_start_is_rejected_until_finished() {
        let mut guard = SubmitGuard::default();
        guard.try_start().unwrap();
        assert!(matches!(guard.try_start(), Err(EngineError::InFlight)));
        guard.finish();
        assert!(guard.try_start().is_ok());
    }
}
