//! Scheduling context for dispatching rule evaluation.

/// Runtime scheduling state passed to dispatching rules.
///
/// Times are abstract units relative to the start of the run (t=0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulingContext {
    /// Current simulation time.
    pub current_time: i64,
}

impl SchedulingContext {
    /// Creates a context at the given time.
    pub fn at_time(current_time: i64) -> Self {
        Self { current_time }
    }

    /// Moves the clock forward.
    pub fn advance(&mut self, by: i64) {
        self.current_time = self.current_time.saturating_add(by);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let mut ctx = SchedulingContext::at_time(0);
        ctx.advance(3);
        ctx.advance(2);
        assert_eq!(ctx.current_time, 5);
        assert_eq!(SchedulingContext::default(), SchedulingContext::at_time(0));
    }
}
