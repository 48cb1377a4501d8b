//! Turn budget for one `Agent::run` invocation.

/// Counts model queries against a fixed maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnBudget {
    max: u32,
    used: u32,
}

impl TurnBudget {
    pub fn new(max: u32) -> Self {
        Self { max, used: 0 }
    }

    /// Consume one turn. Returns the 1-indexed turn number, or `None` once exhausted.
    pub fn take(&mut self) -> Option<u32> {
        if self.used >= self.max {
            return None;
        }
        self.used += 1;
        Some(self.used)
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_stops_at_max() {
        let mut budget = TurnBudget::new(2);
        assert_eq!(budget.take(), Some(1));
        assert_eq!(budget.take(), Some(2));
        assert_eq!(budget.take(), None);
        assert!(budget.is_exhausted());
        assert_eq!(budget.used(), 2);
    }

    #[test]
    fn zero_budget_is_exhausted() {
        let mut budget = TurnBudget::new(0);
        assert!(budget.is_exhausted());
        assert_eq!(budget.take(), None);
    }
}
