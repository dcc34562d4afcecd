//! Per-session size budget.

/// Tracks cumulative cost against a hard ceiling.
///
/// `try_reserve` is the only mutating primitive: check and commit happen in
/// one call, so callers can never drift between reading `consumed` and
/// reserving. A failed reservation leaves state untouched.
#[derive(Debug, Clone)]
pub struct BudgetTracker {
    ceiling: u64,
    consumed: u64,
}

impl BudgetTracker {
    #[must_use]
    pub fn new(ceiling: u64) -> Self {
        Self {
            ceiling,
            consumed: 0,
        }
    }

    /// Restore a tracker from persisted session state.
    pub fn restore(ceiling: u64, consumed: u64) -> crate::Result<Self> {
        if consumed > ceiling {
            return Err(crate::KrError::SessionState(format!(
                "consumed {consumed} exceeds ceiling {ceiling}"
            )));
        }
        Ok(Self { ceiling, consumed })
    }

    /// Reserve `cost` units. Returns false, leaving state unchanged, if the
    /// reservation would exceed the ceiling.
    pub fn try_reserve(&mut self, cost: u64) -> bool {
        match self.consumed.checked_add(cost) {
            Some(next) if next <= self.ceiling => {
                self.consumed = next;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    #[must_use]
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.ceiling - self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tracker_is_empty() {
        let budget = BudgetTracker::new(100);
        assert_eq!(budget.ceiling(), 100);
        assert_eq!(budget.consumed(), 0);
        assert_eq!(budget.remaining(), 100);
    }

    #[test]
    fn reserve_accumulates() {
        let mut budget = BudgetTracker::new(100);
        assert!(budget.try_reserve(40));
        assert!(budget.try_reserve(60));
        assert_eq!(budget.consumed(), 100);
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn reserve_exact_ceiling_succeeds() {
        let mut budget = BudgetTracker::new(100);
        assert!(budget.try_reserve(100));
    }

    #[test]
    fn failed_reserve_leaves_state_unchanged() {
        let mut budget = BudgetTracker::new(100);
        assert!(budget.try_reserve(90));
        assert!(!budget.try_reserve(11));
        assert_eq!(budget.consumed(), 90);
        assert!(budget.try_reserve(10));
    }

    #[test]
    fn zero_cost_reserve_always_succeeds() {
        let mut budget = BudgetTracker::new(0);
        assert!(budget.try_reserve(0));
        assert!(!budget.try_reserve(1));
    }

    #[test]
    fn reserve_never_overflows() {
        let mut budget = BudgetTracker::new(u64::MAX);
        assert!(budget.try_reserve(u64::MAX));
        assert!(!budget.try_reserve(1));
    }

    #[test]
    fn restore_accepts_valid_state() {
        let budget = BudgetTracker::restore(100, 60).unwrap();
        assert_eq!(budget.remaining(), 40);
    }

    #[test]
    fn restore_rejects_overconsumed_state() {
        assert!(BudgetTracker::restore(100, 101).is_err());
    }
}
