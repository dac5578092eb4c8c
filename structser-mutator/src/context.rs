use crate::config::MutationSettings;
use crate::random::RandomSource;

/// State shared by all levels of one mutation pass.
///
/// The growth budget is the number of bytes the encoded value may still grow by. Any operation
/// that makes the encoding larger charges the budget first; shrinking never refunds it.
pub struct MutationContext {
    rand: RandomSource,
    budget: usize,
    max_len: usize,
    enforce_changes: bool,
    settings: MutationSettings,
}

impl MutationContext {
    pub fn new(seed: u64, budget: usize, max_len: usize) -> Self {
        Self::with_settings(
            RandomSource::new(seed),
            budget,
            max_len,
            MutationSettings::default(),
        )
    }

    pub fn with_settings(
        rand: RandomSource,
        budget: usize,
        max_len: usize,
        settings: MutationSettings,
    ) -> Self {
        Self {
            rand,
            budget,
            max_len,
            enforce_changes: settings.enforce_changes,
            settings,
        }
    }

    pub fn rand(&mut self) -> &mut RandomSource {
        &mut self.rand
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Maximum encoded length imposed by the driver.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn enforce_changes(&self) -> bool {
        self.enforce_changes
    }

    pub fn settings(&self) -> MutationSettings {
        self.settings
    }

    pub fn can_grow(&self, bytes: usize) -> bool {
        bytes <= self.budget
    }

    /// Charges `bytes` of growth. Returns false, charging nothing, if the budget is too small.
    pub fn try_grow(&mut self, bytes: usize) -> bool {
        if !self.can_grow(bytes) {
            return false;
        }
        self.budget -= bytes;
        true
    }

    /// Runs `f` with change enforcement turned off.
    pub fn relaxed<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let enforce = std::mem::replace(&mut self.enforce_changes, false);
        let result = f(self);
        self.enforce_changes = enforce;
        result
    }

    pub fn into_rand(self) -> RandomSource {
        self.rand
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_accounting() {
        let mut ctx = MutationContext::new(0, 10, 100);
        assert!(ctx.try_grow(4));
        assert_eq!(ctx.budget(), 6);
        assert!(!ctx.try_grow(7));
        assert_eq!(ctx.budget(), 6);
        assert!(ctx.try_grow(6));
        assert!(ctx.can_grow(0));
        assert!(!ctx.can_grow(1));
    }

    #[test]
    fn test_relaxed_restores_enforcement() {
        let mut ctx = MutationContext::new(0, 0, 0);
        assert!(ctx.enforce_changes());
        let inner = ctx.relaxed(|ctx| ctx.enforce_changes());
        assert!(!inner);
        assert!(ctx.enforce_changes());
    }
}
