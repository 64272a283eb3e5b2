//! Animation counter passed to kernels, wrapped so it never grows unbounded.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceCounter {
    value: i32,
    period: i32,
}

impl SequenceCounter {
    /// A non-positive period is treated as 1.
    pub fn new(period: i32) -> Self {
        Self {
            value: 0,
            period: period.max(1),
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn period(&self) -> i32 {
        self.period
    }

    /// Change the period, keeping the current value in range.
    pub fn set_period(&mut self, period: i32) {
        self.period = period.max(1);
        self.value %= self.period;
    }

    /// Current value, then step to the next one modulo the period.
    pub fn advance(&mut self) -> i32 {
        let current = self.value;
        self.value = (self.value + 1) % self.period;
        current
    }
}
