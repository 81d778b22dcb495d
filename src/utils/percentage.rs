use std::{fmt::Display, ops::Deref};

/// Non-negative percentage. Values above 100 are representable, callers decide whether to clamp.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Percentage {
    pub const FULL: Percentage = Percentage(100.);

    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value.is_nan() || value < 0. {
            None
        } else {
            Some(Percentage(value))
        }
    }

    /// Share of `value` in `whole`. `None` when the share can't be expressed, e.g. `whole` is 0.
    pub fn of(value: f64, whole: f64) -> Option<Percentage> {
        let ratio = value / whole * 100.;
        if ratio.is_finite() {
            Percentage::new_opt(ratio)
        } else {
            None
        }
    }

    pub fn rounded(self) -> Percentage {
        Percentage(self.0.round())
    }

    pub fn min(self, other: Percentage) -> Percentage {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
