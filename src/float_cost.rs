use derive_more::Display;
use num_traits::SaturatingAdd;
use num_traits::Zero;
use num_traits::bounds::UpperBounded;
use ordered_float::OrderedFloat;

use crate::cost::Cost;

/// Totally ordered `f32` cost.
///
/// Infinity is the "unreached" marker, so accumulated costs start there.
#[derive(Copy, Clone, Default, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
#[display("{_0:.3}")]
pub struct FloatCost(pub OrderedFloat<f32>);

impl Cost for FloatCost {}

impl FloatCost {
    #[inline(always)]
    pub fn new(f: f32) -> Self {
        Self(OrderedFloat(f))
    }

    #[inline(always)]
    pub fn value(&self) -> f32 {
        self.0.0
    }

    #[inline(always)]
    pub fn infinity() -> Self {
        Self(OrderedFloat(f32::INFINITY))
    }

    #[inline(always)]
    pub fn is_finite(&self) -> bool {
        self.0.0.is_finite()
    }
}

impl std::ops::Add for FloatCost {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}
impl std::ops::AddAssign for FloatCost {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

// Floats saturate at infinity on their own.
impl SaturatingAdd for FloatCost {
    #[inline(always)]
    fn saturating_add(&self, rhs: &Self) -> Self {
        *self + *rhs
    }
}

impl Zero for FloatCost {
    #[inline(always)]
    fn is_zero(&self) -> bool {
        self.0.0 == 0.0
    }
    #[inline(always)]
    fn zero() -> Self {
        Self::new(0.0)
    }
}
impl UpperBounded for FloatCost {
    #[inline(always)]
    fn max_value() -> Self {
        Self::infinity()
    }
}
