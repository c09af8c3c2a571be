#![allow(non_snake_case)]

use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::fmt::Display;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

type Time = simple_si_units::base::Time<f64>;

macro_rules! ordered_time {
    ($name:ident) => {
        /// A simulation-clock quantity, totally ordered via `OrderedFloat` so it
        /// can key a `BTreeMap` or sort cleanly despite being backed by `f64`.
        #[derive(Debug, Clone, Copy)]
        #[repr(transparent)]
        pub struct $name(pub Time);

        impl Into<Time> for $name {
            fn into(self) -> Time {
                self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &$name) -> bool {
                OrderedFloat(self.0.s).eq(&OrderedFloat(other.0.s))
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Eq for $name {}

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                OrderedFloat(self.0.s).cmp(&OrderedFloat(other.0.s))
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self(Time::from_s(self.0.s + rhs.0.s))
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0.s += rhs.0.s
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self(Time::from_s(self.0.s - rhs.0.s))
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                self.0.s -= rhs.0.s
            }
        }

        impl Mul<f64> for $name {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self {
                Self(Time::from_s(self.0.s * rhs))
            }
        }

        impl MulAssign<f64> for $name {
            fn mul_assign(&mut self, rhs: f64) {
                self.0.s *= rhs
            }
        }

        impl Div<f64> for $name {
            type Output = Self;
            fn div(self, rhs: f64) -> Self {
                Self(Time::from_s(self.0.s / rhs))
            }
        }

        impl DivAssign<f64> for $name {
            fn div_assign(&mut self, rhs: f64) {
                self.0.s /= rhs
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self(Time::from_s(0.0))
            }
        }

        impl $name {
            /// Returns a new value from a number of seconds.
            pub fn from_s(s: f64) -> Self {
                Self(Time::from_s(s))
            }

            /// Returns the value in seconds.
            pub fn to_s(&self) -> f64 {
                self.0.s
            }

            /// Returns a new value from a number of milliseconds.
            pub fn from_ms(ms: f64) -> Self {
                Self(Time::from_s(ms / 1000.0))
            }

            /// Returns the value in milliseconds.
            pub fn to_ms(&self) -> f64 {
                self.0.s * 1000.0
            }

            /// Returns a new value from a number of minutes.
            pub fn from_min(min: f64) -> Self {
                Self(Time::from_s(min * 60.0))
            }

            /// Returns the value in minutes.
            pub fn to_min(&self) -> f64 {
                self.0.s / 60.0
            }
        }
    };
}

ordered_time!(SimTime);
ordered_time!(SimTimeSpan);

impl SimTime {
    /// Returns the elapsed `SimTimeSpan` from `self` to `other`.
    pub fn span_to(&self, other: &Self) -> SimTimeSpan {
        SimTimeSpan(Time::from_s(other.0.s - self.0.s))
    }
}

impl Add<SimTimeSpan> for SimTime {
    type Output = Self;
    fn add(self, rhs: SimTimeSpan) -> Self::Output {
        Self(Time::from_s(self.0.s + rhs.0.s))
    }
}

impl AddAssign<SimTimeSpan> for SimTime {
    fn add_assign(&mut self, rhs: SimTimeSpan) {
        self.0.s += rhs.0.s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_span_to_time() {
        let t = SimTime::from_s(1.0);
        let dt = SimTimeSpan::from_ms(500.0);
        assert_eq!((t + dt).to_s(), 1.5);
    }

    #[test]
    fn ordering_is_total() {
        let a = SimTime::from_s(0.1);
        let b = SimTime::from_s(0.2);
        assert!(a < b);
    }

    #[test]
    fn span_to_computes_delta() {
        let a = SimTime::from_s(1.0);
        let b = SimTime::from_s(2.5);
        assert_eq!(a.span_to(&b).to_s(), 1.5);
    }
}
