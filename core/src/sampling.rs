//! Distributions used by the component processes.

use crate::error::{GridError, GridResult};
use rand_distr::{Bernoulli, Exp};

/// Exponential delays with mean `scale`.
pub fn exponential(field: &'static str, scale: f64) -> GridResult<Exp<f64>> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(GridError::Configuration { field, value: scale });
    }
    Exp::new(1.0 / scale).map_err(|_| GridError::Configuration { field, value: scale })
}

/// `true` with probability `p`.
pub fn bernoulli(field: &'static str, p: f64) -> GridResult<Bernoulli> {
    Bernoulli::new(p).map_err(|_| GridError::Configuration { field, value: p })
}
