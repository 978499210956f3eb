//! Learning-rate criteria.
//!
//! A criterion is a small state machine deciding the effective step size for
//! the current training step, given the current squared error norm. Returning
//! 0 means "no update"; the trainer then skips the weight update entirely, so
//! the criterion also encodes the stop condition.

/// Decides the learning factor for one training step.
pub trait Criterion {
    /// Returns the learning factor for a step that produced `err_norm2`.
    ///
    /// A return value of 0 requests no update.
    fn rate(&mut self, err_norm2: f64) -> f64;
}

#[derive(Debug, Clone, Copy)]
/// Constant learning factor with an acceptable-error threshold.
///
/// Returns `alpha` while the squared error norm exceeds `sigma`, 0 once it
/// does not. For batch training, once no update was requested there will
/// never be one again for the same sample set — [`ConstantRate::updated`] is
/// the termination witness.
pub struct ConstantRate {
    sigma: f64,
    alpha: f64,
    updated: bool,
}

impl ConstantRate {
    /// Creates a criterion with acceptable squared error `sigma` and
    /// learning factor `alpha`.
    pub fn new(sigma: f64, alpha: f64) -> Self {
        Self {
            sigma,
            alpha,
            updated: false,
        }
    }

    /// Returns true if the last call requested an update.
    #[inline]
    pub fn updated(&self) -> bool {
        self.updated
    }
}

impl Criterion for ConstantRate {
    fn rate(&mut self, err_norm2: f64) -> f64 {
        self.updated = err_norm2 > self.sigma;
        if self.updated {
            self.alpha
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy)]
/// Adaptive learning factor.
///
/// Maintains fast convergence with a simple mechanism:
///
/// - learning converges if consecutive steps produce a smaller error norm;
/// - a counter is incremented on convergence and decremented otherwise;
/// - when the counter reaches `conv_max` the factor is multiplied by
///   `inc_coef` (speed things up), and the counter resets;
/// - when it reaches `conv_min` the factor is multiplied by `dec_coef`
///   (try smaller steps), and the counter resets.
pub struct AdaptiveRate {
    sigma: f64,
    alpha: f64,
    conv_cnt: i32,
    conv_max: i32,
    conv_min: i32,
    inc_coef: f64,
    dec_coef: f64,
    last_err2: f64,
    updated: bool,
}

impl AdaptiveRate {
    /// Creates a criterion with acceptable squared error `sigma` and initial
    /// learning factor `alpha`; the adaptation parameters take their
    /// defaults (counter bounds 5 / −2, coefficients 1.15 / 0.3).
    pub fn new(sigma: f64, alpha: f64) -> Self {
        Self::with_adaptation(sigma, alpha, 5, -2, 1.15, 0.3)
    }

    /// Creates a criterion with explicit adaptation parameters.
    pub fn with_adaptation(
        sigma: f64,
        alpha: f64,
        conv_max: i32,
        conv_min: i32,
        inc_coef: f64,
        dec_coef: f64,
    ) -> Self {
        Self {
            sigma,
            alpha,
            conv_cnt: 0,
            conv_max,
            conv_min,
            inc_coef,
            dec_coef,
            last_err2: 0.0,
            updated: false,
        }
    }

    /// Returns true if the last call requested an update.
    #[inline]
    pub fn updated(&self) -> bool {
        self.updated
    }

    /// Returns the current learning factor.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Default for AdaptiveRate {
    fn default() -> Self {
        Self::new(0.0, 0.01)
    }
}

impl Criterion for AdaptiveRate {
    fn rate(&mut self, err_norm2: f64) -> f64 {
        self.updated = err_norm2 > self.sigma;
        if !self.updated {
            return 0.0; // no need for training
        }

        if err_norm2 < self.last_err2 {
            self.conv_cnt += 1;

            // Converges significantly.
            if self.conv_cnt >= self.conv_max {
                self.conv_cnt = 0;
                self.alpha *= self.inc_coef;
            }
        } else {
            // Divergence (or stagnation).
            self.conv_cnt -= 1;

            if self.conv_cnt <= self.conv_min {
                self.conv_cnt = 0;
                self.alpha *= self.dec_coef;
            }
        }

        self.last_err2 = err_norm2;

        self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_rate_stops_at_sigma() {
        let mut c = ConstantRate::new(0.5, 0.1);

        assert_eq!(c.rate(1.0), 0.1);
        assert!(c.updated());

        assert_eq!(c.rate(0.5), 0.0);
        assert!(!c.updated());
    }

    #[test]
    fn adaptive_rate_grows_on_sustained_convergence() {
        let mut c = AdaptiveRate::with_adaptation(0.0, 0.1, 3, -2, 2.0, 0.5);

        // First call: err > last_err2 (0), counts as divergence (counter -1).
        c.rate(10.0);
        // Three converging steps bring the counter back up to 2.
        c.rate(9.0);
        c.rate(8.0);
        c.rate(7.0);
        // The fourth reaches conv_max and doubles the factor.
        c.rate(6.0);
        assert!((c.alpha() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn adaptive_rate_shrinks_on_divergence() {
        let mut c = AdaptiveRate::with_adaptation(0.0, 0.1, 5, -1, 1.5, 0.5);

        c.rate(1.0); // divergence vs initial 0: counter hits -1, alpha halves
        assert!((c.alpha() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn adaptive_rate_returns_zero_below_sigma() {
        let mut c = AdaptiveRate::new(1.0, 0.1);
        assert_eq!(c.rate(0.5), 0.0);
        assert!(!c.updated());
    }
}
