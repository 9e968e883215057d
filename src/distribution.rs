//! Probability distributions for the analysis engine.
//!
//! Provides:
//! - [`DistributionOracle`], the seam through which the calculators reach the
//!   F and Student's t distributions
//! - [`IncompleteBeta`], the built-in oracle (Lanczos log gamma and a
//!   continued-fraction regularized incomplete beta)
//! - `StatrsOracle`, backed by the `statrs` crate (requires the `statrs` feature)
//!
//! Oracles never panic on degenerate parameters. Non-positive degrees of
//! freedom make [`DistributionOracle::f_cdf`] return `0.0` (an upper-tail
//! p-value of `1.0`) and [`DistributionOracle::t_quantile`] return NaN, which
//! the standard error calculator replaces with its fallback critical value.

use std::f64::consts::PI;

use crate::error::{Error, Result};

/// Source of the F and Student's t distribution functions.
///
/// Implementations must be pure functions of their arguments, so a single
/// oracle can be shared freely between threads.
pub trait DistributionOracle: Send + Sync {
    /// Cumulative distribution function of the F distribution, P(F ≤ f).
    ///
    /// Returns `0.0` when `f ≤ 0` or either degrees of freedom is not positive.
    fn f_cdf(&self, f: f64, df1: f64, df2: f64) -> f64;

    /// Quantile (inverse CDF) of Student's t distribution.
    ///
    /// Returns NaN when `p` is outside (0, 1) or `df` is not positive.
    fn t_quantile(&self, p: f64, df: f64) -> f64;

    /// Upper-tail probability of the F distribution, P(F > f).
    fn f_sf(&self, f: f64, df1: f64, df2: f64) -> f64 {
        1.0 - self.f_cdf(f, df1, df2)
    }

    /// Checked quantile of Student's t distribution.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProbability`] when `p` is outside (0, 1), and
    /// [`Error::InvalidParams`] when `df` is not positive and finite or the
    /// oracle produces no quantile.
    fn try_t_quantile(&self, p: f64, df: f64) -> Result<f64> {
        if !(p > 0.0 && p < 1.0) {
            return Err(Error::InvalidProbability(p));
        }
        if !valid_df(df) {
            return Err(Error::invalid_params(format!(
                "degrees of freedom must be positive, got {df}"
            )));
        }
        let t = self.t_quantile(p, df);
        if t.is_nan() {
            return Err(Error::invalid_params(format!(
                "no t quantile for p = {p}, df = {df}"
            )));
        }
        Ok(t)
    }
}

/// Built-in oracle based on the regularized incomplete beta function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncompleteBeta;

impl IncompleteBeta {
    /// Cumulative distribution function of Student's t distribution.
    #[must_use]
    pub fn t_cdf(&self, t: f64, df: f64) -> f64 {
        if !valid_df(df) || t.is_nan() {
            return f64::NAN;
        }
        if t.is_infinite() {
            return if t > 0.0 { 1.0 } else { 0.0 };
        }
        let x = df / (df + t * t);
        let tail = 0.5 * regularized_incomplete_beta(x, df / 2.0, 0.5);
        if t > 0.0 {
            1.0 - tail
        } else {
            tail
        }
    }

    /// Probability density function of Student's t distribution.
    fn t_pdf(t: f64, df: f64) -> f64 {
        let ln_norm = ln_gamma((df + 1.0) / 2.0) - ln_gamma(df / 2.0) - 0.5 * (df * PI).ln();
        (ln_norm - (df + 1.0) / 2.0 * (t * t / df).ln_1p()).exp()
    }
}

impl DistributionOracle for IncompleteBeta {
    fn f_cdf(&self, f: f64, df1: f64, df2: f64) -> f64 {
        if f.is_nan() || f <= 0.0 || !valid_df(df1) || !valid_df(df2) {
            return 0.0;
        }
        // P(F ≤ f) = I_x(df1/2, df2/2) where x = df1·f / (df1·f + df2)
        let x = df1 * f / (df1 * f + df2);
        regularized_incomplete_beta(x, df1 / 2.0, df2 / 2.0)
    }

    fn f_sf(&self, f: f64, df1: f64, df2: f64) -> f64 {
        if f.is_nan() || f <= 0.0 || !valid_df(df1) || !valid_df(df2) {
            return 1.0;
        }
        // P(F > f) = I_x(df2/2, df1/2) where x = df2 / (df2 + df1·f)
        let x = df2 / (df2 + df1 * f);
        regularized_incomplete_beta(x, df2 / 2.0, df1 / 2.0)
    }

    fn t_quantile(&self, p: f64, df: f64) -> f64 {
        if !(p > 0.0 && p < 1.0) || !valid_df(df) {
            return f64::NAN;
        }
        if p < 0.5 {
            return -self.t_quantile(1.0 - p, df);
        }
        if p == 0.5 {
            return 0.0;
        }

        // Bracket the root on the positive half-line.
        let mut lo = 0.0;
        let mut hi = 1.0;
        while self.t_cdf(hi, df) < p {
            lo = hi;
            hi *= 2.0;
            if hi > 1e300 {
                return f64::INFINITY;
            }
        }

        // Newton steps, falling back to bisection whenever a step leaves the bracket.
        const MAX_ITERATIONS: usize = 200;
        const TOLERANCE: f64 = 1e-14;
        let mut t = 0.5 * (lo + hi);
        for _ in 0..MAX_ITERATIONS {
            let err = self.t_cdf(t, df) - p;
            if err == 0.0 {
                break;
            }
            if err < 0.0 {
                lo = t;
            } else {
                hi = t;
            }

            let density = Self::t_pdf(t, df);
            let newton = t - err / density;
            let next = if density > 0.0 && newton > lo && newton < hi {
                newton
            } else {
                0.5 * (lo + hi)
            };

            let step = (next - t).abs();
            t = next;
            if step <= TOLERANCE * t.abs().max(1.0) {
                break;
            }
        }
        t
    }
}

/// Oracle backed by the `statrs` crate.
#[cfg(feature = "statrs")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatrsOracle;

#[cfg(feature = "statrs")]
impl DistributionOracle for StatrsOracle {
    fn f_cdf(&self, f: f64, df1: f64, df2: f64) -> f64 {
        use statrs::distribution::{ContinuousCDF, FisherSnedecor};

        if f.is_nan() || f <= 0.0 || !valid_df(df1) || !valid_df(df2) {
            return 0.0;
        }
        FisherSnedecor::new(df1, df2).map_or(0.0, |dist| dist.cdf(f))
    }

    fn t_quantile(&self, p: f64, df: f64) -> f64 {
        use statrs::distribution::{ContinuousCDF, StudentsT};

        if !(p > 0.0 && p < 1.0) || !valid_df(df) {
            return f64::NAN;
        }
        StudentsT::new(0.0, 1.0, df).map_or(f64::NAN, |dist| dist.inverse_cdf(p))
    }
}

fn valid_df(df: f64) -> bool {
    df.is_finite() && df > 0.0
}

/// Log gamma function using Lanczos approximation.
///
/// # Arguments
/// * `x` - Input value (must be positive)
///
/// # Returns
/// * ln(Gamma(x)), or infinity for non-positive input
#[must_use]
pub fn ln_gamma(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::INFINITY;
    }

    // Lanczos approximation coefficients (g=7)
    const G: f64 = 7.0;
    const COEFFICIENTS: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_13,
        -176.615_029_162_140_59,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_571_6e-6,
        1.505_632_735_149_311_6e-7,
    ];

    let x = x - 1.0;
    let mut sum = COEFFICIENTS[0];
    for (i, &c) in COEFFICIENTS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }

    let t = x + G + 0.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Regularized incomplete beta function I_x(a, b).
///
/// Evaluated by the continued fraction expansion with the modified Lentz
/// algorithm, switching to the symmetry relation
/// `I_x(a, b) = 1 − I_{1−x}(b, a)` where the fraction converges slowly.
///
/// # Arguments
/// * `x` - Integration bound (0 <= x <= 1)
/// * `a` - First shape parameter (> 0)
/// * `b` - Second shape parameter (> 0)
#[must_use]
pub fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(1.0 - x, b, a);
    }

    let ln_beta = ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b);
    let front = (x.ln() * a + (1.0 - x).ln() * b - ln_beta).exp() / a;

    // Lentz: f converges to 1 + CF, so the fraction itself is f − 1.
    let mut f = 1.0;
    let mut c = 1.0;
    let mut d = 0.0;
    const EPSILON: f64 = 1e-300;
    const TOLERANCE: f64 = 1e-15;
    const MAX_ITERATIONS: usize = 300;

    for m in 0..MAX_ITERATIONS {
        let m_f = m as f64;

        // Even step: d_{2m}
        let numerator = if m == 0 {
            1.0
        } else {
            (m_f * (b - m_f) * x) / ((a + 2.0 * m_f - 1.0) * (a + 2.0 * m_f))
        };

        d = 1.0 + numerator * d;
        if d.abs() < EPSILON {
            d = EPSILON;
        }
        d = 1.0 / d;

        c = 1.0 + numerator / c;
        if c.abs() < EPSILON {
            c = EPSILON;
        }

        f *= d * c;

        // Odd step: d_{2m+1}
        let numerator =
            -((a + m_f) * (a + b + m_f) * x) / ((a + 2.0 * m_f) * (a + 2.0 * m_f + 1.0));

        d = 1.0 + numerator * d;
        if d.abs() < EPSILON {
            d = EPSILON;
        }
        d = 1.0 / d;

        c = 1.0 + numerator / c;
        if c.abs() < EPSILON {
            c = EPSILON;
        }

        let delta = d * c;
        f *= delta;

        if (delta - 1.0).abs() < TOLERANCE {
            break;
        }
    }

    front * (f - 1.0)
}
