//! Descriptive statistics and the two tests the comparator reports.
//!
//! Everything here works on `f64` samples and has no notion of coverage.
//! The Student-t quantile and the normal tail are computed directly from
//! `libm`'s `lgamma`/`erfc` so the crate needs no statistics dependency.

use std::f64::consts::SQRT_2;

use serde::{Deserialize, Serialize};

/// Two-sided confidence interval around a mean.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
}

/// Mean, spread and interval of a sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub n: usize,
    pub mean: f64,
    /// Population standard deviation (divides by `n`).
    pub std: f64,
    /// `mean ± t(1-α/2, n-1) · s/√n` with `s` the sample deviation.
    /// `None` when `n < 2`.
    pub interval: Option<ConfidenceInterval>,
}

/// Result of a two-sided Mann–Whitney U test.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MannWhitney {
    /// U statistic of the first sample.
    pub u: f64,
    pub p_value: f64,
}

/// Describe `values` at the given two-sided `confidence` level.
///
/// Returns `None` for an empty sample.
#[must_use]
pub fn describe(values: &[f64], confidence: f64) -> Option<Distribution> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    let std = (sum_sq / nf).sqrt();

    let interval = (n >= 2).then(|| {
        let sem = (sum_sq / (nf - 1.0)).sqrt() / nf.sqrt();
        let h = sem * student_t_quantile(f64::midpoint(1.0, confidence), nf - 1.0);
        ConfidenceInterval {
            low: mean - h,
            high: mean + h,
        }
    });

    Some(Distribution {
        n,
        mean,
        std,
        interval,
    })
}

/// Median of `values`, averaging the two middle elements for even lengths.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(f64::midpoint(sorted[mid - 1], sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// Mean absolute deviation around the mean.
#[must_use]
pub fn mean_absolute_deviation(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let nf = values.len() as f64;
    let mean = values.iter().sum::<f64>() / nf;
    Some(values.iter().map(|v| (v - mean).abs()).sum::<f64>() / nf)
}

/// Two-sided Mann–Whitney U test of `x` against `y`.
///
/// Uses the normal approximation with tie correction and a continuity
/// correction of one half. When every observation is tied the variance
/// vanishes and the test reports `p = 1`. Returns `None` if either sample
/// is empty.
#[must_use]
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> Option<MannWhitney> {
    if x.is_empty() || y.is_empty() {
        return None;
    }
    let n1 = x.len() as f64;
    let n2 = y.len() as f64;
    let n = n1 + n2;

    let mut pooled: Vec<(f64, bool)> = x
        .iter()
        .map(|&v| (v, true))
        .chain(y.iter().map(|&v| (v, false)))
        .collect();
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut rank_sum_x = 0.0;
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < pooled.len() {
        let mut end = start + 1;
        while end < pooled.len() && pooled[end].0 == pooled[start].0 {
            end += 1;
        }
        // Ranks are 1-based; a tied group shares the mean of its ranks.
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let ties = (end - start) as f64;
        tie_term += ties.powi(3) - ties;
        rank_sum_x += avg_rank * pooled[start..end].iter().filter(|(_, in_x)| *in_x).count() as f64;
        start = end;
    }

    let u1 = rank_sum_x - n1 * (n1 + 1.0) / 2.0;
    let u2 = n1 * n2 - u1;
    let mu = n1 * n2 / 2.0;
    let sigma = (n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();

    let p_value = if sigma > 0.0 {
        let z = (u1.max(u2) - mu - 0.5) / sigma;
        (2.0 * normal_sf(z)).min(1.0)
    } else {
        1.0
    };

    Some(MannWhitney { u: u1, p_value })
}

/// Upper tail of the standard normal distribution.
fn normal_sf(z: f64) -> f64 {
    0.5 * libm::erfc(z / SQRT_2)
}

/// Cumulative distribution function of Student's t with `df` degrees of
/// freedom.
#[must_use]
pub fn student_t_cdf(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    let tail = 0.5 * incomplete_beta(df / 2.0, 0.5, x);
    if t > 0.0 { 1.0 - tail } else { tail }
}

/// Inverse of [`student_t_cdf`] for `p` in `(0, 1)`, found by bisection.
#[must_use]
pub fn student_t_quantile(p: f64, df: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if p < 0.5 {
        return -student_t_quantile(1.0 - p, df);
    }

    let mut lo = 0.0;
    let mut hi = 1.0;
    while student_t_cdf(hi, df) < p && hi < 1e12 {
        hi *= 2.0;
    }
    for _ in 0..200 {
        let mid = f64::midpoint(lo, hi);
        if student_t_cdf(mid, df) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-12 {
            break;
        }
    }
    f64::midpoint(lo, hi)
}

/// Regularized incomplete beta function `I_x(a, b)`.
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front =
        libm::lgamma(a + b) - libm::lgamma(a) - libm::lgamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The continued fraction converges fast only below this point; use the
    // symmetry I_x(a, b) = 1 - I_{1-x}(b, a) above it.
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Lentz evaluation of the incomplete beta continued fraction.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: u32 = 300;
    const EPS: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = f64::from(m);
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}
