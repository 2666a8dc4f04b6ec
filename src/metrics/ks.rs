use crate::input::frame::Frame;
use crate::input::mask::Mask;
use crate::metrics::kolmogorov::kstwo_sf;
use crate::metrics::roi::{RegionError, extract_regions};
use crate::metrics::{MetricError, require_non_empty};

/// Largest sample size for which the exact p-value is computed.
pub const EXACT_MAX_N: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KsMethod {
    Exact,
    Asymptotic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    pub statistic: f64,
    pub p_value: f64,
    pub method: KsMethod,
}

/// KS outcome for one mask region. Both fields are `None` when the region had
/// no pixels in either image.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KsRegion {
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
}

impl KsRegion {
    pub fn is_absent(&self) -> bool {
        self.statistic.is_none() && self.p_value.is_none()
    }
}

impl From<KsResult> for KsRegion {
    fn from(value: KsResult) -> Self {
        Self {
            statistic: Some(value.statistic),
            p_value: Some(value.p_value),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KsPair {
    pub region_a: KsRegion,
    pub region_b: KsRegion,
}

/// Two-sided two-sample Kolmogorov-Smirnov test.
pub fn ks_2samp(a: &[f64], b: &[f64]) -> Result<KsResult, MetricError> {
    require_non_empty(a, "first sample")?;
    require_non_empty(b, "second sample")?;

    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(|x, y| x.total_cmp(y));
    b.sort_by(|x, y| x.total_cmp(y));

    let d = ks_statistic_sorted(&a, &b);
    let (n1, n2) = (a.len(), b.len());

    if n1.max(n2) <= EXACT_MAX_N {
        return Ok(KsResult {
            statistic: d,
            p_value: exact_p_value(n1, n2, d),
            method: KsMethod::Exact,
        });
    }

    Ok(KsResult {
        statistic: d,
        p_value: asymptotic_p_value(n1, n2, d),
        method: KsMethod::Asymptotic,
    })
}

/// Finite-n Kolmogorov tail at the effective size `n1*n2/(n1+n2)`, rounded
/// half to even.
pub fn asymptotic_p_value(n1: usize, n2: usize, d: f64) -> f64 {
    let (m, n) = (n1.max(n2) as f64, n1.min(n2) as f64);
    let en = m * n / (m + n);
    kstwo_sf(en.round_ties_even() as u64, d).clamp(0.0, 1.0)
}

/// Max distance between the right-continuous empirical CDFs of two sorted samples.
pub fn ks_statistic_sorted(a: &[f64], b: &[f64]) -> f64 {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut d = 0f64;
    while i < a.len() && j < b.len() {
        let v = if a[i] <= b[j] { a[i] } else { b[j] };
        while i < a.len() && a[i] <= v {
            i += 1;
        }
        while j < b.len() && b[j] <= v {
            j += 1;
        }
        d = d.max((i as f64 / n1 - j as f64 / n2).abs());
    }
    d
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// `P(D >= d)` for continuous data, as one minus the fraction of monotone
/// lattice paths from (0, 0) to (n1, n2) that keep `|i/n1 - j/n2| < d`.
/// `u[j]` holds paths-inside / binom(i + j, j), so values stay in [0, 1].
pub fn exact_p_value(n1: usize, n2: usize, d: f64) -> f64 {
    let (m, n) = (n1 as u64, n2 as u64);
    let g = gcd(m, n);
    let lcm = (m / g) * n;
    let h = (d * lcm as f64).round() as u64;
    if h == 0 {
        return 1.0;
    }
    let bound = (h * g) as i64;
    let inside = |i: usize, j: usize| ((i as i64) * (n as i64) - (j as i64) * (m as i64)).abs() < bound;

    let mut u = vec![0f64; n2 + 1];
    u[0] = 1.0;
    for j in 1..=n2 {
        u[j] = if inside(0, j) { u[j - 1] } else { 0.0 };
    }
    for i in 1..=n1 {
        if !inside(i, 0) {
            u[0] = 0.0;
        }
        let mut any = u[0] > 0.0;
        for j in 1..=n2 {
            u[j] = if inside(i, j) {
                (i as f64 * u[j] + j as f64 * u[j - 1]) / (i + j) as f64
            } else {
                0.0
            };
            any |= u[j] > 0.0;
        }
        if !any {
            return 1.0;
        }
    }
    (1.0 - u[n2]).clamp(0.0, 1.0)
}

fn ks_region(original: &[f64], denoised: &[f64]) -> KsRegion {
    match ks_2samp(original, denoised) {
        Ok(result) => result.into(),
        Err(_) => KsRegion::default(),
    }
}

/// KS test of original vs denoised pixels inside the foreground (A) and
/// background (B) regions of the same mask.
pub fn ks_region_pair(
    original: &Frame,
    denoised: &Frame,
    mask: &Mask,
) -> Result<KsPair, RegionError> {
    let orig = extract_regions(original, mask)?;
    let den = extract_regions(denoised, mask)?;
    Ok(KsPair {
        region_a: ks_region(&orig.foreground, &den.foreground),
        region_b: ks_region(&orig.background, &den.background),
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/metrics/ks.rs"]
mod tests;
