//! Survival function of the one-sample two-sided Kolmogorov statistic `D_n`
//! for finite `n`.
//!
//! Method choice per region of `(n, x)`:
//! - Ruben-Gambino closed forms near `x = 1/(2n)` and `x = 1 - 1/n`;
//! - `2 * P(D_n+ >= x)` (Birnbaum-Tingey sum) in the upper tail;
//! - the Durbin matrix with Marsaglia-Tsang-Wang scaling where it is cheap;
//! - the Pelz-Good expansion otherwise.

use std::f64::consts::PI;

use nalgebra::DMatrix;

const PI_SQUARED: f64 = PI * PI;
const MIN_LOG: f64 = -708.0;
const SCALE_EXP: i32 = 128;

/// Largest `n` for which the one-sided tail is summed exactly.
const SMIRNOV_MAX_COMPUTE_N: u64 = 1_000_000;

/// `P(D_n > x)`, clipped to [0, 1]. `n == 0` is undefined and yields NaN.
pub fn kstwo_sf(n: u64, x: f64) -> f64 {
    if n == 0 || x.is_nan() {
        return f64::NAN;
    }
    if x >= 1.0 {
        return 0.0;
    }
    if x <= 0.0 {
        return 1.0;
    }
    let nf = n as f64;
    let t = nf * x;
    if t <= 1.0 {
        if t <= 0.5 {
            return 1.0;
        }
        let cdf = (log_factorial_over_power(n) + nf * (2.0 * t - 1.0).ln()).exp();
        return clip(1.0 - cdf);
    }
    if t >= nf - 1.0 {
        return clip(2.0 * (1.0 - x).powf(nf));
    }
    if x >= 0.5 {
        return clip(2.0 * smirnov_sf(n, x));
    }

    let nx_squared = t * x;
    if n <= 140 {
        if nx_squared <= 4.0 {
            return clip(1.0 - durbin_cdf(n, x));
        }
        return clip(2.0 * smirnov_sf(n, x));
    }
    if nx_squared >= 370.0 {
        return 0.0;
    }
    if nx_squared >= 2.2 {
        return clip(2.0 * smirnov_sf(n, x));
    }
    let cdf = if n <= 100_000 && nf * x.powf(1.5) <= 1.4 {
        durbin_cdf(n, x)
    } else {
        pelz_good_cdf(n, x)
    };
    clip(1.0 - cdf)
}

fn clip(p: f64) -> f64 {
    p.clamp(0.0, 1.0)
}

/// `ln(n! / n^n)`.
fn log_factorial_over_power(n: u64) -> f64 {
    let nf = n as f64;
    (1..=n).map(|k| (k as f64 / nf).ln()).sum()
}

/// One-sided `P(D_n+ >= x)`:
/// `x * sum_j C(n, j) (1 - x - j/n)^(n-j) (x + j/n)^(j-1)` over `j <= n(1 - x)`.
pub fn smirnov_sf(n: u64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if x >= 1.0 {
        return 0.0;
    }
    let nf = n as f64;
    if n > SMIRNOV_MAX_COMPUTE_N {
        return (-(6.0 * nf * x + 1.0).powi(2) / (18.0 * nf)).exp();
    }

    let nx = nf * x;
    let j_max = (nf - nx).floor() as u64;
    let mut logs = Vec::with_capacity(j_max as usize + 1);
    let mut log_binom = 0f64;
    for j in 0..=j_max {
        if j > 0 {
            log_binom += ((n - j + 1) as f64).ln() - (j as f64).ln();
        }
        let rest = n - j;
        let left = if rest == 0 {
            0.0
        } else {
            let a = rest as f64 - nx;
            if a <= 0.0 {
                continue;
            }
            rest as f64 * (a / nf).ln()
        };
        let right = (j as f64 - 1.0) * ((nx + j as f64) / nf).ln();
        logs.push(log_binom + left + right);
    }

    let Some(max) = logs.iter().copied().reduce(f64::max) else {
        return 0.0;
    };
    let sum: f64 = logs.iter().map(|l| (l - max).exp()).sum();
    clip(x * sum * max.exp())
}

/// `P(D_n <= d)` from the `k`-th diagonal entry of `H^n`, Durbin (1968),
/// with the power scaling of Marsaglia, Tsang and Wang (2003).
pub fn durbin_cdf(n: u64, d: f64) -> f64 {
    if d >= 1.0 {
        return 1.0;
    }
    let nd = n as f64 * d;
    if nd <= 0.5 {
        return 0.0;
    }
    let k = nd.ceil() as usize;
    let h = k as f64 - nd;
    let m = 2 * k - 1;

    // v[j] = (1 - h^(j+1)) / (j+1)!, w[j] = 1 / j!
    let mut v = vec![0f64; m];
    let mut w = vec![0f64; m];
    let mut fac = 1.0;
    for j in 1..=m {
        w[j - 1] = fac;
        fac /= j as f64;
        v[j - 1] = (1.0 - h.powi(j as i32)) * fac;
    }
    let tt = (2.0 * h - 1.0).max(0.0).powi(m as i32) - 2.0 * h.powi(m as i32);
    v[m - 1] = (1.0 + tt) * fac;

    let mut hm = DMatrix::<f64>::zeros(m, m);
    for i in 1..m {
        for r in (i - 1)..m {
            hm[(r, i)] = w[r + 1 - i];
        }
    }
    for r in 0..m {
        hm[(r, 0)] = v[r];
    }
    for c in 0..m {
        hm[(m - 1, c)] = v[m - 1 - c];
    }

    let scale = 2f64.powi(SCALE_EXP);
    let mut power = DMatrix::<f64>::identity(m, m);
    let mut exponent = 0i32;
    let mut h_exponent = 0i32;
    let mut nn = n;
    while nn > 0 {
        if nn % 2 == 1 {
            power = &power * &hm;
            exponent += h_exponent;
        }
        hm = &hm * &hm;
        h_exponent *= 2;
        if hm[(k - 1, k - 1)].abs() > scale {
            hm /= scale;
            h_exponent += SCALE_EXP;
        }
        nn /= 2;
    }

    let nf = n as f64;
    let mut p = power[(k - 1, k - 1)];
    for i in 1..=n {
        p = i as f64 * p / nf;
        if p.abs() < 1.0 / scale {
            p *= scale;
            exponent -= SCALE_EXP;
        }
    }
    clip(ldexp(p, exponent))
}

/// `p * 2^exponent` without overflowing the intermediate power.
fn ldexp(mut p: f64, mut exponent: i32) -> f64 {
    while exponent != 0 && p != 0.0 && p.is_finite() {
        let step = exponent.clamp(-1000, 1000);
        p *= 2f64.powi(step);
        exponent -= step;
    }
    p
}

/// Pelz-Good (1976) expansion of `P(D_n <= x)` in powers of `1/sqrt(n)`.
pub fn pelz_good_cdf(n: u64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let nf = n as f64;
    let z = nf.sqrt() * x;
    let z2 = z * z;
    let z3 = z2 * z;
    let z4 = z2 * z2;
    let z6 = z4 * z2;

    let q_log = -PI_SQUARED / 8.0 / z2;
    if q_log < MIN_LOG {
        return 0.0;
    }
    let q = q_log.exp();

    let pi4 = PI_SQUARED * PI_SQUARED;
    let pi6 = pi4 * PI_SQUARED;
    let k1a = -z2;
    let k1b = PI_SQUARED / 4.0;
    let k2a = 6.0 * z6 + 2.0 * z4;
    let k2b = (2.0 * z4 - 5.0 * z2) * PI_SQUARED / 4.0;
    let k2c = pi4 * (1.0 - 2.0 * z2) / 16.0;
    let k3d = pi6 * (5.0 - 30.0 * z2) / 64.0;
    let k3c = pi4 * (-60.0 * z2 + 212.0 * z4) / 16.0;
    let k3b = PI_SQUARED * (135.0 * z4 - 96.0 * z6) / 4.0;
    let k3a = -30.0 * z6 - 90.0 * z4 * z4;

    // Horner over odd m = 2k - 1 of c_k q^(m^2)
    let max_k = (16.0 * z / PI).ceil() as u64;
    let mut terms = [0f64; 4];
    for k in (1..=max_k).rev() {
        let m = (2 * k - 1) as f64;
        let m2 = m * m;
        let m4 = m2 * m2;
        let m6 = m4 * m2;
        let q_power = q.powf(8.0 * k as f64);
        let coeffs = [
            1.0,
            k1a + k1b * m2,
            k2a + k2b * m2 + k2c * m4,
            k3a + k3b * m2 + k3c * m4 + k3d * m6,
        ];
        for (t, c) in terms.iter_mut().zip(coeffs) {
            *t = *t * q_power + c;
        }
    }
    let sqrt_2pi = (2.0 * PI).sqrt();
    let denominators = [z, 6.0 * z4, 72.0 * z6 * z, 6480.0 * z6 * z4];
    for (t, den) in terms.iter_mut().zip(denominators) {
        *t *= q * sqrt_2pi / den;
    }

    let q = (-PI_SQUARED / 2.0 / z2).exp();
    let sqrt3_z = 3f64.sqrt() * z;
    let mut k2_extra = 0f64;
    let mut k3_extra = 0f64;
    for k in (1..=max_k).rev() {
        let kf = k as f64;
        let k2 = kf * kf;
        let qk = q.powf(k2);
        let kpi = PI * kf;
        k2_extra += k2 * qk;
        k3_extra += (sqrt3_z + kpi) * (sqrt3_z - kpi) * k2 * qk;
    }
    terms[2] += k2_extra * PI_SQUARED * sqrt_2pi / (-36.0 * z3);
    terms[3] += k3_extra * PI_SQUARED * sqrt_2pi / (216.0 * z6);

    terms
        .iter()
        .enumerate()
        .map(|(i, t)| t / nf.powf(i as f64 / 2.0))
        .sum()
}

#[cfg(test)]
#[path = "../../tests/src_inline/metrics/kolmogorov.rs"]
mod tests;
