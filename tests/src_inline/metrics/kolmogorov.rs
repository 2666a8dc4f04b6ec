use super::*;

fn close(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}

// Reference values below are P(D_n > x) from the Durbin matrix evaluated in
// 80-digit arithmetic.

#[test]
fn test_closed_form_regions() {
    assert_eq!(kstwo_sf(10, 0.04), 1.0);
    assert!(close(kstwo_sf(1, 0.75), 0.5, 1e-15));
    assert!(close(kstwo_sf(2, 0.75), 0.125, 1e-15));
    assert_eq!(kstwo_sf(50, 1.0), 0.0);
    assert_eq!(kstwo_sf(50, 0.0), 1.0);
    assert!(kstwo_sf(0, 0.3).is_nan());
}

#[test]
fn test_small_n_durbin_region() {
    assert!(close(kstwo_sf(10, 0.3), 0.270_535_574_8, 1e-12));
    assert!(close(kstwo_sf(50, 0.1), 0.662_311_270_465_818_5, 1e-13));
    assert!(close(kstwo_sf(100, 0.05), 0.953_215_971_063_572_5, 1e-13));
    assert!(close(kstwo_sf(100, 0.2), 0.000_555_192_732_802_809_7, 1e-14));
}

#[test]
fn test_upper_tail_uses_one_sided_sum() {
    assert!(close(kstwo_sf(50, 0.3), 0.000_173_532_602_027_180_66, 1e-15));
    assert!(close(kstwo_sf(150, 0.15), 0.002_067_286_297_249_452, 1e-11));
    assert!(close(kstwo_sf(1000, 0.05), 0.013_012_071_309_966_894, 1e-8));
}

#[test]
fn test_large_n_central_region() {
    // Pelz-Good
    assert!(close(kstwo_sf(400, 0.04), 0.530_890_273_746_152_8, 1e-6));
    assert!(close(kstwo_sf(1000, 0.03), 0.322_690_246_413_3, 1e-6));
    // Durbin, n * x^1.5 <= 1.4
    assert!(close(kstwo_sf(1000, 0.01), 1.0 - durbin_cdf(1000, 0.01), 1e-15));
}

#[test]
fn test_durbin_matches_reference() {
    assert!(close(durbin_cdf(1000, 0.03), 1.0 - 0.322_690_246_413_3, 1e-9));
    assert_eq!(durbin_cdf(10, 0.04), 0.0);
    assert_eq!(durbin_cdf(10, 1.0), 1.0);
}

#[test]
fn test_smirnov_single_sample() {
    assert!(close(smirnov_sf(1, 0.3), 0.7, 1e-12));
    assert_eq!(smirnov_sf(5, 0.0), 1.0);
    assert_eq!(smirnov_sf(5, 1.0), 0.0);
}

#[test]
fn test_survival_is_non_increasing() {
    for n in [5u64, 120, 141, 5000, 200_000] {
        let mut last = 1.0;
        for i in 1..200 {
            let x = i as f64 / 400.0;
            let p = kstwo_sf(n, x);
            assert!((0.0..=1.0).contains(&p), "n = {n}, x = {x}, p = {p}");
            assert!(p <= last + 1e-6, "n = {n}, x = {x}: {p} > {last}");
            last = p;
        }
    }
}
