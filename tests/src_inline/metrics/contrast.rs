use super::*;
use crate::metrics::MetricError;

fn lcg(seed: u64, n: usize, scale: f64, offset: f64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            offset + scale * ((state >> 33) as f64 / (1u64 << 31) as f64)
        })
        .collect()
}

#[test]
fn test_identical_constant_regions() {
    let a = vec![42.0; 10];
    let g = gcnr(&a, &a).unwrap();
    assert!(g.abs() < 1e-12, "gcnr = {g}");
    assert!(cnr(&a, &a).unwrap().is_nan());
}

#[test]
fn test_identical_varied_regions() {
    let a = lcg(7, 500, 255.0, 0.0);
    assert!(gcnr(&a, &a).unwrap().abs() < 1e-12);
    assert_eq!(cnr(&a, &a).unwrap(), 0.0);
}

#[test]
fn test_disjoint_regions_are_fully_separated() {
    let fg = lcg(1, 200, 50.0, 200.0);
    let bg = lcg(2, 300, 50.0, 0.0);
    assert!((gcnr(&fg, &bg).unwrap() - 1.0).abs() < 1e-12);
    assert!(cnr(&fg, &bg).unwrap() > 0.0);
    assert!(cnr(&bg, &fg).unwrap() < 0.0);
}

#[test]
fn test_gcnr_symmetric_and_bounded() {
    for seed in 0..20u64 {
        let a = lcg(seed, 50 + seed as usize, 100.0, 0.0);
        let b = lcg(seed + 100, 80, 120.0, 30.0);
        let ab = gcnr(&a, &b).unwrap();
        let ba = gcnr(&b, &a).unwrap();
        assert!((ab - ba).abs() < 1e-12);
        assert!((-1e-12..=1.0 + 1e-12).contains(&ab), "gcnr = {ab}");
    }
}

#[test]
fn test_cnr_formula() {
    let fg = [4.0, 6.0];
    let bg = [1.0, 1.0, 1.0, 5.0];
    // means 5 and 2, population variances 1 and 3
    let expected = 3.0 / 2.0;
    assert!((cnr(&fg, &bg).unwrap() - expected).abs() < 1e-12);
}

#[test]
fn test_cnr_infinite_when_only_means_differ() {
    let v = cnr(&[3.0, 3.0], &[1.0]).unwrap();
    assert!(v.is_infinite() && v > 0.0);
}

#[test]
fn test_empty_region_is_contract_violation() {
    assert_eq!(gcnr(&[], &[1.0]), Err(MetricError::EmptyRegion("foreground")));
    assert_eq!(cnr(&[1.0], &[]), Err(MetricError::EmptyRegion("background")));
}

#[test]
fn test_histogram_last_bin_closed() {
    let edges = bin_edges(0.0, 4.0, 4);
    assert_eq!(edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    let counts = histogram_counts(&[0.0, 1.0, 1.5, 3.999, 4.0], &edges);
    assert_eq!(counts, vec![1, 2, 0, 2]);
}

#[test]
fn test_degenerate_range_widened() {
    assert_eq!(histogram_range([3.0, 3.0].into_iter()), (2.5, 3.5));
    assert_eq!(histogram_range([1.0, 3.0].into_iter()), (1.0, 3.0));
}
