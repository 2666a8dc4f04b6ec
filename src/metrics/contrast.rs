use crate::metrics::{MetricError, mean, require_non_empty, variance};

pub const GCNR_BINS: usize = 256;

/// `(mean(fg) - mean(bg)) / sqrt(var(fg) + var(bg))`. Zero variance on both
/// sides yields NaN or an infinity, which is returned as is.
pub fn cnr(fg: &[f64], bg: &[f64]) -> Result<f64, MetricError> {
    require_non_empty(fg, "foreground")?;
    require_non_empty(bg, "background")?;
    Ok((mean(fg) - mean(bg)) / (variance(fg) + variance(bg)).sqrt())
}

/// One minus the overlap of the two normalized intensity histograms.
pub fn gcnr(fg: &[f64], bg: &[f64]) -> Result<f64, MetricError> {
    require_non_empty(fg, "foreground")?;
    require_non_empty(bg, "background")?;

    let (first, last) = histogram_range(fg.iter().chain(bg.iter()).copied());
    let edges = bin_edges(first, last, GCNR_BINS);
    let f = normalized_density(fg, &edges);
    let g = normalized_density(bg, &edges);

    let overlap: f64 = f.iter().zip(g.iter()).map(|(a, b)| a.min(*b)).sum();
    Ok(1.0 - overlap)
}

/// Min/max of the values; a degenerate range is widened by 0.5 on each side.
pub fn histogram_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

pub fn bin_edges(first: f64, last: f64, bins: usize) -> Vec<f64> {
    let step = (last - first) / bins as f64;
    let mut edges = Vec::with_capacity(bins + 1);
    for i in 0..bins {
        edges.push(first + i as f64 * step);
    }
    edges.push(last);
    edges
}

/// Counts per bin; bins are half-open except the last, which is closed.
/// Values outside `[edges[0], edges[n]]` are dropped.
pub fn histogram_counts(values: &[f64], edges: &[f64]) -> Vec<u64> {
    let bins = edges.len() - 1;
    let first = edges[0];
    let last = edges[bins];
    let norm = bins as f64 / (last - first);
    let mut counts = vec![0u64; bins];
    for &v in values {
        if !(v >= first && v <= last) {
            continue;
        }
        let mut idx = ((v - first) * norm) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        if v < edges[idx] {
            idx = idx.saturating_sub(1);
        } else if idx != bins - 1 && v >= edges[idx + 1] {
            idx += 1;
        }
        counts[idx] += 1;
    }
    counts
}

fn normalized_density(values: &[f64], edges: &[f64]) -> Vec<f64> {
    let counts = histogram_counts(values, edges);
    let total: u64 = counts.iter().sum();
    let mut density: Vec<f64> = counts
        .iter()
        .zip(edges.windows(2))
        .map(|(&c, w)| c as f64 / (total as f64 * (w[1] - w[0])))
        .collect();
    let sum: f64 = density.iter().sum();
    for d in &mut density {
        *d /= sum;
    }
    density
}

#[cfg(test)]
#[path = "../../tests/src_inline/metrics/contrast.rs"]
mod tests;
