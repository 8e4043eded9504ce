use approx::assert_abs_diff_eq;
use fastd2::internals::{embed, EmbeddingSpec};
use fastd2::prelude::*;

/// Uniform deviates from a 32-bit linear congruential map.
fn lcg_series(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed & 0xFFFF_FFFF;
    (0..n)
        .map(|_| {
            state = (1_664_525 * state + 1_013_904_223) % (1 << 32);
            state as f64 / 4_294_967_296.0
        })
        .collect()
}

/// Pairs `i < j` with `j - i >= max(theiler, 1)` and max-norm distance <= r
/// among delay vectors of dimension `m` (delay 1).
fn brute_force_counts(x: &[f64], m: usize, theiler: usize, scales: &[f64]) -> (Vec<u64>, u64) {
    let n = x.len() - (m - 1);
    let w = theiler.max(1);
    let mut counts = vec![0u64; scales.len()];
    let mut pairs = 0u64;
    for i in 0..n {
        for j in (i + w)..n {
            pairs += 1;
            let d = (0..m)
                .map(|a| (x[i + a] - x[j + a]).abs())
                .fold(0.0, f64::max);
            for (b, &r) in scales.iter().enumerate() {
                if d <= r {
                    counts[b] += 1;
                }
            }
        }
    }
    (counts, pairs)
}

#[test]
fn delay_vectors_of_a_ramp() {
    let sample = Sample::scalar(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    let points = embed(&sample, &EmbeddingSpec::scalar(0, 2, 1)).unwrap();
    assert_eq!(points.len(), 4);
    let rows: Vec<Vec<f64>> = (0..points.len()).map(|i| points.point(i).to_vec()).collect();
    assert_eq!(
        rows,
        vec![vec![1.0, 2.0], vec![2.0, 3.0], vec![3.0, 4.0], vec![4.0, 5.0]]
    );

    let points = embed(&sample, &EmbeddingSpec::scalar(0, 3, 2)).unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points.point(0).to_vec(), vec![1.0, 3.0, 5.0]);
}

#[test]
fn grid_counts_match_brute_force() {
    let x = lcg_series(300, 11);
    let scales = vec![0.01, 0.03, 0.1, 0.3];
    for theiler in [0, 5] {
        let summary = ScalingBuilder::new()
            .dimensions(2, 2)
            .theiler(theiler)
            .scales(scales.clone())
            .unlimited_pairs()
            .normalize(false)
            .metric(Metric::Maximum)
            .adapter(Adapter::CorrelationSum)
            .build()
            .unwrap()
            .fit(&x)
            .unwrap();

        let table = summary.table(2).unwrap();
        let (expected, pairs) = brute_force_counts(&x, 2, theiler, &scales);
        let counts: Vec<u64> = table.rows.iter().map(|r| r.count).collect();
        assert_eq!(counts, expected, "theiler = {theiler}");
        assert!(table.rows.iter().all(|r| r.norm == pairs));
    }
}

/// Same as [`brute_force_counts`] for a two-channel series embedded with
/// both channels at every lag.
fn brute_force_mixed(x: &[f64], y: &[f64], c: usize, k: usize, scales: &[f64]) -> Vec<u64> {
    let n = x.len() - (k - 1);
    let channels = [x, y];
    let mut counts = vec![0u64; scales.len()];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = (0..k)
                .flat_map(|lag| (0..c).map(move |ch| (lag, ch)))
                .map(|(lag, ch)| (channels[ch][i + lag] - channels[ch][j + lag]).abs())
                .fold(0.0, f64::max);
            for (b, &r) in scales.iter().enumerate() {
                if d <= r {
                    counts[b] += 1;
                }
            }
        }
    }
    counts
}

#[test]
fn mixed_embedding_grows_components_then_lags() {
    let x = lcg_series(250, 31);
    let y = lcg_series(250, 77);
    let flat: Vec<f64> = x.iter().zip(&y).flat_map(|(a, b)| [*a, *b]).collect();
    let sample = Sample::from_flat(flat, 2).unwrap();
    let scales = vec![0.05, 0.15, 0.4];

    let summary = ScalingBuilder::new()
        .components(2)
        .dimensions(1, 6)
        .scales(scales.clone())
        .unlimited_pairs()
        .normalize(false)
        .metric(Metric::Maximum)
        .adapter(Adapter::CorrelationSum)
        .build()
        .unwrap()
        .fit(&sample)
        .unwrap();

    assert!(summary.is_complete());
    let layout: Vec<(usize, usize, usize)> = summary
        .tables()
        .map(|t| (t.dimension, t.components, t.lags))
        .collect();
    assert_eq!(layout, vec![(1, 1, 1), (2, 2, 1), (4, 2, 2), (6, 2, 3)]);

    for table in summary.tables() {
        let expected = brute_force_mixed(&x, &y, table.components, table.lags, &scales);
        let counts: Vec<u64> = table.rows.iter().map(|r| r.count).collect();
        assert_eq!(counts, expected, "m = {}", table.dimension);
    }
}

#[test]
fn counts_are_monotone_along_the_ladder() {
    let x = lcg_series(500, 3);
    let summary = ScalingBuilder::new()
        .dimensions(1, 4)
        .log_scales(1e-3, 1.0, 30)
        .max_pairs(400)
        .adapter(Adapter::CorrelationSum)
        .build()
        .unwrap()
        .fit(&x)
        .unwrap();

    assert!(summary.is_complete());
    for table in summary.tables() {
        for w in table.rows.windows(2) {
            assert!(w[0].count <= w[1].count, "m = {}", table.dimension);
        }
        assert!(table.rows.iter().all(|r| r.count <= 400));
    }
}

#[test]
fn theiler_window_beyond_series_length_counts_nothing() {
    let x = lcg_series(10, 5);
    let summary = ScalingBuilder::new()
        .dimensions(1, 1)
        .theiler(10)
        .adapter(Adapter::CorrelationSum)
        .build()
        .unwrap()
        .fit(&x)
        .unwrap();

    let table = summary.table(1).unwrap();
    assert!(table.is_complete());
    assert!(table
        .rows
        .iter()
        .all(|r| r.count == 0 && r.norm == 0 && r.statistic == 0.0));
}

#[test]
fn cap_of_one_freezes_every_scale() {
    let x = lcg_series(200, 9);
    let summary = ScalingBuilder::new()
        .dimensions(1, 2)
        .log_scales(0.05, 1.0, 5)
        .max_pairs(1)
        .parallel(false)
        .adapter(Adapter::CorrelationSum)
        .build()
        .unwrap()
        .fit(&x)
        .unwrap();

    for table in summary.tables() {
        assert!(table.saturated);
        assert!(table.is_complete());
        assert!(table.references_done < table.references_total);
        assert!(table.rows.iter().all(|r| r.count == 1 && r.frozen));
    }
}

#[test]
fn same_seed_gives_identical_tables() {
    let x = lcg_series(800, 21);
    let run = |seed| {
        ScalingBuilder::new()
            .dimensions(1, 3)
            .reference_points(60)
            .seed(seed)
            .adapter(Adapter::CorrelationSum)
            .build()
            .unwrap()
            .fit(&x)
            .unwrap()
    };

    let a: Vec<ScalingTable> = run(7).tables().cloned().collect();
    let b: Vec<ScalingTable> = run(7).tables().cloned().collect();
    assert_eq!(a, b);
    assert!(a.iter().all(|t| t.references_total == 60));
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let x = lcg_series(1500, 4);
    let run = |parallel: bool| {
        ScalingBuilder::new()
            .dimensions(1, 4)
            .log_scales(1e-3, 0.5, 25)
            .max_pairs(300)
            .theiler(3)
            .parallel(parallel)
            .batch_size(7)
            .adapter(Adapter::CorrelationSum)
            .build()
            .unwrap()
            .fit(&x)
            .unwrap()
    };

    let seq: Vec<ScalingTable> = run(false).tables().cloned().collect();
    let par: Vec<ScalingTable> = run(true).tables().cloned().collect();
    assert_eq!(seq.len(), 4);
    assert_eq!(seq, par);
}

#[test]
fn uniform_map_slope_matches_embedding_dimension() {
    let x = lcg_series(1000, 1);
    let summary = ScalingBuilder::new()
        .dimensions(1, 3)
        .log_scales(0.03, 0.12, 9)
        .unlimited_pairs()
        .metric(Metric::Maximum)
        .adapter(Adapter::CorrelationSum)
        .build()
        .unwrap()
        .fit(&x)
        .unwrap();

    for m in 1..=3 {
        let slope = summary.table(m).unwrap().slope_between(0.03, 0.12).unwrap();
        assert_abs_diff_eq!(slope, m as f64, epsilon = 0.2);
    }
}

#[test]
fn cancelled_scan_returns_partial_tables() {
    let stop = StopSignal::new();
    stop.stop();
    let summary = ScalingBuilder::new()
        .dimensions(1, 3)
        .stop_signal(stop)
        .adapter(Adapter::CorrelationSum)
        .build()
        .unwrap()
        .fit(&lcg_series(100, 2))
        .unwrap();

    assert!(summary.was_cancelled());
    assert!(!summary.is_complete());
    assert_eq!(summary.tables().count(), 3);
    assert!(summary.tables().all(|t| t.references_done == 0));
}

#[test]
fn invalid_options_fail_before_any_work() {
    let err = ScalingBuilder::new()
        .dimensions(4, 2)
        .adapter(Adapter::CorrelationSum)
        .build()
        .unwrap_err();
    assert!(matches!(err, ScalingError::Configuration { .. }));

    let err = ScalingBuilder::new()
        .adapter(Adapter::CorrelationSum)
        .build()
        .unwrap()
        .fit(&vec![f64::NAN, 1.0, 2.0])
        .unwrap_err();
    assert!(matches!(err, ScalingError::NonFiniteValue { row: 0, .. }));
}
