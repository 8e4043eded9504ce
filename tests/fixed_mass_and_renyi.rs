use approx::{assert_abs_diff_eq, assert_relative_eq};
use fastd2::prelude::*;

fn lcg_series(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed & 0xFFFF_FFFF;
    (0..n)
        .map(|_| {
            state = (1_664_525 * state + 1_013_904_223) % (1 << 32);
            state as f64 / 4_294_967_296.0
        })
        .collect()
}

#[test]
fn fixed_mass_on_a_line_has_unit_slope() {
    let ramp: Vec<f64> = (0..2000).map(|i| i as f64).collect();
    let scan = ScalingBuilder::new()
        .dimensions(1, 1)
        .neighbors(2, 64)
        .mass_count(6)
        .adapter(Adapter::FixedMass)
        .build()
        .unwrap();
    assert_eq!(scan.targets(), &[2, 4, 8, 16, 32, 64]);

    let summary = scan.fit(&ramp).unwrap();
    let table = summary.table(1).unwrap();
    assert_eq!(table.kind, EstimatorKind::FixedMass);
    assert!(table.is_complete());

    // Interior points reach K neighbors at K/2 steps of 1/1999.
    let step = 1.0 / 1999.0;
    assert_relative_eq!(table.rows[2].scale, 4.0 * step, max_relative = 0.05);
    let slope = table.slope_between(0.0, f64::INFINITY).unwrap();
    assert_abs_diff_eq!(slope, 1.0, epsilon = 0.05);
}

#[test]
fn fixed_mass_radii_grow_with_mass() {
    let x = lcg_series(1500, 8);
    let summary = ScalingBuilder::new()
        .dimensions(1, 3)
        .theiler(5)
        .reference_points(300)
        .adapter(Adapter::FixedMass)
        .build()
        .unwrap()
        .fit(&x)
        .unwrap();

    for table in summary.tables() {
        let radii = table.scales();
        assert!(radii.windows(2).all(|w| w[0] <= w[1]), "m = {}", table.dimension);
        assert!(table.rows.iter().all(|r| r.references == 300));
    }
}

#[test]
fn fixed_mass_observation_cap_freezes_targets() {
    let x = lcg_series(400, 12);
    let summary = ScalingBuilder::new()
        .dimensions(2, 2)
        .max_pairs(25)
        .parallel(false)
        .adapter(Adapter::FixedMass)
        .build()
        .unwrap()
        .fit(&x)
        .unwrap();

    let table = summary.table(2).unwrap();
    assert!(table.saturated);
    assert!(table.rows.iter().all(|r| r.count == 25 && r.frozen));
}

#[test]
fn two_equal_boxes_have_entropy_ln_two() {
    let series: Vec<f64> = (0..100).map(|i| (i % 2) as f64).collect();
    for order in [0.0, 1.0, 2.0] {
        let summary = ScalingBuilder::new()
            .dimensions(1, 1)
            .scales(vec![0.25, 0.5])
            .order(order)
            .adapter(Adapter::Renyi)
            .build()
            .unwrap()
            .fit(&series)
            .unwrap();

        for table in summary.tables() {
            for row in &table.rows {
                assert_eq!(row.count, 2);
                assert_relative_eq!(row.statistic, 2f64.ln(), max_relative = 1e-12);
            }
            assert!(table
                .local_slopes()
                .iter()
                .all(|s| s.is_some_and(|v| v.abs() < 1e-12)));
        }
    }
}

#[test]
fn renyi_slope_of_uniform_series_is_one() {
    let x = lcg_series(5000, 17);
    let summary = ScalingBuilder::new()
        .dimensions(1, 1)
        .log_scales(0.01, 0.1, 6)
        .adapter(Adapter::Renyi)
        .build()
        .unwrap()
        .fit(&x)
        .unwrap();

    let table = summary.table(1).unwrap();
    assert_eq!(table.kind, EstimatorKind::Renyi);
    let slope = table.slope_between(0.01, 0.1).unwrap();
    assert_abs_diff_eq!(slope, 1.0, epsilon = 0.1);
}

#[test]
fn renyi_rejects_negative_order() {
    let err = ScalingBuilder::new()
        .order(-1.0)
        .adapter(Adapter::Renyi)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("order"));
}
