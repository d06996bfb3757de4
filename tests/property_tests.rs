use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use myflow::analysis::FlowAnalyzer;
use myflow::export::csv::{read_contributions, render_contributions};
use myflow::load::CompositeLoadCalculator;
use myflow::models::{CustomFactor, DailyRecord};
use myflow::normalize::MetricNormalizer;
use myflow::stats::pearson;

/// Property-based checks of the numeric invariants of the pipeline

fn arb_factor() -> impl Strategy<Value = CustomFactor> {
    ("[A-Za-z ]{1,12}", 0.0f64..5.0, -3.0f64..3.0)
        .prop_map(|(name, level, effect)| CustomFactor::new(name, level, effect))
}

fn arb_record(offset: i64) -> impl Strategy<Value = DailyRecord> {
    (
        proptest::option::of(0.0f64..12.0),
        -10.0f64..10.0,
        0.0f64..2000.0,
        0u32..40,
        proptest::collection::vec(arb_factor(), 0..4),
    )
        .prop_map(move |(sleep, stress, study, tics, factors)| {
            let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset);
            let mut record = DailyRecord::new(date)
                .with_stress(stress)
                .with_study(study)
                .with_tics(tics);
            record.sleep_hours = sleep;
            record.custom_factors = factors;
            record
        })
}

fn arb_batch() -> impl Strategy<Value = Vec<DailyRecord>> {
    (1usize..40).prop_flat_map(|len| {
        (0..len as i64)
            .map(arb_record)
            .collect::<Vec<_>>()
    })
}

proptest! {
    #[test]
    fn test_study_normalization_bounded(minutes in -100.0f64..5000.0) {
        let normalized = MetricNormalizer::new().normalize_study(minutes);
        prop_assert!((0.0..=10.0).contains(&normalized));
        if minutes >= 900.0 {
            prop_assert_eq!(normalized, 10.0);
        }
    }

    #[test]
    fn test_study_normalization_monotonic(a in 0.0f64..3000.0, b in 0.0f64..3000.0) {
        let normalizer = MetricNormalizer::new();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(normalizer.normalize_study(low) <= normalizer.normalize_study(high));
    }

    #[test]
    fn test_tnl_never_negative(records in arb_batch()) {
        let computation = CompositeLoadCalculator::new().compute(&records);
        for day in computation.batch.days() {
            prop_assert!(day.tnl >= 0.0);
            prop_assert!(day.stress_contrib >= 0.0);
            prop_assert!(day.negative_custom_contrib <= 0.0);
            prop_assert!((day.component_sum() - day.tnl).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pearson_bounded_and_symmetric(
        pairs in proptest::collection::vec((0.0f64..12.0, 0.0f64..50.0), 0..30)
    ) {
        let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let r = pearson(&xs, &ys);
        prop_assert!((-1.0..=1.0).contains(&r));
        prop_assert!((r - pearson(&ys, &xs)).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_zero_for_constant_sleep(
        sleep in 0.0f64..12.0,
        tics in proptest::collection::vec(0.0f64..50.0, 2..20)
    ) {
        let xs = vec![sleep; tics.len()];
        prop_assert_eq!(pearson(&xs, &tics), 0.0);
    }

    #[test]
    fn test_contribution_table_round_trip(records in arb_batch()) {
        let report = FlowAnalyzer::new().analyze(&records);
        let csv = render_contributions(&report.contributions).unwrap();
        let rows = read_contributions(csv.as_bytes()).unwrap();

        prop_assert_eq!(rows.len(), report.contributions.len());
        for (row, expected) in rows.iter().zip(&report.contributions) {
            prop_assert_eq!(row.date, expected.date);
            prop_assert!((row.component_sum() - expected.tnl).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pipeline_never_panics(records in arb_batch()) {
        let report = FlowAnalyzer::new().analyze(&records);
        prop_assert_eq!(report.days_analyzed, records.len());
        prop_assert!(report.protective_factors.ranked_factors.len() <= 5);
        prop_assert!(report.protective_factors.top_best_days.len() <= 3);
        for day in &report.protective_factors.top_best_days {
            prop_assert!(day.tnl >= 0.0);
        }
    }
}
