use chrono::NaiveDate;
use serde_json::{json, Value};

/// Integration tests that drive the complete pipeline from JSON logs to reports

#[cfg(test)]
mod integration_tests {
    use super::*;
    use myflow::analysis::FlowAnalyzer;
    use myflow::config::AnalysisConfig;
    use myflow::export::{self, csv as csv_export, ExportFormat};
    use myflow::pacing::PacingState;
    use myflow::sleep::SleepOutcome;
    use myflow::MyFlowError;
    use tempfile::tempdir;

    /// One entry in the tracker's nested export shape
    fn entry(day: u32, sleep: f64, stress: f64, study: f64, tics: u32, custom: Value) -> Value {
        json!({
            "date": format!("2024-03-{:02}", day),
            "physiological": { "sleep_hours": sleep, "screen_time": 3 },
            "cognitive_load": { "study_minutes": study },
            "emotional": { "stress": stress, "mood": "ok" },
            "symptoms": { "tic_count": tics },
            "custom": custom
        })
    }

    /// Ten days with a calm baseline and a stressful final day
    fn spike_log() -> String {
        let mut entries = Vec::new();
        for day in 1..=9u32 {
            let stress = if day % 2 == 0 { 4.0 } else { 3.0 };
            let tics = if day % 2 == 0 { 5 } else { 4 };
            let custom = if day % 3 == 0 {
                json!([{ "name": "Walk outside", "level": 2, "effect": -1 }])
            } else {
                json!([])
            };
            entries.push(entry(day, 7.5, stress, 0.0, tics, custom));
        }
        entries.push(entry(10, 7.5, 9.0, 0.0, 4, json!([])));
        Value::Array(entries).to_string()
    }

    #[test]
    fn test_high_load_warning_end_to_end() {
        let report = FlowAnalyzer::new().analyze_json(&spike_log()).unwrap();

        assert_eq!(report.days_analyzed, 10);
        assert_eq!(report.pacing.state, PacingState::HighLoadWarning);
        assert_eq!(report.pacing.latest_load, 9.0);
        assert!(report.pacing.load_threshold < 9.0);
        assert!(report.pacing.message.contains("Mar 10"));
        assert!(!report.vulnerability.is_vulnerable);

        let range = report.date_range.unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_sleep_penalty_for_vulnerable_user() {
        let mut entries = Vec::new();
        for day in 1..=3u32 {
            entries.push(entry(day, 5.0, 2.0, 0.0, 9, json!([])));
        }
        for day in 4..=8u32 {
            entries.push(entry(day, 8.0, 2.0, 0.0, 2, json!([])));
        }
        let payload = Value::Array(entries).to_string();

        let report = FlowAnalyzer::new().analyze_json(&payload).unwrap();
        assert!(report.vulnerability.is_vulnerable);
        assert_eq!(report.vulnerability.ratio, Some(1.0));

        let first = &report.contributions[0];
        assert_eq!(first.sleep_penalty, 4.5);
        assert_eq!(first.tnl, 6.5);
        assert_eq!(report.contributions[7].sleep_penalty, 0.0);
    }

    #[test]
    fn test_protective_factor_from_json() {
        let report = FlowAnalyzer::new().analyze_json(&spike_log()).unwrap();
        let factors = &report.protective_factors;

        let walk = factors.best_factor.as_ref().unwrap();
        assert_eq!(walk.name, "Walk outside");
        assert_eq!(walk.times_used, 3);
        assert_eq!(factors.days_analyzed, 10);
        assert_eq!(factors.top_best_days.len(), 3);
        assert!(factors.insight_message.contains("Walk outside"));
    }

    #[test]
    fn test_malformed_entries_recovered() {
        let payload = json!([
            { "date": "2024-03-01", "emotional": { "stress": "6" }, "symptoms": { "tic_count": -3 } },
            { "date": "not a date", "emotional": { "stress": 2 } },
            { "emotional": { "stress": 2 } },
            { "date": "2024-03-02T08:30:00", "cognitive_load": { "study_minutes": "lots" },
              "custom": [{ "level": 3, "effect": -1 }, { "name": "Tea", "level": 1, "effect": -1 }] },
            { "date": "2024-03-01", "emotional": { "stress": 1 } }
        ])
        .to_string();

        let report = FlowAnalyzer::new().analyze_json(&payload).unwrap();
        assert_eq!(report.days_analyzed, 2);

        let ingest = report.ingest.as_ref().unwrap();
        assert_eq!(ingest.skipped.len(), 2);
        assert_eq!(ingest.duplicates_overwritten, 1);
        assert_eq!(ingest.dropped_factors, 1);

        // The later 2024-03-01 entry wins
        assert_eq!(report.contributions[0].stress, 1.0);
        assert_eq!(report.contributions[0].tic_count, 0);
        assert_eq!(report.contributions[1].study, 0.0);
        assert_eq!(report.contributions[1].negative_custom, -1.0);
    }

    #[test]
    fn test_negative_stress_never_lowers_load() {
        let payload = r#"[{"date":"2024-03-01","emotional":{"stress":-6},"cognitive_load":{"study_minutes":90}}]"#;

        let report = FlowAnalyzer::new().analyze_json(payload).unwrap();
        let row = &report.contributions[0];
        assert_eq!(row.stress, 0.0);
        assert_eq!(row.tnl, 1.0);
        assert!(report.protective_factors.top_best_days.iter().all(|d| d.tnl >= 0.0));
    }

    #[test]
    fn test_non_array_payload_is_fatal() {
        let analyzer = FlowAnalyzer::new();
        assert!(matches!(
            analyzer.analyze_json(r#"{"entries": []}"#),
            Err(MyFlowError::Ingest(_))
        ));
        assert!(matches!(analyzer.analyze_json("not json"), Err(MyFlowError::Ingest(_))));
    }

    #[test]
    fn test_short_history_is_not_an_error() {
        let payload = Value::Array(vec![
            entry(1, 7.0, 3.0, 60.0, 2, json!([])),
            entry(2, 6.0, 4.0, 90.0, 3, json!([])),
        ])
        .to_string();

        let report = FlowAnalyzer::new().analyze_json(&payload).unwrap();
        assert_eq!(report.pacing.state, PacingState::InsufficientData);
        assert!(matches!(report.sleep, SleepOutcome::InsufficientData { .. }));
        assert_eq!(report.contributions.len(), 2);
    }

    #[test]
    fn test_exports_to_files() {
        let report = FlowAnalyzer::new().analyze_json(&spike_log()).unwrap();
        let dir = tempdir().unwrap();

        for format in [
            ExportFormat::Json,
            ExportFormat::Csv,
            ExportFormat::Text,
            ExportFormat::Html,
        ] {
            let path = dir.path().join(format!("report.{}", format.extension()));
            export::export_report(&report, format, &path).unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }

        let json_content = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
        let value: Value = serde_json::from_str(&json_content).unwrap();
        assert_eq!(value["pacing"]["state"], "HIGH_LOAD_WARNING");

        let csv_file = std::fs::File::open(dir.path().join("report.csv")).unwrap();
        let rows = csv_export::read_contributions(csv_file).unwrap();
        assert_eq!(rows, report.contributions);

        let html = std::fs::read_to_string(dir.path().join("report.html")).unwrap();
        assert!(html.contains("<strong>HIGH LOAD WARNING</strong>"));
        assert!(html.contains("#FF9800"));

        let text = std::fs::read_to_string(dir.path().join("report.txt")).unwrap();
        assert!(text.contains("State: "));
    }

    #[test]
    fn test_export_creates_missing_directories() {
        let report = FlowAnalyzer::new().analyze(&[]);
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("report.json");

        export::export_report(&report, ExportFormat::Json, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_config_changes_study_scaling() {
        let config = AnalysisConfig::load_from_str(
            r#"
            [normalization]
            study_cap_minutes = 450.0
            "#,
        )
        .unwrap();
        let payload = Value::Array(vec![entry(1, 8.0, 0.0, 450.0, 0, json!([]))]).to_string();

        let default_report = FlowAnalyzer::new().analyze_json(&payload).unwrap();
        let custom_report = FlowAnalyzer::with_config(config).analyze_json(&payload).unwrap();

        assert_eq!(default_report.contributions[0].study, 5.0);
        assert_eq!(custom_report.contributions[0].study, 10.0);
    }

    #[test]
    fn test_parallel_file_analysis() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        let missing = dir.path().join("missing.json");
        std::fs::write(&good, spike_log()).unwrap();
        std::fs::write(&bad, r#"{"oops": true}"#).unwrap();

        let results = FlowAnalyzer::new().analyze_files(&[good.clone(), bad.clone(), missing.clone()]);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].path, good);
        assert_eq!(results[0].outcome.as_ref().unwrap().days_analyzed, 10);
        assert!(results[1].outcome.is_err());
        assert!(results[2].outcome.is_err());
    }
}
