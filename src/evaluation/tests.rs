//! Integration Tests for batch evaluation
//!
//! Registry + encoder + engine over in-memory CSV uploads.

#[cfg(test)]
mod integration_tests {
    use std::io::Read;

    use serde_json::json;

    use crate::evaluation::{EvaluationEngine, EvaluationOptions};
    use crate::features::{FeatureMatrix, MappingTable};
    use crate::models::{Manifest, PipelineEntry};
    use crate::registry::classifier::{Predictor, ProbabilisticPredictor};
    use crate::registry::{Classifier, ModelArtifact, ModelInfo, Registry};
    use crate::{AppError, AppResult};

    /// Uses the first encoded column directly as P(class 1)
    #[derive(Debug)]
    struct Passthrough;

    impl Predictor for Passthrough {
        fn n_features(&self) -> Option<usize> {
            Some(1)
        }

        fn predict(&self, x: &FeatureMatrix) -> AppResult<Vec<u8>> {
            Ok(x.rows().map(|r| u8::from(r[0] >= 0.5)).collect())
        }
    }

    impl ProbabilisticPredictor for Passthrough {
        fn predict_proba(&self, x: &FeatureMatrix) -> AppResult<Vec<Vec<f64>>> {
            Ok(x.rows().map(|r| vec![1.0 - r[0], r[0]]).collect())
        }
    }

    /// Source that fails the test if anything reads it
    struct Untouchable;

    impl Read for Untouchable {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            panic!("source must not be read");
        }
    }

    fn model(id: &str, classifier: Classifier) -> ModelInfo {
        ModelInfo {
            id: id.to_string(),
            technique: format!("{} technique", id),
            hyperparams: json!({}),
            classifier,
        }
    }

    fn registry() -> Registry {
        let manifest = Manifest {
            default_model: "passthrough".to_string(),
            target_column: "ArrDel15".to_string(),
            feature_columns: vec!["Airline".to_string()],
            pipeline: PipelineEntry { path: "encoding_mappings.json".to_string() },
            models: Vec::new(),
        };
        let table = MappingTable::from_json(json!({
            "Airline": {"A": 0.9, "B": 0.4, "C": 0.3, "D": 0.6}
        }))
        .unwrap();
        let svm: ModelArtifact = serde_json::from_value(json!({
            "kind": "linear_svm",
            "coefficients": [1.0],
            "intercept": -0.5
        }))
        .unwrap();

        Registry::from_parts(
            manifest,
            table,
            vec![
                model("passthrough", Classifier::Probabilistic(Box::new(Passthrough))),
                model("svm", svm.into_classifier().unwrap()),
            ],
        )
        .unwrap()
    }

    fn options(chunk_size: usize) -> EvaluationOptions {
        EvaluationOptions { chunk_size, ..Default::default() }
    }

    const EXAMPLE: &str = "Airline,Origin,ArrDel15\nA,JFK,1\nB,JFK,1\nC,ATL,0\nD,ATL,0\n";

    #[test]
    fn test_worked_example() {
        let reg = registry();
        let report = EvaluationEngine::new(&reg, options(5000))
            .evaluate(EXAMPLE.as_bytes(), Some("passthrough"))
            .unwrap();

        assert_eq!(report.results.len(), 1);
        let r = &report.results[0];
        assert_eq!(r.model_id, "passthrough");
        assert_eq!(r.technique, "passthrough technique");
        assert_eq!(r.rows, 4);
        assert_eq!(r.standard_metrics.f1, 0.5);
        assert_eq!(r.standard_metrics.accuracy, 0.5);
        assert_eq!(r.optimal_threshold, 0.35);
        assert!((r.metrics.f1 - 0.8).abs() < 1e-12);
        assert_eq!(r.metrics.recall, 1.0);
    }

    #[test]
    fn test_all_models_in_registry_order() {
        let reg = registry();
        let report = EvaluationEngine::new(&reg, options(5000))
            .evaluate(EXAMPLE.as_bytes(), None)
            .unwrap();

        let ids: Vec<&str> = report.results.iter().map(|r| r.model_id.as_str()).collect();
        assert_eq!(ids, vec!["passthrough", "svm"]);

        // Hard-label model: counted at 0.5, no search
        let svm = &report.results[1];
        assert_eq!(svm.optimal_threshold, 0.5);
        assert_eq!(svm.metrics, svm.standard_metrics);
        assert_eq!((svm.metrics.tp, svm.metrics.fp, svm.metrics.fn_count, svm.metrics.tn), (1, 1, 1, 1));
    }

    #[test]
    fn test_chunked_equals_unchunked() {
        let mut csv = String::from("Airline,ArrDel15\n");
        let airlines = ["A", "B", "C", "D", "E"];
        for i in 0..2_345 {
            let label = if (i * 7) % 3 == 0 { 1 } else { 0 };
            csv.push_str(&format!("{},{}\n", airlines[(i * 13) % 5], label));
        }

        let reg = registry();
        let whole = EvaluationEngine::new(&reg, options(1_000_000)).evaluate(csv.as_bytes(), None).unwrap();
        let chunked = EvaluationEngine::new(&reg, options(100)).evaluate(csv.as_bytes(), None).unwrap();
        let tiny = EvaluationEngine::new(&reg, options(7)).evaluate(csv.as_bytes(), None).unwrap();

        for other in [&chunked, &tiny] {
            for (a, b) in whole.results.iter().zip(&other.results) {
                assert_eq!(a.metrics, b.metrics);
                assert_eq!(a.standard_metrics, b.standard_metrics);
                assert_eq!(a.optimal_threshold, b.optimal_threshold);
                assert_eq!(a.rows, 2_345);
                assert_eq!(b.rows, 2_345);
            }
        }
    }

    #[test]
    fn test_default_chunking_matches_single_pass() {
        let mut csv = String::from("Airline,ArrDel15\n");
        let airlines = ["A", "B", "C", "D", "E"];
        for i in 0..12_003 {
            let label = if (i * 5) % 7 < 3 { 1 } else { 0 };
            csv.push_str(&format!("{},{}\n", airlines[(i * 11) % 5], label));
        }

        let reg = registry();
        let whole = EvaluationEngine::new(&reg, options(1_000_000)).evaluate(csv.as_bytes(), None).unwrap();
        // Two full chunks of 5000 rows and a partial tail
        let chunked = EvaluationEngine::new(&reg, EvaluationOptions::default())
            .evaluate(csv.as_bytes(), None)
            .unwrap();

        assert_eq!(whole.results.len(), chunked.results.len());
        for (a, b) in whole.results.iter().zip(&chunked.results) {
            assert_eq!(a.metrics, b.metrics);
            assert_eq!(a.standard_metrics, b.standard_metrics);
            assert_eq!(a.optimal_threshold, b.optimal_threshold);
            assert_eq!(b.rows, 12_003);
        }
    }

    #[test]
    fn test_search_disabled_counts_at_baseline() {
        let reg = registry();
        let opts = EvaluationOptions { threshold_search: false, ..Default::default() };
        let report = EvaluationEngine::new(&reg, opts)
            .evaluate(EXAMPLE.as_bytes(), Some("passthrough"))
            .unwrap();

        let r = &report.results[0];
        assert_eq!(r.optimal_threshold, 0.5);
        assert_eq!(r.metrics.f1, 0.5);
        assert_eq!(r.rows, 4);
    }

    #[test]
    fn test_unknown_model_fails_before_reading() {
        let reg = registry();
        let result = EvaluationEngine::new(&reg, options(5000)).evaluate(Untouchable, Some("xgb"));
        assert!(matches!(result, Err(AppError::UnknownModelError(id)) if id == "xgb"));
    }

    #[test]
    fn test_header_only_is_empty_input() {
        let reg = registry();
        let result = EvaluationEngine::new(&reg, options(5000)).evaluate("Airline,ArrDel15\n".as_bytes(), None);
        assert!(matches!(result, Err(AppError::EmptyInputError)));

        let result = EvaluationEngine::new(&reg, options(5000)).evaluate("".as_bytes(), None);
        assert!(matches!(result, Err(AppError::EmptyInputError)));
    }

    #[test]
    fn test_missing_columns_are_schema_errors() {
        let reg = registry();
        let engine = EvaluationEngine::new(&reg, options(5000));

        let err = engine.evaluate("Airline,Label\nA,1\n".as_bytes(), None).unwrap_err();
        assert!(matches!(&err, AppError::SchemaError(msg) if msg.contains("ArrDel15")));

        let err = engine.evaluate("Carrier,ArrDel15\nA,1\n".as_bytes(), None).unwrap_err();
        assert!(matches!(&err, AppError::SchemaError(msg) if msg.contains("Airline")));
    }

    #[test]
    fn test_bad_rows_abort_whole_request() {
        let reg = registry();
        let engine = EvaluationEngine::new(&reg, options(2));

        // Ragged row in the second chunk
        let ragged = "Airline,ArrDel15\nA,1\nB,0\nC\n";
        assert!(matches!(engine.evaluate(ragged.as_bytes(), None), Err(AppError::DataError(_))));

        // Label outside {0,1}
        let bad_label = "Airline,ArrDel15\nA,1\nB,maybe\n";
        let err = engine.evaluate(bad_label.as_bytes(), None).unwrap_err();
        assert!(matches!(&err, AppError::DataError(msg) if msg.contains("row 2")));
    }

    #[test]
    fn test_float_labels_are_coerced() {
        let reg = registry();
        let csv = "Airline,ArrDel15\nA,1.0\nB,1.0\nC,0.0\nD,0.0\n";
        let report = EvaluationEngine::new(&reg, options(5000))
            .evaluate(csv.as_bytes(), Some("passthrough"))
            .unwrap();
        assert_eq!(report.results[0].optimal_threshold, 0.35);
    }
}
