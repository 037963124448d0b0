//! Integration Tests for the feature pipeline
//!
//! Mapping table + encoder behaving together on realistic flight rows.

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::features::layout::FEATURE_LAYOUT;
    use crate::features::{FeatureEncoder, MappingTable, RawBatch};

    fn sample_table() -> MappingTable {
        MappingTable::from_json(json!({
            "Airline": {"AA": 0.21, "DL": 0.12, "WN": 0.18},
            "Origin": {"JFK": 0.3, "ATL": 0.2},
            "Dest": {"LAX": 0.25, "SEA": 0.15},
            "Route": {"JFK_LAX": 0.33},
            "Hub_Airline": {"AA_JFK": 0.4, "DL_ATL": 0.1},
            "Month_cos": {"1": 0.9, "7": 0.35},
            "DayofMonth_cos": {"15": 0.5},
            "Is_Winter_from_Month": {"1": 1.0, "7": 0.0},
            "Hub_x_Dest": [["AA_JFK", "LAX", 0.77], ["DL_ATL", "SEA", 0.05]],
            "Cancelled": {"0.0": 0.02, "1.0": 0.98}
        }))
        .unwrap()
    }

    fn flights() -> RawBatch {
        let columns = ["Airline", "Origin", "Dest", "Month", "DayofMonth", "Cancelled"];
        let rows = [
            ["AA", "JFK", "LAX", "1", "15", "0.0"],
            ["DL", "ATL", "SEA", "7", "3", "1.0"],
            ["ZZ", "XXX", "YYY", "13", "40", "5"],
        ];
        RawBatch::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|v| v.to_string()).collect()).collect(),
        )
    }

    /// Full row: every canonical feature present, in canonical order
    #[test]
    fn test_full_row_has_canonical_layout() {
        let enc = FeatureEncoder::new(Arc::new(sample_table()));
        let m = enc.encode(&flights()).unwrap();

        assert_eq!(m.columns(), FEATURE_LAYOUT);
        assert_eq!(
            m.row(0),
            &[0.21, 0.3, 0.25, 0.33, 0.4, 0.9, 0.5, 1.0, 0.77, 0.02]
        );
    }

    /// Unknown categories never raise, they score 0.0
    #[test]
    fn test_unknown_categories_score_zero() {
        let enc = FeatureEncoder::new(Arc::new(sample_table()));
        let m = enc.encode(&flights()).unwrap();

        assert!(m.row(2).iter().all(|&v| v == 0.0));
    }

    /// Repeated encodes of the same batch are identical
    #[test]
    fn test_encoding_is_deterministic() {
        let enc = FeatureEncoder::new(Arc::new(sample_table()));
        let first = enc.encode(&flights()).unwrap();
        for _ in 0..5 {
            assert_eq!(enc.encode(&flights()).unwrap(), first);
        }
    }

    /// Hub_x_Dest keys come from raw text. Numeric-score keys such as
    /// "0.4_0.25" are planted with a different value to catch reuse.
    #[test]
    fn test_interaction_key_uses_raw_strings() {
        let table = MappingTable::from_json(json!({
            "Dest": {"LAX": 0.25},
            "Hub_Airline": {"AA_JFK": 0.4},
            "Hub_x_Dest": [["AA_JFK", "LAX", 0.77], ["0.4", "0.25", -1.0]]
        }))
        .unwrap();
        let enc = FeatureEncoder::new(Arc::new(table));
        let batch = RawBatch::new(
            vec!["Airline".into(), "Origin".into(), "Dest".into()],
            vec![vec!["AA".into(), "JFK".into(), "LAX".into()]],
        );

        let m = enc.encode(&batch).unwrap();
        assert_eq!(m.get(0, "Hub_x_Dest"), Some(0.77));
    }

    /// Columns that cannot be derived are dropped, not zero-filled
    #[test]
    fn test_missing_sources_drop_columns() {
        let enc = FeatureEncoder::new(Arc::new(sample_table()));
        let batch = RawBatch::new(
            vec!["Airline".into(), "Dest".into()],
            vec![vec!["AA".into(), "LAX".into()]],
        );

        let m = enc.encode(&batch).unwrap();
        assert_eq!(m.columns(), &["Airline", "Dest"]);
        assert_eq!(m.row(0), &[0.21, 0.25]);
    }

    /// Without a Hub_x_Dest mapping the interaction column is omitted
    #[test]
    fn test_interaction_omitted_without_mapping() {
        let table = MappingTable::from_json(json!({"Airline": {"AA": 0.21}})).unwrap();
        let enc = FeatureEncoder::new(Arc::new(table));
        let batch = RawBatch::new(
            vec!["Airline".into(), "Origin".into(), "Dest".into()],
            vec![vec!["AA".into(), "JFK".into(), "LAX".into()]],
        );

        let m = enc.encode(&batch).unwrap();
        assert_eq!(m.columns(), &["Airline", "Origin", "Dest", "Route", "Hub_Airline"]);
    }

    /// An empty table still encodes, everything imputed
    #[test]
    fn test_empty_table() {
        let enc = FeatureEncoder::new(Arc::new(MappingTable::empty()));
        let m = enc.encode(&flights()).unwrap();
        assert_eq!(m.len(), 3);
        assert!(!m.columns().contains(&"Hub_x_Dest"));
        assert!(!m.columns().contains(&"Cancelled"));
        assert!(m.rows().flatten().all(|&v| v == 0.0));
    }
}
