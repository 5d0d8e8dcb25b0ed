//! Integration Tests for Feature Extraction Strategies

#[cfg(test)]
mod integration_tests {
    use crate::error::PipelineError;
    use crate::logic::features::{
        ExtractionInput, FeatureMatrix, FeatureStrategy, LexicalStrategy, StructuralStrategy,
    };
    use crate::logic::normalizer::LogRecord;

    fn record(path: Option<&str>, status: Option<i64>) -> LogRecord {
        LogRecord {
            timestamp: Some("t".to_string()),
            trace_id: None,
            path: path.map(str::to_string),
            status_code: status,
            user_agent: None,
        }
    }

    fn structural(records: &[LogRecord]) -> FeatureMatrix {
        StructuralStrategy::new()
            .extract(&ExtractionInput::new(records, 0))
            .unwrap()
    }

    /// Null path gives the same vector as the literal "nan"
    #[test]
    fn test_null_path_matches_literal_nan() {
        let with_null = structural(&[record(None, Some(200)), record(Some("/x"), Some(200))]);
        let with_nan = structural(&[record(Some("nan"), Some(200)), record(Some("/x"), Some(200))]);

        assert_eq!(with_null.schema(), with_nan.schema());
        assert_eq!(with_null.rows()[0].values, with_nan.rows()[0].values);
    }

    /// path_frequency equals the exact, case-sensitive count within the chunk
    #[test]
    fn test_path_frequency_is_chunk_count() {
        let records = vec![
            record(Some("/api/a"), Some(200)),
            record(Some("/api/A"), Some(200)),
            record(Some("/api/a"), Some(404)),
            record(None, None),
            record(Some("/api/a"), Some(200)),
        ];
        let m = structural(&records);
        let freq = m.column("path_frequency").unwrap();
        assert_eq!(freq, vec![3.0, 1.0, 3.0, 1.0, 3.0]);

        for (i, r) in records.iter().enumerate() {
            let expected = records
                .iter()
                .filter(|o| o.path_or_missing() == r.path_or_missing())
                .count() as f64;
            assert_eq!(freq[i], expected);
        }
    }

    /// Frequency is computed per chunk, not across chunks
    #[test]
    fn test_path_frequency_does_not_cross_chunks() {
        let first = structural(&[record(Some("/a"), Some(200)), record(Some("/a"), Some(200))]);
        let second = structural(&[record(Some("/a"), Some(200))]);
        assert_eq!(first.column("path_frequency").unwrap(), vec![2.0, 2.0]);
        assert_eq!(second.column("path_frequency").unwrap(), vec![1.0]);
    }

    #[test]
    fn test_status_one_hot_chunk_local() {
        let m = structural(&[
            record(Some("/a"), Some(404)),
            record(Some("/b"), None),
            record(Some("/c"), Some(200)),
        ]);
        let cols = m.schema().columns();
        assert_eq!(&cols[5..8], &["status_-1", "status_200", "status_404"]);
        assert_eq!(m.column("status_404").unwrap(), vec![1.0, 0.0, 0.0]);
        assert_eq!(m.column("status_-1").unwrap(), vec![0.0, 1.0, 0.0]);

        let other = structural(&[record(Some("/a"), Some(500))]);
        assert_ne!(m.schema().layout_hash(), other.schema().layout_hash());
    }

    #[test]
    fn test_every_row_has_full_schema() {
        let m = structural(&[record(None, None), record(Some(""), Some(301))]);
        for row in m.rows() {
            assert_eq!(row.values.len(), m.n_features());
            assert!(row.validate(m.schema()).is_ok());
        }
    }

    #[test]
    fn test_record_ids_follow_offset() {
        let records = vec![record(Some("/a"), None), record(Some("/b"), None)];
        let m = StructuralStrategy::new()
            .extract(&ExtractionInput::new(&records, 20_000))
            .unwrap();
        assert_eq!(m.record_ids(), vec![20_000, 20_001]);
    }

    #[test]
    fn test_scenario_paths() {
        let m = structural(&[
            record(Some("/api/users?id=1' OR '1'='1"), Some(200)),
            record(Some("../../etc/passwd"), Some(200)),
            record(Some("shell.php"), Some(200)),
        ]);
        let s = m.schema();
        assert_eq!(m.rows()[0].get_by_name(s, "has_sql_keywords"), Some(0.0));
        assert_eq!(m.rows()[0].get_by_name(s, "special_chars"), Some(9.0));
        assert_eq!(m.rows()[1].get_by_name(s, "has_path_traversal"), Some(1.0));
        assert_eq!(m.rows()[2].get_by_name(s, "has_suspicious_extensions"), Some(1.0));
    }

    #[test]
    fn test_empty_chunk_extracts_empty_matrix() {
        let m = structural(&[]);
        assert!(m.is_empty());
        // Fixed columns + path_frequency, no status columns
        assert_eq!(m.n_features(), 6);
    }

    #[test]
    fn test_lexical_joins_after_numeric() {
        let records = vec![
            record(Some("/api/users"), Some(200)),
            record(None, Some(200)),
            record(Some("/api/orders"), Some(500)),
        ];
        let numeric = structural(&records);
        let lexical = LexicalStrategy::new(500);
        let combined = lexical
            .extract(&ExtractionInput::new(&records, 0).with_numeric(&numeric))
            .unwrap();

        assert_eq!(combined.len(), 3);
        assert_eq!(
            &combined.schema().columns()[..numeric.n_features()],
            numeric.schema().columns()
        );
        let tail: Vec<_> = combined.schema().columns()[numeric.n_features()..].to_vec();
        assert_eq!(tail, vec!["tfidf_api", "tfidf_orders", "tfidf_users"]);

        // Null path is the empty document for TF-IDF
        let row = &combined.rows()[1];
        assert_eq!(row.get_by_name(combined.schema(), "tfidf_api"), Some(0.0));
    }

    #[test]
    fn test_lexical_without_numeric() {
        let records = vec![record(Some("/api/users"), None)];
        let m = LexicalStrategy::new(500)
            .extract(&ExtractionInput::new(&records, 0))
            .unwrap();
        assert_eq!(m.schema().columns(), &["tfidf_api", "tfidf_users"]);
    }

    #[test]
    fn test_lexical_rejects_misaligned_numeric() {
        let numeric = structural(&[record(Some("/a"), None)]);
        let records = vec![record(Some("/a"), None), record(Some("/b"), None)];
        let result = LexicalStrategy::new(500)
            .extract(&ExtractionInput::new(&records, 0).with_numeric(&numeric));
        assert!(matches!(result, Err(PipelineError::SchemaMismatch(_))));
    }

    #[test]
    fn test_strategy_names() {
        let strategies: Vec<Box<dyn FeatureStrategy>> =
            vec![Box::new(StructuralStrategy::new()), Box::new(LexicalStrategy::new(10))];
        let names: Vec<_> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["structural", "lexical"]);
    }
}
