// ═══════════════════════════════════════════════════════════════════
// Error Tests: CoreError variants, Display formatting, kinds, From impls
// ═══════════════════════════════════════════════════════════════════

use std::time::Duration;

use crypto_portfolio_core::errors::{CoreError, ErrorKind};

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn validation_error() {
        let err = CoreError::ValidationError("Amount must be positive".into());
        assert_eq!(err.to_string(), "Validation failed: Amount must be positive");
    }

    #[test]
    fn index_out_of_range() {
        let err = CoreError::IndexOutOfRange { index: 3, len: 2 };
        assert_eq!(
            err.to_string(),
            "Holding index 3 out of range (portfolio has 2 holdings)"
        );
    }

    #[test]
    fn api() {
        let err = CoreError::Api {
            provider: "CoinGecko".into(),
            message: "HTTP 429 Too Many Requests".into(),
        };
        assert_eq!(
            err.to_string(),
            "API error (CoinGecko): HTTP 429 Too Many Requests"
        );
    }

    #[test]
    fn network() {
        let err = CoreError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn timeout() {
        let err = CoreError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "Price request timed out after 10s");
    }

    #[test]
    fn unsupported_version() {
        let err = CoreError::UnsupportedVersion(7);
        assert_eq!(err.to_string(), "Unsupported file version: 7");
    }

    #[test]
    fn invalid_file_format() {
        let err = CoreError::InvalidFileFormat("bad".into());
        assert_eq!(err.to_string(), "Invalid file format: bad");
    }

    #[test]
    fn tracker_stopped() {
        assert_eq!(
            CoreError::TrackerStopped.to_string(),
            "Portfolio tracker has stopped"
        );
    }
}

// ── Kinds ───────────────────────────────────────────────────────────

mod kinds {
    use super::*;

    #[test]
    fn validation_kinds() {
        assert_eq!(CoreError::ValidationError("x".into()).kind(), ErrorKind::Validation);
        let idx = CoreError::IndexOutOfRange { index: 0, len: 0 };
        assert_eq!(idx.kind(), ErrorKind::Validation);
        assert!(idx.is_validation());
        assert!(!idx.is_fetch());
        assert!(!idx.is_persistence());
    }

    #[test]
    fn fetch_kinds() {
        for err in [
            CoreError::Network("down".into()),
            CoreError::Timeout(Duration::from_millis(5)),
            CoreError::Api {
                provider: "p".into(),
                message: "m".into(),
            },
        ] {
            assert_eq!(err.kind(), ErrorKind::Fetch);
            assert!(err.is_fetch());
        }
    }

    #[test]
    fn persistence_kinds() {
        for err in [
            CoreError::FileIO("x".into()),
            CoreError::InvalidFileFormat("x".into()),
            CoreError::UnsupportedVersion(2),
            CoreError::Serialization("x".into()),
            CoreError::Deserialization("x".into()),
        ] {
            assert_eq!(err.kind(), ErrorKind::Persistence);
            assert!(err.is_persistence());
        }
    }

    #[test]
    fn shutdown_kind() {
        assert_eq!(CoreError::TrackerStopped.kind(), ErrorKind::Shutdown);
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod conversions {
    use super::*;

    #[test]
    fn from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::FileIO(ref m) if m.contains("denied")));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn question_mark_propagates_io_error() {
        fn read_missing() -> Result<Vec<u8>, CoreError> {
            Ok(std::fs::read("/definitely/not/here/holdings.json")?)
        }
        assert!(read_missing().unwrap_err().is_persistence());
    }
}
