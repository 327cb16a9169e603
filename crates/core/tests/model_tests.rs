// ═══════════════════════════════════════════════════════════════════
// Model Tests: Asset catalog, Holding, PriceQuote, Snapshot, Settings
// ═══════════════════════════════════════════════════════════════════

use std::collections::HashSet;
use std::time::Duration;

use crypto_portfolio_core::errors::CoreError;
use crypto_portfolio_core::models::asset::{Asset, AssetCatalog};
use crypto_portfolio_core::models::holding::{is_valid_amount, Holding};
use crypto_portfolio_core::models::price::PriceQuote;
use crypto_portfolio_core::models::settings::{Settings, DEFAULT_API_BASE_URL, MAX_DURATION_SECS};
use crypto_portfolio_core::models::snapshot::{
    format_amount, format_change, format_usd, PortfolioSnapshot, SnapshotEntry, UNPRICED_LABEL,
};

// ═══════════════════════════════════════════════════════════════════
// Asset & AssetCatalog
// ═══════════════════════════════════════════════════════════════════

mod asset {
    use super::*;

    #[test]
    fn new_normalizes_case() {
        let a = Asset::new("Bitcoin", "Bitcoin", "btc");
        assert_eq!(a.id, "bitcoin");
        assert_eq!(a.symbol, "BTC");
    }

    #[test]
    fn equality_ignores_name_and_symbol() {
        let a = Asset::new("bitcoin", "Bitcoin", "BTC");
        let b = Asset::new("bitcoin", "Digital Gold", "XBT");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn display_name_format() {
        let a = Asset::new("matic-network", "Polygon", "MATIC");
        assert_eq!(a.display_name(), "Polygon (MATIC)");
    }
}

mod catalog {
    use super::*;

    #[test]
    fn builtin_has_ten_assets_in_order() {
        let catalog = AssetCatalog::builtin();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.ids()[0], "bitcoin");
        assert_eq!(catalog.ids()[9], "avalanche-2");
        assert_eq!(AssetCatalog::default(), catalog);
    }

    #[test]
    fn lookups() {
        let catalog = AssetCatalog::builtin();
        assert!(catalog.contains("binancecoin"));
        assert!(!catalog.contains("BTC"));
        assert_eq!(catalog.get("ripple").unwrap().symbol, "XRP");
        assert_eq!(catalog.display_name("dogecoin"), "Dogecoin (DOGE)");
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let catalog = AssetCatalog::builtin();
        assert_eq!(catalog.display_name("some-delisted-coin"), "some-delisted-coin");
    }

    #[test]
    fn reverse_lookup_by_display_name() {
        let catalog = AssetCatalog::builtin();
        assert_eq!(catalog.id_for_display_name("Avalanche (AVAX)"), Some("avalanche-2"));
        assert_eq!(catalog.id_for_display_name("Bitcoin"), None);
    }

    #[test]
    fn custom_catalog_drops_duplicates() {
        let catalog = AssetCatalog::new(vec![
            Asset::new("bitcoin", "Bitcoin", "BTC"),
            Asset::new("bitcoin", "Bitcoin again", "BTC"),
            Asset::new("monero", "Monero", "XMR"),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("bitcoin").unwrap().name, "Bitcoin");
    }

    #[test]
    fn empty_catalog() {
        let catalog = AssetCatalog::new(vec![]);
        assert!(catalog.is_empty());
        assert!(catalog.ids().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Holding
// ═══════════════════════════════════════════════════════════════════

mod holding {
    use super::*;

    #[test]
    fn amount_validity() {
        assert!(is_valid_amount(0.00000001));
        assert!(is_valid_amount(21_000_000.0));
        assert!(!is_valid_amount(0.0));
        assert!(!is_valid_amount(-1.0));
        assert!(!is_valid_amount(f64::NAN));
        assert!(!is_valid_amount(f64::INFINITY));
    }

    #[test]
    fn serde_shape() {
        let h = Holding::new("ethereum", 1.25);
        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json, serde_json::json!({"id": "ethereum", "amount": 1.25}));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Snapshot & formatting
// ═══════════════════════════════════════════════════════════════════

mod snapshot {
    use super::*;

    fn sample() -> PortfolioSnapshot {
        PortfolioSnapshot {
            entries: vec![
                SnapshotEntry {
                    holding: Holding::new("bitcoin", 2.0),
                    quote: Some(PriceQuote::new("bitcoin", 50000.0, 1.5)),
                    value_usd: 100000.0,
                    unpriced: false,
                },
                SnapshotEntry {
                    holding: Holding::new("cardano", 10.0),
                    quote: None,
                    value_usd: 0.0,
                    unpriced: true,
                },
            ],
            total_value_usd: 100000.0,
        }
    }

    #[test]
    fn formatting_helpers() {
        assert_eq!(format_amount(2.0), "2.00000000");
        assert_eq!(format_usd(1234.5), "$1234.50");
        assert_eq!(format_change(1.5), "+1.50%");
        assert_eq!(format_change(-0.254), "-0.25%");
        assert_eq!(format_change(0.0), "+0.00%");
    }

    #[test]
    fn rows_follow_entries() {
        let snapshot = sample();
        let rows = snapshot.rows(&AssetCatalog::builtin());
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].name, "Bitcoin (BTC)");
        assert_eq!(rows[0].amount, "2.00000000");
        assert_eq!(rows[0].price, "$50000.00");
        assert_eq!(rows[0].value, "$100000.00");
        assert_eq!(rows[0].change_24h, "+1.50%");
        assert!(!rows[0].unpriced);

        assert_eq!(rows[1].name, "Cardano (ADA)");
        assert_eq!(rows[1].price, UNPRICED_LABEL);
        assert_eq!(rows[1].value, "$0.00");
        assert_eq!(rows[1].change_24h, UNPRICED_LABEL);
        assert!(rows[1].unpriced);
    }

    #[test]
    fn counts_and_total() {
        let snapshot = sample();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.unpriced_count(), 1);
        assert_eq!(snapshot.formatted_total(), "$100000.00");
        assert!(PortfolioSnapshot::default().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.refresh_interval(), Duration::from_secs(60));
        assert_eq!(s.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(s.min_refresh_gap(), Duration::from_secs(5));
        assert_eq!(s.api_base_url, DEFAULT_API_BASE_URL);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let s: Settings = serde_json::from_str(r#"{"refresh_interval_secs": 120}"#).unwrap();
        assert_eq!(s.refresh_interval_secs, 120);
        assert_eq!(s.fetch_timeout_secs, 10);
    }

    #[test]
    fn validate_rejects_zero_interval_and_timeout() {
        let s = Settings {
            refresh_interval_secs: 0,
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(CoreError::ValidationError(_))));

        let s = Settings {
            fetch_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(s.validate().is_err());

        let s = Settings {
            api_base_url: "  ".into(),
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_durations_over_a_day() {
        for s in [
            Settings {
                refresh_interval_secs: u64::MAX,
                ..Settings::default()
            },
            Settings {
                fetch_timeout_secs: MAX_DURATION_SECS + 1,
                ..Settings::default()
            },
            Settings {
                min_refresh_gap_secs: u64::MAX,
                ..Settings::default()
            },
        ] {
            assert!(matches!(s.validate(), Err(CoreError::ValidationError(_))));
        }

        let s = Settings {
            refresh_interval_secs: MAX_DURATION_SECS,
            fetch_timeout_secs: MAX_DURATION_SECS,
            min_refresh_gap_secs: MAX_DURATION_SECS,
            ..Settings::default()
        };
        assert!(s.validate().is_ok());
    }

    #[test]
    fn zero_gap_is_allowed() {
        let s = Settings {
            min_refresh_gap_secs: 0,
            ..Settings::default()
        };
        assert!(s.validate().is_ok());
        assert!(s.min_refresh_gap().is_zero());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"data_file": "/tmp/holdings.json", "min_refresh_gap_secs": 0}"#,
        )
        .unwrap();

        let s = Settings::load_from_file(&path).unwrap();
        assert_eq!(s.data_file, std::path::PathBuf::from("/tmp/holdings.json"));
        assert_eq!(s.min_refresh_gap_secs, 0);
        assert_eq!(s.refresh_interval_secs, 60);
    }

    #[test]
    fn load_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            Settings::load_from_file(&missing),
            Err(CoreError::FileIO(_))
        ));

        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, r#"{"refresh_interval_secs": 0}"#).unwrap();
        assert!(matches!(
            Settings::load_from_file(&invalid),
            Err(CoreError::ValidationError(_))
        ));
    }
}
