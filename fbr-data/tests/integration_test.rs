//! Integration tests for rate loading against the SQLite backend.

use fbr_core::calculations::calculate_comprehensive_tax;
use fbr_core::{CapitalGainBucket, FilerStatus, FormFields, RateBook, TaxFormData, TaxRepository};
use fbr_data::{CapitalGainRateLoader, RateLoaderError, SlabLoader};
use fbr_db_sqlite::SqliteRepository;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;

const SLABS_CSV: &str = include_str!("../test-data/tax_slabs_2025_26.csv");
const CAPITAL_GAINS_CSV: &str = include_str!("../test-data/capital_gain_rates_2025_26.csv");

/// Migrations run, no seed data.
async fn setup_test_db() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let repo = SqliteRepository::new_with_pool(pool).await;
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");

    repo
}

async fn load_all(repo: &SqliteRepository) {
    let slabs = SlabLoader::parse(SLABS_CSV.as_bytes()).expect("Failed to parse slab CSV");
    SlabLoader::load(repo, &slabs)
        .await
        .expect("Failed to load slabs");

    let rates = CapitalGainRateLoader::parse(CAPITAL_GAINS_CSV.as_bytes())
        .expect("Failed to parse capital gains CSV");
    CapitalGainRateLoader::load(repo, &rates)
        .await
        .expect("Failed to load capital gains rates");
}

// ===== slab loading tests =====

#[tokio::test]
async fn test_load_all_2025_26_slabs() {
    let repo = setup_test_db().await;

    let records = SlabLoader::parse(SLABS_CSV.as_bytes()).expect("Failed to parse CSV");
    let inserted = SlabLoader::load(&repo, &records)
        .await
        .expect("Failed to load slabs");

    assert_eq!(inserted, 12);
}

#[tokio::test]
async fn test_load_and_retrieve_filer_slabs() {
    let repo = setup_test_db().await;
    load_all(&repo).await;

    let slabs = repo
        .get_tax_slabs("2025-26", FilerStatus::Filer)
        .await
        .expect("Failed to get filer slabs");

    assert_eq!(slabs.len(), 6);
    assert_eq!(slabs[0].min_income, dec!(0));
    assert_eq!(slabs[0].max_income, Some(dec!(600000)));
    assert_eq!(slabs[0].rate, dec!(0));
    assert_eq!(slabs[2].fixed_amount, dec!(30000));
    assert_eq!(slabs[2].rate, dec!(0.125));
    assert_eq!(slabs[5].min_income, dec!(4100000));
    assert_eq!(slabs[5].max_income, None);
    assert_eq!(slabs[5].fixed_amount, dec!(580000));
    assert_eq!(slabs[5].rate, dec!(0.35));
}

#[tokio::test]
async fn test_load_is_idempotent() {
    let repo = setup_test_db().await;
    load_all(&repo).await;
    load_all(&repo).await;

    let filer = repo
        .get_tax_slabs("2025-26", FilerStatus::Filer)
        .await
        .unwrap();
    let non_filer = repo
        .get_tax_slabs("2025-26", FilerStatus::NonFiler)
        .await
        .unwrap();
    let rates = repo.get_capital_gain_rates("2025-26").await.unwrap();

    assert_eq!(filer.len(), 6);
    assert_eq!(non_filer.len(), 6);
    assert_eq!(rates.len(), 5);
}

#[tokio::test]
async fn test_load_replaces_existing_table() {
    let repo = setup_test_db().await;
    load_all(&repo).await;

    let replacement = "tax_year,filer_status,min_income,max_income,fixed_amount,rate
2025-26,filer,0,1000000,0,0
2025-26,filer,1000000,,0,0.10
";
    let records = SlabLoader::parse(replacement.as_bytes()).unwrap();
    SlabLoader::load(&repo, &records).await.unwrap();

    let filer = repo
        .get_tax_slabs("2025-26", FilerStatus::Filer)
        .await
        .unwrap();
    let non_filer = repo
        .get_tax_slabs("2025-26", FilerStatus::NonFiler)
        .await
        .unwrap();
    assert_eq!(filer.len(), 2);
    assert_eq!(filer[1].rate, dec!(0.10));
    assert_eq!(non_filer.len(), 6);
}

#[tokio::test]
async fn test_invalid_filer_status() {
    let repo = setup_test_db().await;
    let csv = "tax_year,filer_status,min_income,max_income,fixed_amount,rate
2025-26,corporate,0,,0,0.29
";

    let records = SlabLoader::parse(csv.as_bytes()).unwrap();
    let result = SlabLoader::load(&repo, &records).await;

    assert!(matches!(result, Err(RateLoaderError::InvalidFilerStatus(s)) if s == "corporate"));
}

#[tokio::test]
async fn test_gapped_table_leaves_store_untouched() {
    let repo = setup_test_db().await;
    load_all(&repo).await;
    let csv = "tax_year,filer_status,min_income,max_income,fixed_amount,rate
2025-26,filer,0,600000,0,0
2025-26,filer,700000,,0,0.05
";

    let records = SlabLoader::parse(csv.as_bytes()).unwrap();
    let result = SlabLoader::load(&repo, &records).await;

    assert!(matches!(
        result,
        Err(RateLoaderError::InvalidTable {
            filer_status: FilerStatus::Filer,
            ..
        })
    ));
    let filer = repo
        .get_tax_slabs("2025-26", FilerStatus::Filer)
        .await
        .unwrap();
    assert_eq!(filer.len(), 6);
}

// ===== capital gains rate tests =====

#[tokio::test]
async fn test_load_capital_gain_rates() {
    let repo = setup_test_db().await;
    load_all(&repo).await;

    let rates = repo.get_capital_gain_rates("2025-26").await.unwrap();
    let securities = rates
        .iter()
        .find(|r| r.bucket == CapitalGainBucket::Securities)
        .expect("securities rate missing");

    assert_eq!(securities.rate, dec!(0.125));
}

#[tokio::test]
async fn test_invalid_bucket() {
    let repo = setup_test_db().await;
    let csv = "tax_year,bucket,rate\n2025-26,crypto,0.15\n";

    let records = CapitalGainRateLoader::parse(csv.as_bytes()).unwrap();
    let result = CapitalGainRateLoader::load(&repo, &records).await;

    assert!(matches!(result, Err(RateLoaderError::InvalidBucket(b)) if b == "crypto"));
}

// ===== end to end =====

#[tokio::test]
async fn test_loaded_rates_drive_calculation() {
    let repo = setup_test_db().await;
    load_all(&repo).await;

    let rates = RateBook::load(&repo, "2025-26")
        .await
        .expect("Failed to load rate book");
    let forms = TaxFormData {
        income: FormFields::new()
            .with("annual_basic_salary", "8740000")
            .with("salary_tax_deducted", "2000000"),
        ..Default::default()
    };

    let filer = calculate_comprehensive_tax(&forms, "2025-26", FilerStatus::Filer, &rates)
        .expect("filer computation failed");
    let non_filer = calculate_comprehensive_tax(&forms, "2025-26", FilerStatus::NonFiler, &rates)
        .expect("non-filer computation failed");

    assert_eq!(filer.normal_tax, dec!(2204000));
    assert_eq!(filer.surcharge, dec!(0));
    assert_eq!(filer.additional_tax_due, dec!(204000));
    assert_eq!(filer.refund_due, dec!(0));
    assert!(non_filer.normal_tax > filer.normal_tax);
}
