use std::collections::BTreeMap;
use std::io::Read;

use fbr_core::{
    CapitalGainBucket, CapitalGainRate, FilerStatus, RepositoryError, SlabTable, SlabTableError,
    TaxRepository, TaxSlab,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading rate data.
#[derive(Debug, Error)]
pub enum RateLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid filer status '{0}' (expected filer or non_filer)")]
    InvalidFilerStatus(String),

    #[error("Invalid capital gains bucket '{0}'")]
    InvalidBucket(String),

    #[error("Invalid {filer_status} slab table for {tax_year}: {source}")]
    InvalidTable {
        tax_year: String,
        filer_status: FilerStatus,
        #[source]
        source: SlabTableError,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for RateLoaderError {
    fn from(err: csv::Error) -> Self {
        RateLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of the slab CSV.
///
/// - `tax_year`: e.g. `2025-26`
/// - `filer_status`: `filer` or `non_filer`
/// - `min_income`, `max_income`: bracket bounds (empty `max_income` for the top bracket)
/// - `fixed_amount`: tax due at `min_income`
/// - `rate`: marginal rate as a fraction (e.g. `0.125`)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SlabRecord {
    pub tax_year: String,
    pub filer_status: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub fixed_amount: Decimal,
    pub rate: Decimal,
}

/// A single row of the capital gains rate CSV.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CapitalGainRateRecord {
    pub tax_year: String,
    pub bucket: String,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn parse_records<T, R>(reader: R) -> Result<Vec<T>, RateLoaderError>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        records.push(result?);
    }

    Ok(records)
}

/// Loader for progressive slab tables.
///
/// Works against any [`TaxRepository`], so the same CSV can be loaded into
/// whichever backend is configured.
pub struct SlabLoader;

impl SlabLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SlabRecord>, RateLoaderError> {
        parse_records(reader)
    }

    /// Replace the stored slabs of every `(tax_year, filer_status)` present
    /// in `records`.
    ///
    /// Every table is validated before anything is written, so a bad row
    /// leaves the store untouched. Loading the same file twice gives the
    /// same result. Returns the number of slabs inserted.
    pub async fn load<R: TaxRepository + ?Sized>(
        repo: &R,
        records: &[SlabRecord],
    ) -> Result<usize, RateLoaderError> {
        let mut groups: BTreeMap<(String, FilerStatus), Vec<TaxSlab>> = BTreeMap::new();

        for record in records {
            let filer_status = FilerStatus::parse(&record.filer_status)
                .ok_or_else(|| RateLoaderError::InvalidFilerStatus(record.filer_status.clone()))?;
            groups
                .entry((record.tax_year.clone(), filer_status))
                .or_default()
                .push(TaxSlab {
                    tax_year: record.tax_year.clone(),
                    filer_status,
                    min_income: record.min_income,
                    max_income: record.max_income,
                    rate: record.rate,
                    fixed_amount: record.fixed_amount,
                });
        }

        let mut tables = Vec::with_capacity(groups.len());
        for ((tax_year, filer_status), slabs) in groups {
            let table = SlabTable::new(tax_year.as_str(), filer_status, slabs).map_err(|source| {
                RateLoaderError::InvalidTable {
                    tax_year: tax_year.clone(),
                    filer_status,
                    source,
                }
            })?;
            tables.push(table);
        }

        let mut inserted = 0;
        for table in &tables {
            repo.delete_tax_slabs(table.tax_year(), table.filer_status())
                .await?;
            for slab in table.slabs() {
                repo.insert_tax_slab(slab).await?;
                inserted += 1;
            }
            tracing::info!(
                tax_year = table.tax_year(),
                filer_status = %table.filer_status(),
                slabs = table.slabs().len(),
                "loaded slab table"
            );
        }

        Ok(inserted)
    }
}

/// Loader for flat capital gains rates.
pub struct CapitalGainRateLoader;

impl CapitalGainRateLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<CapitalGainRateRecord>, RateLoaderError> {
        parse_records(reader)
    }

    /// Upsert each rate. Returns the number of rates written.
    pub async fn load<R: TaxRepository + ?Sized>(
        repo: &R,
        records: &[CapitalGainRateRecord],
    ) -> Result<usize, RateLoaderError> {
        let mut rates = Vec::with_capacity(records.len());
        for record in records {
            let bucket = CapitalGainBucket::parse(&record.bucket)
                .ok_or_else(|| RateLoaderError::InvalidBucket(record.bucket.clone()))?;
            if record.rate < Decimal::ZERO || record.rate > Decimal::ONE {
                return Err(RateLoaderError::CsvParse(format!(
                    "rate {} for {} is outside 0..=1",
                    record.rate, record.bucket
                )));
            }
            rates.push(CapitalGainRate {
                tax_year: record.tax_year.clone(),
                bucket,
                rate: record.rate,
            });
        }

        for rate in &rates {
            repo.upsert_capital_gain_rate(rate).await?;
        }
        tracing::info!(rates = rates.len(), "loaded capital gains rates");

        Ok(rates.len())
    }
}
