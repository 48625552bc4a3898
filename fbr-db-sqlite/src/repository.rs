use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fbr_core::{
    CapitalGainBucket, CapitalGainRate, FilerStatus, NewTaxComputation, RepositoryError,
    TaxComputation, TaxRepository, TaxSlab, TaxYearConfig,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connects to `database_url`, creating the database file if needed.
    ///
    /// Accepts sqlx URLs (`sqlite://fbr.db`, `sqlite::memory:`) as well as
    /// bare paths and `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;

            tracing::debug!(seed = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn get_filer_status(row: &SqliteRow) -> Result<FilerStatus, RepositoryError> {
    let code: String = row.try_get("filer_status").map_err(db_err)?;
    FilerStatus::parse(&code)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid filer status: {}", code)))
}

fn row_to_tax_slab(row: &SqliteRow) -> Result<TaxSlab, RepositoryError> {
    Ok(TaxSlab {
        tax_year: row.try_get("tax_year").map_err(db_err)?,
        filer_status: get_filer_status(row)?,
        min_income: get_decimal(row, "min_income")?,
        max_income: get_optional_decimal(row, "max_income")?,
        rate: get_decimal(row, "rate")?,
        fixed_amount: get_decimal(row, "fixed_amount")?,
    })
}

fn row_to_tax_computation(row: &SqliteRow) -> Result<TaxComputation, RepositoryError> {
    Ok(TaxComputation {
        id: row.try_get("id").map_err(db_err)?,
        tax_year: row.try_get("tax_year").map_err(db_err)?,
        filer_status: get_filer_status(row)?,
        label: row.try_get("label").map_err(db_err)?,
        gross_income: get_decimal(row, "gross_income")?,
        taxable_income: get_decimal(row, "taxable_income")?,
        normal_tax: get_decimal(row, "normal_tax")?,
        surcharge: get_decimal(row, "surcharge")?,
        capital_gain_tax: get_decimal(row, "capital_gain_tax")?,
        total_tax_liability: get_decimal(row, "total_tax_liability")?,
        total_tax_paid: get_decimal(row, "total_tax_paid")?,
        refund_due: get_decimal(row, "refund_due")?,
        additional_tax_due: get_decimal(row, "additional_tax_due")?,
        effective_tax_rate: get_decimal(row, "effective_tax_rate")?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

const COMPUTATION_COLUMNS: &str = "id, tax_year, filer_status, label, gross_income, taxable_income,
    normal_tax, surcharge, capital_gain_tax, total_tax_liability, total_tax_paid,
    refund_due, additional_tax_due, effective_tax_rate, created_at";

#[async_trait]
impl TaxRepository for SqliteRepository {
    async fn list_tax_years(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query("SELECT tax_year FROM tax_years ORDER BY tax_year DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter()
            .map(|row| row.try_get("tax_year").map_err(db_err))
            .collect()
    }

    async fn get_tax_year_config(
        &self,
        tax_year: &str,
    ) -> Result<TaxYearConfig, RepositoryError> {
        let row = sqlx::query(
            "SELECT tax_year, effective_from, effective_to, surcharge_threshold, surcharge_rate
             FROM tax_years WHERE tax_year = ?",
        )
        .bind(tax_year)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        Ok(TaxYearConfig {
            tax_year: row.try_get("tax_year").map_err(db_err)?,
            effective_from: row.try_get::<NaiveDate, _>("effective_from").map_err(db_err)?,
            effective_to: row.try_get::<NaiveDate, _>("effective_to").map_err(db_err)?,
            surcharge_threshold: get_optional_decimal(&row, "surcharge_threshold")?,
            surcharge_rate: get_decimal(&row, "surcharge_rate")?,
        })
    }

    async fn upsert_tax_year_config(
        &self,
        config: &TaxYearConfig,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO tax_years (tax_year, effective_from, effective_to, surcharge_threshold, surcharge_rate)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (tax_year) DO UPDATE SET
                effective_from = excluded.effective_from,
                effective_to = excluded.effective_to,
                surcharge_threshold = excluded.surcharge_threshold,
                surcharge_rate = excluded.surcharge_rate",
        )
        .bind(&config.tax_year)
        .bind(config.effective_from)
        .bind(config.effective_to)
        .bind(config.surcharge_threshold.map(decimal_to_text))
        .bind(decimal_to_text(config.surcharge_rate))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_tax_slabs(
        &self,
        tax_year: &str,
        filer_status: FilerStatus,
    ) -> Result<Vec<TaxSlab>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT tax_year, filer_status, min_income, max_income, rate, fixed_amount
             FROM tax_slabs
             WHERE tax_year = ? AND filer_status = ?
             ORDER BY CAST(min_income AS REAL)",
        )
        .bind(tax_year)
        .bind(filer_status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_tax_slab).collect()
    }

    async fn insert_tax_slab(
        &self,
        slab: &TaxSlab,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO tax_slabs (tax_year, filer_status, min_income, max_income, rate, fixed_amount)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&slab.tax_year)
        .bind(slab.filer_status.as_str())
        .bind(decimal_to_text(slab.min_income))
        .bind(slab.max_income.map(decimal_to_text))
        .bind(decimal_to_text(slab.rate))
        .bind(decimal_to_text(slab.fixed_amount))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn delete_tax_slabs(
        &self,
        tax_year: &str,
        filer_status: FilerStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM tax_slabs WHERE tax_year = ? AND filer_status = ?")
            .bind(tax_year)
            .bind(filer_status.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    async fn get_capital_gain_rates(
        &self,
        tax_year: &str,
    ) -> Result<Vec<CapitalGainRate>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT tax_year, bucket, rate FROM capital_gain_rates WHERE tax_year = ? ORDER BY bucket",
        )
        .bind(tax_year)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                let code: String = row.try_get("bucket").map_err(db_err)?;
                let bucket = CapitalGainBucket::parse(&code).ok_or_else(|| {
                    RepositoryError::Database(format!("Invalid capital gains bucket: {}", code))
                })?;
                Ok(CapitalGainRate {
                    tax_year: row.try_get("tax_year").map_err(db_err)?,
                    bucket,
                    rate: get_decimal(row, "rate")?,
                })
            })
            .collect()
    }

    async fn upsert_capital_gain_rate(
        &self,
        rate: &CapitalGainRate,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO capital_gain_rates (tax_year, bucket, rate) VALUES (?, ?, ?)
             ON CONFLICT (tax_year, bucket) DO UPDATE SET rate = excluded.rate",
        )
        .bind(&rate.tax_year)
        .bind(rate.bucket.as_str())
        .bind(decimal_to_text(rate.rate))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn create_computation(
        &self,
        computation: NewTaxComputation,
    ) -> Result<TaxComputation, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO tax_computations (
                tax_year, filer_status, label, gross_income, taxable_income,
                normal_tax, surcharge, capital_gain_tax, total_tax_liability,
                total_tax_paid, refund_due, additional_tax_due, effective_tax_rate,
                created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&computation.tax_year)
        .bind(computation.filer_status.as_str())
        .bind(&computation.label)
        .bind(decimal_to_text(computation.gross_income))
        .bind(decimal_to_text(computation.taxable_income))
        .bind(decimal_to_text(computation.normal_tax))
        .bind(decimal_to_text(computation.surcharge))
        .bind(decimal_to_text(computation.capital_gain_tax))
        .bind(decimal_to_text(computation.total_tax_liability))
        .bind(decimal_to_text(computation.total_tax_paid))
        .bind(decimal_to_text(computation.refund_due))
        .bind(decimal_to_text(computation.additional_tax_due))
        .bind(decimal_to_text(computation.effective_tax_rate))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = result.last_insert_rowid();
        tracing::info!(id, tax_year = %computation.tax_year, label = %computation.label, "saved computation");
        self.get_computation(id).await
    }

    async fn get_computation(
        &self,
        id: i64,
    ) -> Result<TaxComputation, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tax_computations WHERE id = ?",
            COMPUTATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_tax_computation(&row)
    }

    async fn delete_computation(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tax_computations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_computations(
        &self,
        tax_year: Option<&str>,
    ) -> Result<Vec<TaxComputation>, RepositoryError> {
        let rows = match tax_year {
            Some(year) => {
                sqlx::query(&format!(
                    "SELECT {} FROM tax_computations WHERE tax_year = ? ORDER BY created_at DESC, id DESC",
                    COMPUTATION_COLUMNS
                ))
                .bind(year)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM tax_computations ORDER BY created_at DESC, id DESC",
                    COMPUTATION_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;

        rows.iter().map(row_to_tax_computation).collect()
    }
}
