pub mod calculations;
pub mod db;
pub mod models;
pub mod money;
pub mod rates;

pub use calculations::{ComprehensiveTaxResult, TaxEngineError, ValidationReport};
pub use db::repository::{RepositoryError, TaxRepository};
pub use models::*;
pub use money::{InputIssue, MoneyError, parse_money, to_money};
pub use rates::{RateBook, RateBookError, TaxRateProvider};
