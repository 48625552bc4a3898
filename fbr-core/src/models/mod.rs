mod capital_gain;
mod filer_status;
mod forms;
mod tax_computation;
mod tax_slab;
mod tax_year_config;

pub use capital_gain::{CapitalGainBucket, CapitalGainRate};
pub use filer_status::FilerStatus;
pub use forms::{FieldValue, FormCategory, FormFields, TaxFormData};
pub use tax_computation::{NewTaxComputation, TaxComputation};
pub use tax_slab::{SlabTable, SlabTableError, TaxSlab};
pub use tax_year_config::TaxYearConfig;
