mod loader;

pub use loader::{
    CapitalGainRateLoader, CapitalGainRateRecord, RateLoaderError, SlabLoader, SlabRecord,
};
