//! Data module - CSV loading, record types and cleaning

mod loader;
pub(crate) mod model;
mod processor;

pub use loader::{DataLoader, LoaderError, ParseError, ATHLETE_COLUMNS, REGION_COLUMNS};
pub use model::{
    AthleteEvent, EfficiencyRatio, GroupEstimate, Medal, NocRegion, NumericField, RowKey, Season,
    Sex,
};
pub use processor::{CleanedTable, CleaningSummary, DataProcessor, Estimator, ImputationError};
