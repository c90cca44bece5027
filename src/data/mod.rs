/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → typed columns → derived metrics
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  path → Arc<Dataset>, shared read-only
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterCriteria → new Dataset (order preserved)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  summary  │  counts, sums, means, groups, rankings, bins, fits
///   └──────────┘
/// ```

pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod summary;

pub use cache::{load, DatasetCache};
pub use error::{Diagnostic, LoadError};
pub use filter::{filter, FilterCriteria};
pub use metrics::DerivedMetric;
pub use model::{columns, Dataset, Record, Value};
