/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SalaryDataset (codes → labels, is_us derived)
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ SalaryDataset │  Vec<SalaryRecord>, column index
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  salary range + label sets → FilteredView (indices)
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
