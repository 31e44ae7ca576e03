// Core modules
pub mod error;
pub mod normalizer;
pub mod record;

// Filtering and aggregation
pub mod crosstab;
pub mod filter;
pub mod frequency;
pub mod hierarchy;
pub mod histogram;
pub mod record_table;
pub mod time_buckets;
pub mod view_result;

pub mod dashboard;

// Service
pub mod config;
pub mod service;

pub use dashboard::{DashboardViews, ViewOptions};
pub use error::FormatError;
pub use filter::{Dimension, FilterOptions, FilterSpec, TimeRange};
pub use normalizer::{normalize, normalize_str, NormalizeReport, Normalized, PayloadShape};
pub use record::{CanonicalRecord, CategoryField};
pub use view_result::ViewResult;
