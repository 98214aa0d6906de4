//! Generic filtered-list query engine
//!
//! - `filter` - compiles request filters into a parameterized WHERE clause
//! - `executor` - count + page queries and the pagination envelope
//! - `classify` - maps store failures to status/code pairs

pub mod classify;
pub mod executor;
pub mod filter;

pub use classify::ClassifiedError;
pub use executor::{ListQuery, PageEnvelope, PageRequest, PaginationMeta, execute};
pub use filter::{
    BoundParams, CompiledFilter, FilterBag, FilterOperator, FilterSpec, FilterValue, ValueType,
    compile, validate_filter_map,
};
