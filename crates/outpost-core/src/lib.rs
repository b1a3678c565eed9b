//! Pure building blocks of a console list page: filtering, summary
//! statistics, detail selection and the local half of a mutation.

pub mod error;
pub mod filter;
pub mod installer;
pub mod ozql;
pub mod reducer;
pub mod selection;
pub mod stats;

pub use error::CoreError;
pub use filter::{filter, matches, Choice, FilterState};
pub use reducer::{apply_effect, LocalEffect};
pub use selection::{
    DetailPresentation, SelectionCoordinator, ViewMode, DEFAULT_COMPACT_BREAKPOINT_PX,
};
pub use stats::{compute_stats, Aggregate, DerivedStats, StatsScope};

pub use outpost_domain::{
    EntityRecord, MetricKey, RecordId, SearchFields, StatusKey, Validate, ValidationError,
};
