//! Services layer
//!
//! Storage-agnostic query helpers built on `DataSource`:
//! - pagination over an arbitrary fetcher or a data source
//! - two-level parent/children assembly
//! - slice membership tests
//! - request parameter signing

pub mod hierarchy;
pub mod membership;
pub mod paginator;
pub mod signing;

pub use hierarchy::{
    assemble_by_empty_link, assemble_by_zero_parent, assemble_hierarchy, ChildFetchErrorPolicy,
    HierarchyError, HierarchyQuery, RootPolicy,
};
pub use membership::{contains, contains_record};
pub use paginator::{
    paginate, paginate_by_source, paginate_by_source_with, paginate_source, PageFetcher,
    PaginationError, SourceFetcher,
};
pub use signing::{md5_hex, ParamSigner, SIGN_PARAM};
