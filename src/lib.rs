//! Refinfer: extract/inline-variable inference over fragment mappings.
//!
//! Given the statement mappings between two versions of a method body,
//! decides which mappings are exact and explains the remaining
//! differences as extracted or inlined variables.

// Core infrastructure - re-exported from refinfer-core
pub use refinfer_core::config;
pub use refinfer_core::error;
pub use refinfer_core::output;
pub use refinfer_core::text;
pub use refinfer_core::types;
pub use refinfer_core::util;

// Mapping engine
pub use refinfer_mapping as mapping;

// Front door
pub mod cli;
pub mod report;

// Error bridges (DocumentError -> RefinferError) live in refinfer-mapping
// because of the orphan rule.
