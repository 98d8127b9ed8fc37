//! Query Module
//!
//! Declarative filters, their translation into backing-store predicates, and
//! the cache-backed paginated query builder.

mod filter;
mod paginate;

pub use filter::{
    compare_values, translate_filters, CmpOp, FilterOp, FilterValue, OrderBy, Predicate,
    SortDirection,
};
pub use paginate::{fetch_paginated, PageRequest, PaginatedResponse};
