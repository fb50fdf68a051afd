//! Containers backing the search.

pub mod frontier;
