//! Unit tests exercising schema loading and the filter compiler through the
//! public crate surface. Statement-level behavior lives in the integration
//! suite; these pin down the building blocks in isolation.

mod filter_compilation_tests;
mod schema_catalog_tests;
