//! Shared helpers with no dependency on the schema or translation layers.

pub mod naming;
