//! End-to-end translation tests: a schema document plus one resolved root
//! field in, one parameterized Cypher statement out. No database involved —
//! the statement text and the parameter bag are the contract.

mod mutation_translation_tests;
mod query_translation_tests;
mod translation_property_tests;
