//! Integration tests for the dsynth library and binary

mod cli_test;
mod engine_test;
mod property_test;
mod standard_test;
