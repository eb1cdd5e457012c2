//! End-to-end tests of the security pipeline over the in-memory stack.

mod helpers;
mod pipeline_test;
mod screening_test;
