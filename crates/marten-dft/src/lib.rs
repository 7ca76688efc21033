#![doc = include_str!("../README.md")]

//! Fault-tree model shared by the marten translation passes.
//!
//! This crate defines the node arena (basic events and gates), the gate
//! kinds and their rule-generation capabilities, the diagnostic sink used
//! for recoverable reports, and (feature-gated) proptest strategies for
//! generating well-formed trees.

pub mod diagnostics;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod tree;
