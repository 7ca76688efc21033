#![doc = include_str!("../README.md")]

//! EXP synchronization-network generation for dynamic fault trees.
//!
//! This crate defines the rendezvous data types (`sync`), the rule builder
//! that walks a fault tree and produces the activation/fail rule sets
//! (`rules`), and the emitter that serializes a finished rule set into the
//! EXP textual form (`emit`).

pub mod emit;
pub mod rules;
pub mod sync;
