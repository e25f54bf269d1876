//! Test utilities shared across the crate: configuration builders and a
//! scripted provider.

#![cfg(test)]

pub mod config;
pub mod mocks;
