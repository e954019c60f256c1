//! Common test utilities for installthecli-engine
//!
//! This module provides shared test infrastructure including:
//! - A scripted command runner that records invocations
//! - A tool locator backed by an in-memory table
//! - Fixtures for platforms, targets and installers
//! - Captured tracing output

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;
pub mod logs;
pub mod mocks;

pub use fixtures::*;
pub use logs::*;
pub use mocks::*;
