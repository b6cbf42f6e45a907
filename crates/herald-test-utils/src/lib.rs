// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Herald integration tests.
//!
//! Provides a [`TestHarness`] that runs the whole HTTP stack in-process on a
//! temp SQLite database, with no network or external services.

pub mod harness;

pub use harness::{TestHarness, TestHarnessBuilder, TestResponse};
