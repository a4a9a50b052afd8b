// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for the pingback engine.
//!
//! Provides loopback HTTP peers (source pages, pingback endpoints) and
//! generators for hostile or malformed input.

pub mod generators;
pub mod servers;
