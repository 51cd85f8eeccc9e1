// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Change feed production: the mutation generator.

mod generator;

pub use generator::{CycleReport, GeneratorReport, MutationGenerator};
