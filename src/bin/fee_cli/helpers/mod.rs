// ABOUTME: Re-exports helper modules for fee-cli
// ABOUTME: Provides display formatting and the console navigator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

pub mod display;
pub mod navigator;
