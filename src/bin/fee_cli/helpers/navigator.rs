// ABOUTME: Console navigator for fee-cli
// ABOUTME: Turns guard redirects into instructions printed on stderr
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

use college_fee_client::navigation::Navigator;

/// Prints what the user should do instead of changing a page
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn redirect_to_login(&self) {
        eprintln!("Session ended. Log in again with `fee-cli login`.");
    }

    fn redirect_to_unauthorized(&self) {
        eprintln!("Your role is not allowed here.");
    }
}
