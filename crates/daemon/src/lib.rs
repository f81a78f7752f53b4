// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sb-daemon: the `sbd` process launcher

pub mod heartbeat;
pub mod logging;
pub mod switchboard;

pub use switchboard::{Hosted, Switchboard};
