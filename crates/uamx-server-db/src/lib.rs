// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite-backed [`UserStore`](uamx_server_auth::UserStore) for the UAMx auth
//! policy hooks.

pub mod error;
pub mod pool;
pub mod testing;
pub mod user;

pub use error::{DbError, Result};
pub use pool::create_pool;
pub use user::SqliteUserStore;
