// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Core components for mobile authentication clients.
//!
//! This crate provides the foundational types and traits shared by the
//! mobileauth crates.
//!
//! ## Overview
//!
//! - **Context**: A container that holds implementations for file reading and environment access
//! - **Traits**: [`ProvideCredential`] for handing credentials to a transfer layer and
//!   [`Expiring`] for every cached short-lived secret
//! - **Flight**: A broadcast-once primitive that lets many callers share one in-flight upstream call
//! - **Error**: A single error type whose [`ErrorKind`] separates client misuse, network
//!   failures and invalid tokens
//!
//! ## Example
//!
//! ```
//! use mobileauth_core::flight::flight;
//!
//! # async fn example() -> mobileauth_core::Result<()> {
//! let (landing, waiter) = flight::<String>();
//! let other = waiter.clone();
//!
//! landing.land(Ok("shared".to_string()));
//!
//! assert_eq!(waiter.wait().await?, "shared");
//! assert_eq!(other.wait().await?, "shared");
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod flight;
pub mod time;
pub mod utils;

mod api;
pub use api::{Expiring, ProvideCredential};
mod context;
pub use context::{Context, Env, FileRead, NoopEnv, NoopFileRead, OsEnv, StaticEnv};
mod error;
pub use error::{Error, ErrorKind, Result};
