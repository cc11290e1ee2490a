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

//! Session state and temporary AWS credentials for mobile clients.
//!
//! [`MobileClient`] keeps track of who is signed in, keeps their user pool
//! tokens fresh and vends temporary AWS credentials through a federated
//! identity pool. Signed-out users get credentials for an unauthenticated
//! identity when the pool allows it.
//!
//! The client does not speak any wire protocol. Applications provide a
//! [`UserPool`] and a [`FederatedIdentity`] that talk to their backend.
//!
//! ```no_run
//! use mobileauth_cognito::{Config, FederatedIdentity, MobileClient, UserPool};
//! use mobileauth_core::{Context, Result};
//!
//! # async fn example(
//! #     ctx: Context,
//! #     user_pool: impl UserPool,
//! #     federated: impl FederatedIdentity,
//! # ) -> Result<()> {
//! let config = Config::load(&ctx).await?;
//! let client = MobileClient::new(config, user_pool, federated);
//!
//! client.add_user_state_listener("app", |state, _| println!("user is now {state}"));
//! client.sign_in("alice", "correct horse").await?;
//!
//! let credentials = client.get_aws_credentials().await?;
//! println!("vended {credentials:?}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod constants;

mod access;
pub use access::{AccessLevel, AccessMode, ObjectKey};

mod client;
pub use client::MobileClient;

mod config;
pub use config::Config;

mod credential;
pub use credential::{Credentials, Identity};

mod identity;
pub use identity::IdentityResolver;

mod provide_credential;
pub use provide_credential::{CredentialsProvider, Vended};

mod state;
pub use state::{SessionStateMachine, StateInfo, UserState};

mod token;
pub use token::{Token, TokenKind, TokenSet};

mod token_store;
pub use token_store::TokenStore;

mod upstream;
pub use upstream::{FederatedIdentity, UserPool};
