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

//! Upstream services the client talks to.
//!
//! The client never speaks a wire protocol itself. Applications plug in
//! implementations of these traits that call their identity provider.

use crate::{Credentials, Identity, Token, TokenSet};
use async_trait::async_trait;
use mobileauth_core::Result;
use std::fmt::Debug;

/// UserPool signs users in and refreshes their tokens.
#[async_trait]
pub trait UserPool: Debug + Send + Sync + 'static {
    /// Sign `username` in with `password`.
    ///
    /// Wrong credentials must be reported as `ErrorKind::ClientError`.
    async fn sign_in(&self, username: &str, password: &str) -> Result<TokenSet>;

    /// Exchange a refresh token for fresh id and access tokens.
    ///
    /// A revoked or expired refresh token must be reported as
    /// `ErrorKind::TokenInvalid`; transport failures as
    /// `ErrorKind::NetworkError`. The returned set may omit the refresh
    /// token, in which case the previous one is kept.
    async fn refresh_tokens(&self, username: &str, refresh_token: &Token) -> Result<TokenSet>;
}

/// FederatedIdentity maps users to identities and vends credentials for them.
#[async_trait]
pub trait FederatedIdentity: Debug + Send + Sync + 'static {
    /// Get the identity id for `tokens`, or the unauthenticated identity id
    /// when `tokens` is `None`.
    async fn get_identity_id(&self, tokens: Option<&TokenSet>) -> Result<String>;

    /// Exchange an identity (and the tokens proving it) for credentials.
    ///
    /// Tokens rejected by the identity provider must be reported as
    /// `ErrorKind::TokenInvalid`.
    async fn exchange(&self, identity: &Identity, tokens: Option<&TokenSet>)
        -> Result<Credentials>;
}
