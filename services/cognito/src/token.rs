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

use mobileauth_core::time::DateTime;
use mobileauth_core::utils::Redact;
use mobileauth_core::Expiring;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::time::Duration;

/// Kind of a user pool token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identity token, carries the user's claims.
    Id,
    /// Access token, authorizes user pool API calls.
    Access,
    /// Long-lived token used to obtain fresh id/access tokens.
    Refresh,
}

/// A single token issued by the user pool.
///
/// Tokens are immutable; a refresh replaces them wholesale.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    value: String,
    issued_at: DateTime,
    expires_at: DateTime,
}

impl Token {
    /// Create a new token.
    pub fn new(
        kind: TokenKind,
        value: impl Into<String>,
        issued_at: DateTime,
        expires_at: DateTime,
    ) -> Self {
        Self {
            kind,
            value: value.into(),
            issued_at,
            expires_at,
        }
    }

    /// Kind of this token.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Opaque token value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// When the token was issued.
    pub fn issued_at(&self) -> DateTime {
        self.issued_at
    }
}

impl Expiring for Token {
    fn expires_at(&self) -> DateTime {
        self.expires_at
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("kind", &self.kind)
            .field("value", &Redact::from(&self.value))
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The tokens of one signed-in user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenSet {
    username: String,
    tokens: HashMap<TokenKind, Token>,
}

impl TokenSet {
    /// Create an empty token set for `username`.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            tokens: HashMap::new(),
        }
    }

    /// Add or replace the token of the same kind.
    pub fn with_token(mut self, token: Token) -> Self {
        self.tokens.insert(token.kind, token);
        self
    }

    /// The user these tokens were issued to.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the token of the given kind.
    pub fn get(&self, kind: TokenKind) -> Option<&Token> {
        self.tokens.get(&kind)
    }

    /// Get the id token.
    pub fn id_token(&self) -> Option<&Token> {
        self.get(TokenKind::Id)
    }

    /// Get the access token.
    pub fn access_token(&self) -> Option<&Token> {
        self.get(TokenKind::Access)
    }

    /// Get the refresh token.
    pub fn refresh_token(&self) -> Option<&Token> {
        self.get(TokenKind::Refresh)
    }

    /// Whether the id and access tokens are present and outside `margin`.
    pub fn is_fresh(&self, margin: Duration) -> bool {
        [TokenKind::Id, TokenKind::Access]
            .iter()
            .all(|kind| self.get(*kind).is_some_and(|t| t.is_fresh(margin)))
    }

    /// Keep the refresh token of `previous` if this set came without one.
    ///
    /// The user pool only rotates refresh tokens occasionally, so refresh
    /// responses usually omit them.
    pub(crate) fn inherit_refresh_token(mut self, previous: &TokenSet) -> Self {
        if self.refresh_token().is_none() {
            if let Some(t) = previous.refresh_token() {
                self.tokens.insert(TokenKind::Refresh, t.clone());
            }
        }
        self
    }
}
