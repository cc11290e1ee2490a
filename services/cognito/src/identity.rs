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

use crate::upstream::FederatedIdentity;
use crate::{Identity, TokenSet};
use log::debug;
use mobileauth_core::{Error, Result};
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};

/// IdentityResolver maps a token set (or its absence) to an [`Identity`].
///
/// The unauthenticated identity is fetched once and then stays fixed. The
/// authenticated identity stays bound to the user it was resolved for and is
/// re-resolved as soon as tokens of another user show up.
///
/// Every [`IdentityResolver::clear_authenticated`] starts a new epoch. A
/// lookup that started in an older epoch still returns its identity to the
/// caller but never becomes the bound or current identity.
pub struct IdentityResolver {
    upstream: Arc<dyn FederatedIdentity>,
    allow_unauthenticated: bool,
    inner: Mutex<Inner>,
    resolving: tokio::sync::Mutex<()>,
}

#[derive(Default)]
struct Inner {
    unauthenticated: Option<Identity>,
    authenticated: Option<(String, Identity)>,
    current: Option<Identity>,
    epoch: u64,
}

impl Debug for IdentityResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().expect("lock poisoned");
        f.debug_struct("IdentityResolver")
            .field("allow_unauthenticated", &self.allow_unauthenticated)
            .field("current", &inner.current)
            .finish()
    }
}

impl IdentityResolver {
    /// Create a new resolver.
    pub fn new(upstream: Arc<dyn FederatedIdentity>, allow_unauthenticated: bool) -> Self {
        Self {
            upstream,
            allow_unauthenticated,
            inner: Mutex::new(Inner::default()),
            resolving: tokio::sync::Mutex::new(()),
        }
    }

    /// Resolve the identity for `tokens`.
    pub async fn resolve_identity(&self, tokens: Option<&TokenSet>) -> Result<Identity> {
        if tokens.is_none() && !self.allow_unauthenticated {
            return Err(Error::client_error(
                "unauthenticated identities are disabled, sign in first",
            ));
        }
        if let Some(identity) = self.cached(tokens) {
            return Ok(identity);
        }

        // Only one upstream lookup at a time, later callers reuse its result.
        let _resolving = self.resolving.lock().await;
        if let Some(identity) = self.cached(tokens) {
            return Ok(identity);
        }

        let epoch = self.inner.lock().expect("lock poisoned").epoch;
        let id = self.upstream.get_identity_id(tokens).await?;

        let mut inner = self.inner.lock().expect("lock poisoned");
        let identity = match tokens {
            Some(tokens) => {
                let identity = Identity::authenticated(id);
                if inner.epoch != epoch {
                    debug!(
                        "session changed while resolving identity of {}, not binding {}",
                        tokens.username(),
                        identity.id()
                    );
                    return Ok(identity);
                }
                debug!(
                    "bound identity {} to user {}",
                    identity.id(),
                    tokens.username()
                );
                inner.authenticated = Some((tokens.username().to_string(), identity.clone()));
                identity
            }
            None => {
                // The unauthenticated identity does not depend on the session.
                let identity = Identity::unauthenticated(id);
                debug!("using unauthenticated identity {}", identity.id());
                inner.unauthenticated = Some(identity.clone());
                if inner.epoch != epoch {
                    return Ok(identity);
                }
                identity
            }
        };
        inner.current = Some(identity.clone());
        Ok(identity)
    }

    /// The id of the most recently resolved identity, if any.
    pub fn identity_id(&self) -> Option<String> {
        let inner = self.inner.lock().expect("lock poisoned");
        inner.current.as_ref().map(|v| v.id().to_string())
    }

    /// Forget the authenticated identity, used on sign-in and sign-out.
    ///
    /// Lookups still in flight are not bound once they complete.
    pub fn clear_authenticated(&self) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.epoch += 1;
        inner.authenticated = None;
        inner.current = inner.unauthenticated.clone();
    }

    fn cached(&self, tokens: Option<&TokenSet>) -> Option<Identity> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let identity = match tokens {
            None => inner.unauthenticated.clone(),
            Some(tokens) => inner
                .authenticated
                .as_ref()
                .filter(|(user, _)| user == tokens.username())
                .map(|(_, identity)| identity.clone()),
        }?;
        inner.current = Some(identity.clone());
        Some(identity)
    }
}
