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

use crate::constants::{INFO_REASON, INFO_USERNAME};
use crate::state::{SessionStateMachine, StateInfo, UserState};
use crate::upstream::UserPool;
use crate::TokenSet;
use log::{debug, info, warn};
use mobileauth_core::flight::{flight, Flight, GuardedLanding};
use mobileauth_core::{Error, Result};
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// TokenStore owns the user pool tokens of the signed-in user.
///
/// Every `set_tokens` and `clear` starts a new generation. Work derived from
/// the tokens (refreshes, credentials) is tagged with the generation it
/// started in, so results that complete after the user changed can be told
/// apart and dropped.
#[derive(Clone)]
pub struct TokenStore {
    user_pool: Arc<dyn UserPool>,
    session: Arc<SessionStateMachine>,
    refresh_margin: Duration,
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    tokens: Option<TokenSet>,
    generation: u64,
    pending: Option<PendingRefresh>,
}

struct PendingRefresh {
    generation: u64,
    flight: Flight<TokenSet>,
}

impl Debug for TokenStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().expect("lock poisoned");
        f.debug_struct("TokenStore")
            .field("user_pool", &self.user_pool)
            .field("refresh_margin", &self.refresh_margin)
            .field("tokens", &inner.tokens)
            .field("generation", &inner.generation)
            .field("refreshing", &inner.pending.is_some())
            .finish()
    }
}

impl TokenStore {
    /// Create an empty token store.
    pub fn new(
        user_pool: Arc<dyn UserPool>,
        session: Arc<SessionStateMachine>,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            user_pool,
            session,
            refresh_margin,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// The tokens currently stored, whether fresh or not.
    pub fn get_current_tokens(&self) -> Option<TokenSet> {
        self.inner.lock().expect("lock poisoned").tokens.clone()
    }

    /// The current generation together with the tokens it holds.
    pub fn snapshot(&self) -> (u64, Option<TokenSet>) {
        let inner = self.inner.lock().expect("lock poisoned");
        (inner.generation, inner.tokens.clone())
    }

    /// The current generation.
    pub fn generation(&self) -> u64 {
        self.inner.lock().expect("lock poisoned").generation
    }

    /// Replace the stored tokens, typically after a sign-in.
    pub fn set_tokens(&self, tokens: TokenSet) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.generation += 1;
        debug!(
            "storing tokens of {} as generation {}",
            tokens.username(),
            inner.generation
        );
        inner.tokens = Some(tokens);
        inner.pending = None;
    }

    /// Drop the stored tokens, typically on sign-out.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.generation += 1;
        inner.tokens = None;
        inner.pending = None;
    }

    /// Drop the stored tokens only if they still belong to `generation`.
    ///
    /// Returns the username whose tokens were dropped.
    pub(crate) fn invalidate(&self, generation: u64) -> Option<String> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if inner.generation != generation {
            return None;
        }
        let tokens = inner.tokens.take()?;
        inner.generation += 1;
        inner.pending = None;
        Some(tokens.username().to_string())
    }

    /// Get tokens that are valid for at least the refresh margin.
    ///
    /// Refreshes them first if needed.
    pub async fn get_tokens(&self) -> Result<TokenSet> {
        {
            let inner = self.inner.lock().expect("lock poisoned");
            match &inner.tokens {
                None => return Err(Error::client_error("user is not signed in")),
                Some(tokens) if tokens.is_fresh(self.refresh_margin) => {
                    return Ok(tokens.clone())
                }
                Some(_) => {}
            }
        }

        self.refresh().await
    }

    /// Refresh the stored tokens with the user pool.
    ///
    /// Concurrent callers share one upstream refresh. If the user pool
    /// rejects the refresh token, the tokens are dropped and the session moves
    /// to [`UserState::SignedOutUserPoolsTokenInvalid`].
    pub async fn refresh(&self) -> Result<TokenSet> {
        let waiter = {
            let mut inner = self.inner.lock().expect("lock poisoned");
            let Some(current) = inner.tokens.clone() else {
                return Err(Error::client_error("user is not signed in"));
            };
            let generation = inner.generation;

            let joined = inner
                .pending
                .as_ref()
                .filter(|p| p.generation == generation)
                .map(|p| p.flight.clone());

            match joined {
                Some(waiter) => {
                    debug!("joining in-flight token refresh of {}", current.username());
                    waiter
                }
                None => {
                    let (landing, waiter) = flight();
                    inner.pending = Some(PendingRefresh {
                        generation,
                        flight: waiter.clone(),
                    });

                    let shared = self.inner.clone();
                    let landing = landing.guard(move |id| clear_pending(&shared, id));

                    let this = self.clone();
                    tokio::spawn(async move { this.run_refresh(generation, current, landing).await });
                    waiter
                }
            }
        };

        waiter.wait().await
    }

    async fn run_refresh(
        &self,
        generation: u64,
        current: TokenSet,
        landing: GuardedLanding<TokenSet, impl FnOnce(u64)>,
    ) {
        debug!("refreshing tokens of {}", current.username());
        let result = match current.refresh_token() {
            Some(token) => {
                self.user_pool
                    .refresh_tokens(current.username(), token)
                    .await
            }
            None => Err(Error::token_invalid("no refresh token available")),
        };

        let result = self.finish_refresh(generation, &current, landing.id(), result);
        landing.land(result);
    }

    fn finish_refresh(
        &self,
        generation: u64,
        current: &TokenSet,
        flight_id: u64,
        result: Result<TokenSet>,
    ) -> Result<TokenSet> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if inner.pending.as_ref().is_some_and(|p| p.flight.id() == flight_id) {
            inner.pending = None;
        }

        match result {
            Ok(fresh) => {
                let fresh = fresh.inherit_refresh_token(current);
                if inner.generation == generation {
                    inner.tokens = Some(fresh.clone());
                } else {
                    debug!(
                        "session changed while refreshing tokens of {}, not storing them",
                        current.username()
                    );
                }
                Ok(fresh)
            }
            Err(err) if err.is_token_invalid() => {
                drop(inner);
                if let Some(username) = self.invalidate(generation) {
                    info!("refresh token of {username} was rejected: {err}");
                    self.session.transition(
                        UserState::SignedOutUserPoolsTokenInvalid,
                        StateInfo::from([
                            (INFO_USERNAME.to_string(), username),
                            (INFO_REASON.to_string(), err.to_string()),
                        ]),
                    );
                }
                Err(err)
            }
            Err(err) => {
                warn!("failed to refresh tokens of {}: {err}", current.username());
                Err(err)
            }
        }
    }
}

/// Forget the refresh `flight_id` if it is still the pending one.
///
/// Runs when a refresh task ends without landing, so the next caller starts
/// a new refresh instead of joining a dead one.
fn clear_pending(inner: &Mutex<Inner>, flight_id: u64) {
    let Ok(mut inner) = inner.lock() else {
        return;
    };
    if inner.pending.as_ref().is_some_and(|p| p.flight.id() == flight_id) {
        warn!("token refresh {flight_id} ended without a result");
        inner.pending = None;
    }
}
