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
use crate::identity::IdentityResolver;
use crate::state::{SessionStateMachine, StateInfo, UserState};
use crate::token_store::TokenStore;
use crate::upstream::FederatedIdentity;
use crate::{Credentials, Identity};
use async_trait::async_trait;
use log::{debug, info};
use mobileauth_core::flight::{flight, Flight, GuardedLanding};
use mobileauth_core::time::format_rfc3339;
use mobileauth_core::{Error, Expiring, ProvideCredential, Result};
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Credentials together with the identity they were vended for.
pub type Vended = (Identity, Credentials);

/// CredentialsProvider vends temporary AWS credentials for the current session.
///
/// Credentials are cached per token generation until they come within the
/// refresh margin of their expiration. Concurrent callers that miss the cache
/// share a single upstream exchange. The exchange runs in its own task, so a
/// caller that stops waiting does not cancel it for the others.
#[derive(Clone)]
pub struct CredentialsProvider {
    tokens: TokenStore,
    identity: Arc<IdentityResolver>,
    federated: Arc<dyn FederatedIdentity>,
    session: Arc<SessionStateMachine>,
    refresh_margin: Duration,
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    cached: Option<Cached>,
    pending: Option<Pending>,
}

struct Cached {
    generation: u64,
    identity: Identity,
    credentials: Credentials,
}

struct Pending {
    generation: u64,
    flight: Flight<Vended>,
}

impl Debug for CredentialsProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().expect("lock poisoned");
        f.debug_struct("CredentialsProvider")
            .field("refresh_margin", &self.refresh_margin)
            .field("cached", &state.cached.as_ref().map(|c| &c.credentials))
            .field("fetching", &state.pending.is_some())
            .finish()
    }
}

impl CredentialsProvider {
    /// Create a new provider on top of the given session components.
    pub fn new(
        tokens: TokenStore,
        identity: Arc<IdentityResolver>,
        federated: Arc<dyn FederatedIdentity>,
        session: Arc<SessionStateMachine>,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            tokens,
            identity,
            federated,
            session,
            refresh_margin,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Get credentials for the current session.
    pub async fn get_credentials(&self) -> Result<Credentials> {
        let (_, credentials) = self.vend().await?;
        Ok(credentials)
    }

    /// Get credentials together with the identity they belong to.
    pub async fn vend(&self) -> Result<Vended> {
        let generation = self.tokens.generation();

        let waiter = {
            let mut state = self.state.lock().expect("lock poisoned");
            if let Some(cached) = &state.cached {
                if cached.generation == generation && cached.credentials.is_fresh(self.refresh_margin)
                {
                    return Ok((cached.identity.clone(), cached.credentials.clone()));
                }
            }

            let joined = state
                .pending
                .as_ref()
                .filter(|p| p.generation == generation)
                .map(|p| p.flight.clone());

            match joined {
                Some(waiter) => waiter,
                None => {
                    let (landing, waiter) = flight();
                    state.pending = Some(Pending {
                        generation,
                        flight: waiter.clone(),
                    });

                    // A panicking exchange must not leave later callers
                    // waiting on a flight that never lands.
                    let shared = self.state.clone();
                    let landing = landing.guard(move |id| clear_pending(&shared, id));

                    let this = self.clone();
                    tokio::spawn(async move {
                        let result = this.fetch().await;
                        this.complete(landing, result);
                    });
                    waiter
                }
            }
        };

        waiter.wait().await
    }

    /// Drop cached credentials and detach any in-flight exchange.
    ///
    /// Waiters of the detached exchange still receive its result.
    pub fn clear(&self) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.cached = None;
        state.pending = None;
    }

    async fn fetch(&self) -> Result<(u64, Identity, Credentials)> {
        let (generation, current) = self.tokens.snapshot();
        let tokens = match current {
            Some(_) => Some(self.tokens.get_tokens().await?),
            None => None,
        };

        let identity = self.identity.resolve_identity(tokens.as_ref()).await?;
        debug!("exchanging credentials for identity {}", identity.id());

        let credentials = match self.federated.exchange(&identity, tokens.as_ref()).await {
            Ok(credentials) => credentials,
            Err(err) if err.is_token_invalid() && tokens.is_some() => {
                if let Some(username) = self.tokens.invalidate(generation) {
                    info!("identity provider rejected tokens of {username}: {err}");
                    self.session.transition(
                        UserState::SignedOutFederatedTokensInvalid,
                        StateInfo::from([
                            (INFO_USERNAME.to_string(), username),
                            (INFO_REASON.to_string(), err.to_string()),
                        ]),
                    );
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        if !credentials.is_fresh(self.refresh_margin) {
            return Err(Error::unexpected(format!(
                "identity provider returned credentials expiring at {}",
                format_rfc3339(credentials.expiration)
            )));
        }

        Ok((generation, identity, credentials))
    }

    fn complete(
        &self,
        landing: GuardedLanding<Vended, impl FnOnce(u64)>,
        result: Result<(u64, Identity, Credentials)>,
    ) {
        let result = {
            let mut state = self.state.lock().expect("lock poisoned");
            if state
                .pending
                .as_ref()
                .is_some_and(|p| p.flight.id() == landing.id())
            {
                state.pending = None;
            }

            result.map(|(generation, identity, credentials)| {
                if generation == self.tokens.generation() {
                    debug!(
                        "caching credentials for identity {} until {}",
                        identity.id(),
                        format_rfc3339(credentials.expiration)
                    );
                    state.cached = Some(Cached {
                        generation,
                        identity: identity.clone(),
                        credentials: credentials.clone(),
                    });
                } else {
                    let err = Error::identity_mismatch(format!(
                        "session changed while vending credentials for identity {}",
                        identity.id()
                    ));
                    debug!("not caching credentials: {err}");
                }
                (identity, credentials)
            })
        };

        landing.land(result);
    }
}

fn clear_pending(state: &Mutex<State>, flight_id: u64) {
    let Ok(mut state) = state.lock() else {
        return;
    };
    if state.pending.as_ref().is_some_and(|p| p.flight.id() == flight_id) {
        debug!("credentials exchange {flight_id} ended without a result");
        state.pending = None;
    }
}

#[async_trait]
impl ProvideCredential for CredentialsProvider {
    type Credential = Credentials;

    async fn provide_credential(&self) -> Result<Self::Credential> {
        self.get_credentials().await
    }
}
