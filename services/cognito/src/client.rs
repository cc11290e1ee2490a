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

use crate::access::{AccessMode, ObjectKey};
use crate::constants::INFO_USERNAME;
use crate::identity::IdentityResolver;
use crate::provide_credential::CredentialsProvider;
use crate::state::{SessionStateMachine, StateInfo, UserState};
use crate::token_store::TokenStore;
use crate::upstream::{FederatedIdentity, UserPool};
use crate::{Config, Credentials, TokenSet};
use async_trait::async_trait;
use log::{debug, info};
use mobileauth_core::{Error, ProvideCredential, Result};
use std::sync::Arc;

/// MobileClient is the entry point applications hold on to.
///
/// It wires the token store, the identity resolver and the credentials
/// provider to one session and exposes the operations an app needs:
/// signing users in and out, watching the session state and getting
/// credentials for the transfer layer.
///
/// Cloning is cheap, every clone shares the same session.
#[derive(Debug, Clone)]
pub struct MobileClient {
    config: Arc<Config>,
    session: Arc<SessionStateMachine>,
    user_pool: Arc<dyn UserPool>,
    tokens: TokenStore,
    identity: Arc<IdentityResolver>,
    credentials: CredentialsProvider,
}

impl MobileClient {
    /// Create a client for `config` on top of the given upstream services.
    pub fn new(
        config: Config,
        user_pool: impl UserPool,
        federated: impl FederatedIdentity,
    ) -> Self {
        let user_pool: Arc<dyn UserPool> = Arc::new(user_pool);
        let federated: Arc<dyn FederatedIdentity> = Arc::new(federated);
        let session = Arc::new(SessionStateMachine::new());

        let tokens = TokenStore::new(
            user_pool.clone(),
            session.clone(),
            config.token_refresh_margin,
        );
        let identity = Arc::new(IdentityResolver::new(
            federated.clone(),
            config.allow_unauthenticated_identities,
        ));
        let credentials = CredentialsProvider::new(
            tokens.clone(),
            identity.clone(),
            federated,
            session.clone(),
            config.credentials_refresh_margin,
        );

        Self {
            config: Arc::new(config),
            session,
            user_pool,
            tokens,
            identity,
            credentials,
        }
    }

    /// The config this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sign `username` in with `password`.
    ///
    /// On success the tokens replace whatever session was active before and
    /// the state moves to [`UserState::SignedIn`].
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<()> {
        debug!("signing in {username}");
        let tokens = self.user_pool.sign_in(username, password).await?;
        let username = tokens.username().to_string();

        self.tokens.set_tokens(tokens);
        self.credentials.clear();
        self.identity.clear_authenticated();
        info!("signed in {username}");
        self.session.transition(
            UserState::SignedIn,
            StateInfo::from([(INFO_USERNAME.to_string(), username)]),
        );
        Ok(())
    }

    /// Sign the current user out.
    ///
    /// Tokens, cached credentials and the authenticated identity are dropped.
    /// The unauthenticated identity is kept.
    pub fn sign_out(&self) {
        let username = self.username();
        self.tokens.clear();
        self.credentials.clear();
        self.identity.clear_authenticated();

        let mut info = StateInfo::new();
        if let Some(username) = username {
            info!("signed out {username}");
            info.insert(INFO_USERNAME.to_string(), username);
        }
        self.session.transition(UserState::SignedOut, info);
    }

    /// Whether a user is signed in.
    pub fn is_signed_in(&self) -> bool {
        self.session.current().is_signed_in()
    }

    /// Current session state.
    pub fn current_user_state(&self) -> UserState {
        self.session.current()
    }

    /// Username of the signed-in user.
    pub fn username(&self) -> Option<String> {
        self.tokens
            .get_current_tokens()
            .map(|v| v.username().to_string())
    }

    /// Tokens of the signed-in user as stored, without refreshing them.
    pub fn current_tokens(&self) -> Option<TokenSet> {
        self.tokens.get_current_tokens()
    }

    /// Get user pool tokens, refreshing them if needed.
    pub async fn get_tokens(&self) -> Result<TokenSet> {
        self.tokens.get_tokens().await
    }

    /// Get temporary AWS credentials for the current session.
    pub async fn get_aws_credentials(&self) -> Result<Credentials> {
        self.credentials.get_credentials().await
    }

    /// Identity id resolved most recently, without calling upstream.
    pub fn identity_id(&self) -> Option<String> {
        self.identity.identity_id()
    }

    /// Resolve the identity id of the current session.
    pub async fn get_identity_id(&self) -> Result<String> {
        let tokens = match self.tokens.get_current_tokens() {
            Some(_) => Some(self.tokens.get_tokens().await?),
            None => None,
        };
        let identity = self.identity.resolve_identity(tokens.as_ref()).await?;
        Ok(identity.id().to_string())
    }

    /// Register a session state listener for `owner`.
    pub fn add_user_state_listener(
        &self,
        owner: impl Into<String>,
        listener: impl Fn(UserState, &StateInfo) + Send + Sync + 'static,
    ) {
        self.session.add_listener(owner, listener)
    }

    /// Remove the session state listener of `owner`.
    pub fn remove_user_state_listener(&self, owner: &str) -> bool {
        self.session.remove_listener(owner)
    }

    /// Get credentials allowed to perform `mode` on the object `key`.
    ///
    /// Keys that need a signed-in user fail with `ErrorKind::ClientError`
    /// before any upstream call is made.
    pub async fn authorize_object_access(&self, key: &str, mode: AccessMode) -> Result<Credentials> {
        let object = ObjectKey::parse(key);
        if object.requires_sign_in(mode) && !self.is_signed_in() {
            return Err(Error::client_error(format!(
                "{key} needs a signed-in user"
            )));
        }

        let (identity, credentials) = self.credentials.vend().await?;
        object.check(mode, &identity)?;
        Ok(credentials)
    }
}

#[async_trait]
impl ProvideCredential for MobileClient {
    type Credential = Credentials;

    async fn provide_credential(&self) -> Result<Self::Credential> {
        self.get_aws_credentials().await
    }
}
