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

use crate::constants::*;
use log::{debug, warn};
use mobileauth_core::{Context, Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Config carries all the configuration for the mobile client.
#[derive(Clone, Debug)]
pub struct Config {
    /// Region of the identity pool.
    pub region: Option<String>,
    /// Cognito identity pool id, like `us-east-1:12345678-1234-1234-1234-123456789012`.
    pub identity_pool_id: Option<String>,
    /// User pool id, like `us-east-1_AbCdEfGhI`.
    pub user_pool_id: Option<String>,
    /// App client id registered in the user pool.
    pub app_client_id: Option<String>,
    /// Whether credentials may be vended to users that are not signed in.
    pub allow_unauthenticated_identities: bool,
    /// Cached credentials are refreshed once they expire within this margin.
    pub credentials_refresh_margin: Duration,
    /// Tokens are refreshed once they expire within this margin.
    pub token_refresh_margin: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            identity_pool_id: None,
            user_pool_id: None,
            app_client_id: None,
            allow_unauthenticated_identities: true,
            credentials_refresh_margin: Duration::from_secs(
                DEFAULT_CREDENTIALS_REFRESH_MARGIN_SECS,
            ),
            token_refresh_margin: Duration::from_secs(DEFAULT_TOKEN_REFRESH_MARGIN_SECS),
        }
    }
}

impl Config {
    /// Create a new config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the identity pool id.
    pub fn with_identity_pool_id(mut self, pool_id: impl Into<String>) -> Self {
        self.identity_pool_id = Some(pool_id.into());
        self
    }

    /// Set the user pool id.
    pub fn with_user_pool_id(mut self, pool_id: impl Into<String>) -> Self {
        self.user_pool_id = Some(pool_id.into());
        self
    }

    /// Set the app client id.
    pub fn with_app_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.app_client_id = Some(client_id.into());
        self
    }

    /// Allow or forbid credentials for users that are not signed in.
    pub fn with_allow_unauthenticated_identities(mut self, allow: bool) -> Self {
        self.allow_unauthenticated_identities = allow;
        self
    }

    /// Set the credentials refresh margin.
    pub fn with_credentials_refresh_margin(mut self, margin: Duration) -> Self {
        self.credentials_refresh_margin = margin;
        self
    }

    /// Set the token refresh margin.
    pub fn with_token_refresh_margin(mut self, margin: Duration) -> Self {
        self.token_refresh_margin = margin;
        self
    }

    /// Overlay values from environment variables.
    #[allow(clippy::wrong_self_convention)]
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();

        if let Some(v) = envs.get(AWS_REGION) {
            self.region = Some(v.clone());
        }
        if let Some(v) = envs.get(MOBILEAUTH_IDENTITY_POOL_ID) {
            self.identity_pool_id = Some(v.clone());
        }
        if let Some(v) = envs.get(MOBILEAUTH_USER_POOL_ID) {
            self.user_pool_id = Some(v.clone());
        }
        if let Some(v) = envs.get(MOBILEAUTH_APP_CLIENT_ID) {
            self.app_client_id = Some(v.clone());
        }
        if let Some(v) = envs.get(MOBILEAUTH_ALLOW_UNAUTHENTICATED) {
            match parse_bool(v) {
                Some(allow) => self.allow_unauthenticated_identities = allow,
                None => warn!("ignoring invalid {MOBILEAUTH_ALLOW_UNAUTHENTICATED}: {v}"),
            }
        }
        if let Some(v) = envs.get(MOBILEAUTH_CREDENTIALS_REFRESH_MARGIN_SECS) {
            match v.parse::<u64>() {
                Ok(secs) => self.credentials_refresh_margin = Duration::from_secs(secs),
                Err(_) => warn!("ignoring invalid {MOBILEAUTH_CREDENTIALS_REFRESH_MARGIN_SECS}: {v}"),
            }
        }
        if let Some(v) = envs.get(MOBILEAUTH_TOKEN_REFRESH_MARGIN_SECS) {
            match v.parse::<u64>() {
                Ok(secs) => self.token_refresh_margin = Duration::from_secs(secs),
                Err(_) => warn!("ignoring invalid {MOBILEAUTH_TOKEN_REFRESH_MARGIN_SECS}: {v}"),
            }
        }

        self
    }

    /// Overlay values from an `awsconfiguration.json` file.
    ///
    /// Only the `Default` entries of `CredentialsProvider.CognitoIdentity` and
    /// `CognitoUserPool` are read; everything else in the file is ignored.
    #[allow(clippy::wrong_self_convention)]
    pub async fn from_file(mut self, ctx: &Context, path: &str) -> Result<Self> {
        let path = ctx
            .expand_home_dir(path)
            .ok_or_else(|| Error::config_invalid(format!("cannot expand home dir in {path}")))?;
        let content = ctx.file_read(&path).await?;
        let file: AwsConfiguration = serde_json::from_slice(&content).map_err(|e| {
            Error::config_invalid(format!("failed to parse {path}")).with_source(e)
        })?;
        debug!("loaded client configuration from {path}");

        if let Some(pool) = file
            .credentials_provider
            .and_then(|v| v.cognito_identity)
            .and_then(|v| v.default)
        {
            self.identity_pool_id = Some(pool.pool_id);
            self.region = Some(pool.region);
        }

        if let Some(pool) = file.cognito_user_pool.and_then(|v| v.default) {
            self.user_pool_id = Some(pool.pool_id);
            if pool.app_client_id.is_some() {
                self.app_client_id = pool.app_client_id;
            }
            if self.region.is_none() {
                self.region = pool.region;
            }
        }

        Ok(self)
    }

    /// Load the config the way an application does at startup.
    ///
    /// The file named by `MOBILEAUTH_CONFIG_FILE` is read first if set, then
    /// environment variables override individual values.
    pub async fn load(ctx: &Context) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(path) = ctx.env_var(MOBILEAUTH_CONFIG_FILE) {
            cfg = cfg.from_file(ctx, &path).await?;
        }
        let cfg = cfg.from_env(ctx);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the config carries what credential vending needs.
    pub fn validate(&self) -> Result<()> {
        if self.identity_pool_id.as_deref().unwrap_or_default().is_empty() {
            return Err(Error::config_invalid("identity_pool_id is required"));
        }
        if self.region.as_deref().unwrap_or_default().is_empty() {
            return Err(Error::config_invalid("region is required"));
        }
        Ok(())
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwsConfiguration {
    #[serde(default)]
    credentials_provider: Option<CredentialsProviderSection>,
    #[serde(default)]
    cognito_user_pool: Option<Named<UserPoolEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialsProviderSection {
    #[serde(default)]
    cognito_identity: Option<Named<IdentityPoolEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Named<T> {
    default: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IdentityPoolEntry {
    pool_id: String,
    region: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserPoolEntry {
    pool_id: String,
    #[serde(default)]
    app_client_id: Option<String>,
    #[serde(default)]
    region: Option<String>,
}
