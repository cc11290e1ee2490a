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

//! Example walking a client through guest, signed-in and signed-out sessions

use async_trait::async_trait;
use mobileauth_cognito::{
    AccessMode, Config, Credentials, FederatedIdentity, Identity, MobileClient, Token, TokenKind,
    TokenSet, UserPool,
};
use mobileauth_core::time::{delta, now};
use mobileauth_core::{Context, Error, OsEnv, Result};
use mobileauth_file_read_tokio::TokioFileRead;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A user pool that lets everyone in with the password "demo"
#[derive(Debug)]
struct DemoUserPool;

#[async_trait]
impl UserPool for DemoUserPool {
    async fn sign_in(&self, username: &str, password: &str) -> Result<TokenSet> {
        if password != "demo" {
            return Err(Error::client_error("incorrect username or password"));
        }
        Ok(demo_tokens(username, true))
    }

    async fn refresh_tokens(&self, username: &str, _refresh_token: &Token) -> Result<TokenSet> {
        Ok(demo_tokens(username, false))
    }
}

fn demo_tokens(username: &str, with_refresh: bool) -> TokenSet {
    let issued_at = now();
    let expires_at = issued_at + delta(Duration::from_secs(3600));
    let mut tokens = TokenSet::new(username)
        .with_token(Token::new(TokenKind::Id, "id", issued_at, expires_at))
        .with_token(Token::new(TokenKind::Access, "access", issued_at, expires_at));
    if with_refresh {
        tokens = tokens.with_token(Token::new(TokenKind::Refresh, "refresh", issued_at, expires_at));
    }
    tokens
}

/// An identity pool that mints fake keys
#[derive(Debug, Default)]
struct DemoIdentityPool {
    serial: AtomicUsize,
}

#[async_trait]
impl FederatedIdentity for DemoIdentityPool {
    async fn get_identity_id(&self, tokens: Option<&TokenSet>) -> Result<String> {
        Ok(match tokens {
            Some(tokens) => format!("us-east-1:{}", tokens.username()),
            None => "us-east-1:guest".to_string(),
        })
    }

    async fn exchange(&self, identity: &Identity, _tokens: Option<&TokenSet>) -> Result<Credentials> {
        let n = self.serial.fetch_add(1, Ordering::SeqCst);
        Ok(Credentials {
            access_key_id: format!("ASIADEMO{n:08}"),
            secret_access_key: format!("secret-for-{}", identity.id()),
            session_token: format!("session-{n}"),
            expiration: now() + delta(Duration::from_secs(3600)),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();

    // Picks up MOBILEAUTH_CONFIG_FILE and friends when they are set.
    let ctx = Context::new().with_file_read(TokioFileRead).with_env(OsEnv);
    let config = Config::new()
        .with_region("us-east-1")
        .with_identity_pool_id("us-east-1:00000000-0000-0000-0000-000000000000")
        .from_env(&ctx);
    config.validate()?;

    let client = MobileClient::new(config, DemoUserPool, DemoIdentityPool::default());
    client.add_user_state_listener("example", |state, info| {
        println!("user state is now {state} {info:?}");
    });

    let guest = client.get_aws_credentials().await?;
    println!("guest credentials: {guest:?}");

    client.sign_in("alice", "demo").await?;
    let key = format!("private/{}/notes.txt", client.get_identity_id().await?);
    let cred = client.authorize_object_access(&key, AccessMode::Write).await?;
    println!("may upload {key} with {cred:?}");

    client.sign_out();
    match client.authorize_object_access(&key, AccessMode::Write).await {
        Ok(_) => println!("unexpectedly allowed to upload {key}"),
        Err(err) => println!("upload refused after sign-out: {err}"),
    }

    Ok(())
}
