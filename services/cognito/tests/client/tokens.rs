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

use super::mock::PASSWORD;
use super::{create_test_client, record_states};
use mobileauth_cognito::UserState;
use mobileauth_core::{ErrorKind, Expiring};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::test]
async fn test_get_tokens_requires_sign_in() {
    let t = create_test_client();

    let err = t.client.get_tokens().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClientError);
    assert_eq!(t.user_pool.refresh_calls(), 0);
}

#[tokio::test]
async fn test_fresh_tokens_are_not_refreshed() {
    let t = create_test_client();
    t.client.sign_in("alice", PASSWORD).await.unwrap();

    let tokens = t.client.get_tokens().await.unwrap();
    assert_eq!(tokens.username(), "alice");
    assert!(tokens.id_token().is_some());
    assert_eq!(t.user_pool.refresh_calls(), 0);
}

#[tokio::test]
async fn test_stale_tokens_refresh_once_for_all_callers() {
    let t = create_test_client();
    // Inside the 60s refresh margin straight away.
    t.user_pool.set_token_ttl(Duration::from_secs(30));
    t.client.sign_in("alice", PASSWORD).await.unwrap();
    let stale = t.client.current_tokens().expect("signed in");

    t.user_pool.set_token_ttl(Duration::from_secs(3600));
    t.user_pool.set_delay(Duration::from_millis(50));

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let client = t.client.clone();
            tokio::spawn(async move { client.get_tokens().await })
        })
        .collect();
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().expect("refresh must succeed"));
    }

    assert_eq!(t.user_pool.refresh_calls(), 1);
    assert!(results.iter().all(|v| *v == results[0]));

    let fresh = &results[0];
    assert_ne!(fresh.id_token(), stale.id_token());
    assert!(fresh.access_token().unwrap().is_fresh(Duration::from_secs(60)));
    // The refresh response carries no refresh token, the old one is kept.
    assert_eq!(fresh.refresh_token(), stale.refresh_token());

    // Stored, so the next call does not refresh again.
    t.client.get_tokens().await.unwrap();
    assert_eq!(t.user_pool.refresh_calls(), 1);
}

#[tokio::test]
async fn test_revoked_refresh_token_invalidates_session() {
    let t = create_test_client();
    let states = record_states(&t.client);
    t.user_pool.set_token_ttl(Duration::from_secs(30));

    t.client.sign_in("alice", PASSWORD).await.unwrap();
    let before = t.client.get_aws_credentials().await.unwrap();

    t.user_pool.revoke("alice");
    let err = t.client.get_tokens().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TokenInvalid);
    assert_eq!(
        t.client.current_user_state(),
        UserState::SignedOutUserPoolsTokenInvalid
    );
    assert!(!t.client.is_signed_in());
    assert_eq!(t.client.username(), None);
    assert_eq!(
        states.lock().unwrap().last().cloned(),
        Some((
            UserState::SignedOutUserPoolsTokenInvalid,
            Some("alice".to_string())
        ))
    );

    t.user_pool.set_token_ttl(Duration::from_secs(3600));
    t.client.sign_in("bob", PASSWORD).await.unwrap();
    let after = t.client.get_aws_credentials().await.unwrap();

    assert_eq!(t.client.current_user_state(), UserState::SignedIn);
    assert_ne!(before.access_key_id, after.access_key_id);
}

#[tokio::test]
async fn test_listener_signs_in_again_after_invalid_token() {
    let t = create_test_client();
    t.user_pool.set_token_ttl(Duration::from_secs(30));
    t.client.sign_in("alice", PASSWORD).await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    {
        let client = t.client.clone();
        t.client.add_user_state_listener("resignin", move |state, _| {
            let _ = tx.send(state);
            if state == UserState::SignedOutUserPoolsTokenInvalid {
                let client = client.clone();
                tokio::spawn(async move { client.sign_in("bob", PASSWORD).await });
            }
        });
    }

    t.user_pool.revoke("alice");
    assert!(t.client.get_tokens().await.is_err());

    assert_eq!(
        rx.recv().await,
        Some(UserState::SignedOutUserPoolsTokenInvalid)
    );
    assert_eq!(rx.recv().await, Some(UserState::SignedIn));
    assert_eq!(t.client.username().as_deref(), Some("bob"));
    t.client.remove_user_state_listener("resignin");
}

#[tokio::test]
async fn test_abandoned_refresh_still_completes() {
    let t = create_test_client();
    t.user_pool.set_token_ttl(Duration::from_secs(30));
    t.client.sign_in("alice", PASSWORD).await.unwrap();

    t.user_pool.set_token_ttl(Duration::from_secs(3600));
    t.user_pool.set_delay(Duration::from_millis(200));
    let abandoned = tokio::time::timeout(Duration::from_millis(20), t.client.get_tokens()).await;
    assert!(abandoned.is_err());

    // The refresh keeps running without the caller that started it.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(t.user_pool.refresh_calls(), 1);
    let stored = t.client.current_tokens().expect("still signed in");
    assert!(stored.is_fresh(Duration::from_secs(60)));
    assert_eq!(t.client.current_user_state(), UserState::SignedIn);
}

#[tokio::test]
async fn test_panicking_refresh_does_not_block_later_callers() {
    let t = create_test_client();
    t.user_pool.set_token_ttl(Duration::from_secs(30));
    t.client.sign_in("alice", PASSWORD).await.unwrap();

    t.user_pool.set_token_ttl(Duration::from_secs(3600));
    t.user_pool.panic_on_next_refresh();
    let err = t.client.get_tokens().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unexpected);
    assert_eq!(t.client.current_user_state(), UserState::SignedIn);

    let tokens = t.client.get_tokens().await.unwrap();
    assert!(tokens.is_fresh(Duration::from_secs(60)));
    assert_eq!(t.user_pool.refresh_calls(), 2);
}
