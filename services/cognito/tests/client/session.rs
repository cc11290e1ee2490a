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

use super::mock::{identity_of, GUEST_IDENTITY, PASSWORD};
use super::{create_test_client, record_states};
use mobileauth_cognito::{AccessMode, UserState};
use mobileauth_core::ErrorKind;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

#[tokio::test]
async fn test_sign_in_and_out() {
    let t = create_test_client();
    let states = record_states(&t.client);
    assert_eq!(t.client.current_user_state(), UserState::SignedOut);

    t.client.sign_in("alice", "correct horse").await.unwrap();
    assert!(t.client.is_signed_in());
    assert_eq!(t.client.username().as_deref(), Some("alice"));

    t.client.sign_out();
    assert!(!t.client.is_signed_in());
    assert_eq!(t.client.username(), None);

    assert_eq!(
        *states.lock().unwrap(),
        vec![
            (UserState::SignedIn, Some("alice".to_string())),
            (UserState::SignedOut, Some("alice".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_wrong_password_keeps_user_signed_out() {
    let t = create_test_client();
    let states = record_states(&t.client);

    let err = t.client.sign_in("alice", "hunter2").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClientError);
    assert_eq!(t.client.current_user_state(), UserState::SignedOut);
    assert!(states.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_transitions_notify_once() {
    let t = create_test_client();
    let states = record_states(&t.client);

    t.client.sign_out();
    t.client.sign_in("alice", PASSWORD).await.unwrap();
    t.client.sign_in("alice", PASSWORD).await.unwrap();
    t.client.sign_out();
    t.client.sign_out();

    let seen: Vec<_> = states.lock().unwrap().iter().map(|(s, _)| *s).collect();
    assert_eq!(seen, vec![UserState::SignedIn, UserState::SignedOut]);
    assert_eq!(t.user_pool.sign_in_calls(), 2);
}

#[tokio::test]
async fn test_removed_listener_is_not_notified() {
    let t = create_test_client();
    let states = record_states(&t.client);

    assert!(t.client.remove_user_state_listener("recorder"));
    assert!(!t.client.remove_user_state_listener("recorder"));
    t.client.sign_in("alice", PASSWORD).await.unwrap();

    assert!(states.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_identity_follows_session() {
    let t = create_test_client();
    assert_eq!(t.client.identity_id(), None);

    assert_eq!(t.client.get_identity_id().await.unwrap(), GUEST_IDENTITY);
    assert_eq!(t.client.identity_id().as_deref(), Some(GUEST_IDENTITY));

    t.client.sign_in("alice", PASSWORD).await.unwrap();
    assert_eq!(t.client.get_identity_id().await.unwrap(), identity_of("alice"));

    t.client.sign_out();
    assert_eq!(t.client.identity_id().as_deref(), Some(GUEST_IDENTITY));

    t.client.sign_in("bob", PASSWORD).await.unwrap();
    assert_eq!(t.client.get_identity_id().await.unwrap(), identity_of("bob"));
    // Guest, alice and bob, each resolved once.
    assert_eq!(t.federated.identity_calls(), 3);
}

#[tokio::test]
async fn test_listener_uploads_private_object_on_sign_in() {
    let t = create_test_client();
    let (tx, mut rx) = mpsc::unbounded_channel();
    {
        let client = t.client.clone();
        t.client.add_user_state_listener("uploader", move |state, _| {
            if state != UserState::SignedIn {
                return;
            }
            let client = client.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = async {
                    let id = client.get_identity_id().await?;
                    let key = format!("private/{id}/photo.png");
                    client.authorize_object_access(&key, AccessMode::Write).await?;
                    Ok::<_, mobileauth_core::Error>(id)
                }
                .await;
                let _ = tx.send(result);
            });
        });
    }

    t.client.sign_in("alice", PASSWORD).await.unwrap();

    let id = rx.recv().await.expect("listener must report").unwrap();
    assert_eq!(id, identity_of("alice"));
    assert_eq!(t.federated.exchange_calls(), 1);
    t.client.remove_user_state_listener("uploader");
}
