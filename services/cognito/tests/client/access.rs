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

use super::create_test_client;
use super::mock::{identity_of, PASSWORD};
use mobileauth_cognito::AccessMode;
use mobileauth_core::ErrorKind;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_signed_out_upload_is_a_client_error() {
    let t = create_test_client();

    for (key, mode) in [
        ("private/us-east-1:alice/photo.png", AccessMode::Write),
        ("private/us-east-1:alice/photo.png", AccessMode::Read),
        ("protected/us-east-1:alice/photo.png", AccessMode::Write),
    ] {
        let err = t
            .client
            .authorize_object_access(key, mode)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClientError, "{key} {mode:?}");
    }
    assert_eq!(t.federated.exchange_calls(), 0);
}

#[tokio::test]
async fn test_signed_out_public_access() {
    let t = create_test_client();

    assert!(t
        .client
        .authorize_object_access("public/photo.png", AccessMode::Write)
        .await
        .is_ok());
    assert!(t
        .client
        .authorize_object_access("protected/us-east-1:alice/photo.png", AccessMode::Read)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_owner_access() {
    let t = create_test_client();
    t.client.sign_in("alice", PASSWORD).await.unwrap();

    let own = format!("private/{}/photo.png", identity_of("alice"));
    let other = format!("private/{}/photo.png", identity_of("bob"));

    assert!(t
        .client
        .authorize_object_access(&own, AccessMode::Write)
        .await
        .is_ok());
    let err = t
        .client
        .authorize_object_access(&other, AccessMode::Read)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClientError);

    let err = t
        .client
        .authorize_object_access("private/photo.png", AccessMode::Read)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClientError);
}
