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

use super::{create_test_context, create_test_context_with_env};
use mobileauth_cognito::Config;
use mobileauth_core::ErrorKind;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

fn testdata(name: &str) -> String {
    format!("{}/testdata/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[tokio::test]
async fn test_from_file() {
    let ctx = create_test_context();

    let cfg = Config::new()
        .from_file(&ctx, &testdata("awsconfiguration.json"))
        .await
        .expect("testdata must load");

    assert_eq!(cfg.region.as_deref(), Some("us-east-1"));
    assert_eq!(
        cfg.identity_pool_id.as_deref(),
        Some("us-east-1:3b6f1a2e-5c4d-4e8f-9a0b-1c2d3e4f5a6b")
    );
    assert_eq!(cfg.user_pool_id.as_deref(), Some("us-east-1_AbCdEfGhI"));
    assert_eq!(cfg.app_client_id.as_deref(), Some("6p5gbv9ufq3kl0a1b2c3d4e5f6"));
    assert!(cfg.validate().is_ok());
}

#[tokio::test]
async fn test_load_with_env_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "CredentialsProvider": {{
                "CognitoIdentity": {{
                    "Default": {{ "PoolId": "eu-west-1:pool", "Region": "eu-west-1" }}
                }}
            }}
        }}"#
    )
    .unwrap();

    let ctx = create_test_context_with_env(HashMap::from_iter([
        (
            "MOBILEAUTH_CONFIG_FILE".to_string(),
            file.path().to_string_lossy().to_string(),
        ),
        ("AWS_REGION".to_string(), "eu-central-1".to_string()),
        (
            "MOBILEAUTH_TOKEN_REFRESH_MARGIN_SECS".to_string(),
            "10".to_string(),
        ),
    ]));

    let cfg = Config::load(&ctx).await.expect("config must load");
    assert_eq!(cfg.identity_pool_id.as_deref(), Some("eu-west-1:pool"));
    assert_eq!(cfg.region.as_deref(), Some("eu-central-1"));
    assert_eq!(cfg.user_pool_id, None);
    assert_eq!(cfg.token_refresh_margin, Duration::from_secs(10));
}

#[tokio::test]
async fn test_load_missing_file() {
    let ctx = create_test_context_with_env(HashMap::from_iter([(
        "MOBILEAUTH_CONFIG_FILE".to_string(),
        testdata("not_exist.json"),
    )]));

    let err = Config::load(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}

#[tokio::test]
async fn test_load_requires_identity_pool() {
    let ctx = create_test_context_with_env(HashMap::from_iter([(
        "AWS_REGION".to_string(),
        "us-east-1".to_string(),
    )]));

    let err = Config::load(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}
