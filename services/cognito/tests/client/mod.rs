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

mod access;
mod config;
mod session;
mod tokens;

use mobileauth_cognito::{Config, MobileClient, UserState};
use mobileauth_core::{Context, OsEnv, StaticEnv};
use mobileauth_file_read_tokio::TokioFileRead;
use mock::{MockFederated, MockUserPool};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub fn create_test_context() -> Context {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    Context::new().with_file_read(TokioFileRead).with_env(OsEnv)
}

pub fn create_test_context_with_env(envs: HashMap<String, String>) -> Context {
    create_test_context().with_env(StaticEnv {
        home_dir: None,
        envs,
    })
}

pub fn test_config() -> Config {
    Config::new()
        .with_region("us-east-1")
        .with_identity_pool_id("us-east-1:00000000-0000-0000-0000-000000000000")
        .with_user_pool_id("us-east-1_TestPool")
        .with_app_client_id("test-client")
}

pub struct TestClient {
    pub client: MobileClient,
    pub user_pool: MockUserPool,
    pub federated: MockFederated,
}

pub fn create_test_client() -> TestClient {
    create_test_client_with_config(test_config())
}

pub fn create_test_client_with_config(config: Config) -> TestClient {
    let _ = create_test_context();

    let user_pool = MockUserPool::default();
    let federated = MockFederated::default();
    let client = MobileClient::new(config, user_pool.clone(), federated.clone());

    TestClient {
        client,
        user_pool,
        federated,
    }
}

/// Record every state change together with the username it carried.
pub fn record_states(client: &MobileClient) -> Arc<Mutex<Vec<(UserState, Option<String>)>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client.add_user_state_listener("recorder", move |state, info| {
        sink.lock()
            .unwrap()
            .push((state, info.get("username").cloned()));
    });
    seen
}
