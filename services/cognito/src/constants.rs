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

// Env values used by the client configuration.
pub const MOBILEAUTH_CONFIG_FILE: &str = "MOBILEAUTH_CONFIG_FILE";
pub const AWS_REGION: &str = "AWS_REGION";
pub const MOBILEAUTH_IDENTITY_POOL_ID: &str = "MOBILEAUTH_IDENTITY_POOL_ID";
pub const MOBILEAUTH_USER_POOL_ID: &str = "MOBILEAUTH_USER_POOL_ID";
pub const MOBILEAUTH_APP_CLIENT_ID: &str = "MOBILEAUTH_APP_CLIENT_ID";
pub const MOBILEAUTH_ALLOW_UNAUTHENTICATED: &str = "MOBILEAUTH_ALLOW_UNAUTHENTICATED";
pub const MOBILEAUTH_CREDENTIALS_REFRESH_MARGIN_SECS: &str =
    "MOBILEAUTH_CREDENTIALS_REFRESH_MARGIN_SECS";
pub const MOBILEAUTH_TOKEN_REFRESH_MARGIN_SECS: &str = "MOBILEAUTH_TOKEN_REFRESH_MARGIN_SECS";

// Defaults
pub const DEFAULT_CREDENTIALS_REFRESH_MARGIN_SECS: u64 = 120;
pub const DEFAULT_TOKEN_REFRESH_MARGIN_SECS: u64 = 60;

// Keys of the info map passed to user state listeners.
pub const INFO_USERNAME: &str = "username";
pub const INFO_REASON: &str = "reason";

// Object key prefixes understood by the access policy.
pub const PUBLIC_PREFIX: &str = "public";
pub const PROTECTED_PREFIX: &str = "protected";
pub const PRIVATE_PREFIX: &str = "private";
