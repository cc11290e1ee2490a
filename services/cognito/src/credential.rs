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

use mobileauth_core::time::DateTime;
use mobileauth_core::utils::Redact;
use mobileauth_core::Expiring;
use std::fmt::{Debug, Formatter};

/// Temporary AWS credentials vended for one identity.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key id for aws services.
    pub access_key_id: String,
    /// Secret access key for aws services.
    pub secret_access_key: String,
    /// Session token for aws services.
    pub session_token: String,
    /// Expiration time for this credential.
    pub expiration: DateTime,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("session_token", &Redact::from(&self.session_token))
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl Expiring for Credentials {
    fn expires_at(&self) -> DateTime {
        self.expiration
    }
}

/// Identity the credentials are bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    id: String,
    is_authenticated: bool,
}

impl Identity {
    /// Identity of a signed-in user.
    pub fn authenticated(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_authenticated: true,
        }
    }

    /// Identity of the device when nobody is signed in.
    pub fn unauthenticated(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_authenticated: false,
        }
    }

    /// Identity id, like `us-east-1:3a7e9c52-...`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this identity belongs to a signed-in user.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }
}
