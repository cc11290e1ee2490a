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

//! Access policy for object keys handed to the transfer layer.
//!
//! Object keys follow the usual mobile storage layout:
//!
//! - `public/...`: readable and writable by everyone, including guests.
//! - `protected/{identity_id}/...`: readable by everyone, writable by the owner.
//! - `private/{identity_id}/...`: readable and writable by the owner only.
//!
//! Keys outside these prefixes only need valid credentials.

use crate::constants::{PRIVATE_PREFIX, PROTECTED_PREFIX, PUBLIC_PREFIX};
use crate::Identity;
use mobileauth_core::{Error, Result};

/// What the transfer layer is about to do with an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Download or head the object.
    Read,
    /// Upload, overwrite or delete the object.
    Write,
}

/// Access level encoded in the first segment of an object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// `public/` keys and keys without a known prefix.
    Public,
    /// `protected/{identity_id}/` keys.
    Protected,
    /// `private/{identity_id}/` keys.
    Private,
}

/// An object key split into its access level and owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectKey<'a> {
    level: AccessLevel,
    owner: Option<&'a str>,
}

impl<'a> ObjectKey<'a> {
    /// Parse `key`.
    pub fn parse(key: &'a str) -> Self {
        let mut segments = key.splitn(3, '/');
        let level = match segments.next() {
            Some(PRIVATE_PREFIX) => AccessLevel::Private,
            Some(PROTECTED_PREFIX) => AccessLevel::Protected,
            Some(PUBLIC_PREFIX) => AccessLevel::Public,
            _ => AccessLevel::Public,
        };
        let owner = match level {
            AccessLevel::Public => None,
            // The owner segment only counts if something follows it.
            _ => match (segments.next(), segments.next()) {
                (Some(owner), Some(rest)) if !owner.is_empty() && !rest.is_empty() => Some(owner),
                _ => None,
            },
        };

        Self { level, owner }
    }

    /// Access level of the key.
    pub fn level(&self) -> AccessLevel {
        self.level
    }

    /// Identity id owning the key, if the key is owned.
    pub fn owner(&self) -> Option<&'a str> {
        self.owner
    }

    /// Whether `mode` on this key needs a signed-in user.
    pub fn requires_sign_in(&self, mode: AccessMode) -> bool {
        match self.level {
            AccessLevel::Public => false,
            AccessLevel::Protected => mode == AccessMode::Write,
            AccessLevel::Private => true,
        }
    }

    /// Check `identity` may perform `mode` on this key.
    pub fn check(&self, mode: AccessMode, identity: &Identity) -> Result<()> {
        if !self.requires_sign_in(mode) {
            return Ok(());
        }
        if !identity.is_authenticated() {
            return Err(Error::client_error(
                "signed-out users cannot access protected or private objects",
            ));
        }
        match self.owner {
            Some(owner) if owner == identity.id() => Ok(()),
            Some(owner) => Err(Error::client_error(format!(
                "object belongs to identity {owner}, not {}",
                identity.id()
            ))),
            None => Err(Error::client_error(
                "object key must include the owning identity id",
            )),
        }
    }
}
