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

use crate::time::{is_before_margin, DateTime};
use crate::Result;
use std::fmt::Debug;
use std::time::Duration;

/// Expiring is implemented by every short-lived secret the client caches.
pub trait Expiring: Clone + Debug + Send + Sync + Unpin + 'static {
    /// The instant after which this value must not be used.
    fn expires_at(&self) -> DateTime;

    /// Check if the value is still usable with `margin` to spare.
    fn is_fresh(&self, margin: Duration) -> bool {
        is_before_margin(self.expires_at(), margin)
    }
}

/// ProvideCredential is the seam a transfer layer uses to obtain credentials.
///
/// The transfer layer never inspects the session. It asks for credentials
/// every time it signs a request and relies on the provider to cache and
/// refresh them.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + 'static {
    /// Credential returned by this provider.
    type Credential: Send + Sync + Unpin + 'static;

    /// Provide a credential that is valid right now.
    async fn provide_credential(&self) -> Result<Self::Credential>;
}
