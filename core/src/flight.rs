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

//! Broadcast-once primitive used to coalesce concurrent upstream calls.
//!
//! A [`Flight`] is the waiting side of one in-flight call. It can be cloned
//! freely; every clone resolves to the same result once the matching
//! [`Landing`] is completed. Dropping a `Flight` only stops that waiter from
//! listening, the call itself keeps running for everyone else.

use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

type Outcome<T> = Option<std::result::Result<T, Arc<Error>>>;

static NEXT_FLIGHT_ID: AtomicU64 = AtomicU64::new(1);

/// Start a new flight, returning the completing side and the waiting side.
pub fn flight<T>() -> (Landing<T>, Flight<T>) {
    let id = NEXT_FLIGHT_ID.fetch_add(1, Ordering::Relaxed);
    let (tx, rx) = watch::channel(None);
    (Landing { id, tx }, Flight { id, rx })
}

/// Waiting side of an in-flight call.
#[derive(Debug)]
pub struct Flight<T> {
    id: u64,
    rx: watch::Receiver<Outcome<T>>,
}

impl<T> Clone for Flight<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            rx: self.rx.clone(),
        }
    }
}

impl<T: Clone> Flight<T> {
    /// Process-unique id of this flight.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the result is already available.
    pub fn is_landed(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for the shared result.
    pub async fn wait(mut self) -> Result<T> {
        let outcome = self
            .rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| Error::unexpected("in-flight request was dropped before completing"))?;

        match &*outcome {
            Some(Ok(v)) => Ok(v.clone()),
            Some(Err(err)) => Err(Error::from_shared(err)),
            None => Err(Error::unexpected("in-flight request completed without result")),
        }
    }
}

/// Completing side of an in-flight call.
#[derive(Debug)]
pub struct Landing<T> {
    id: u64,
    tx: watch::Sender<Outcome<T>>,
}

impl<T> Landing<T> {
    /// Process-unique id of this flight, same as the paired [`Flight::id`].
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Publish the result to every current and future waiter.
    pub fn land(self, result: Result<T>) {
        self.tx.send_replace(Some(result.map_err(Arc::new)));
    }

    /// Wrap this landing so that `on_abort` runs if it is dropped unlanded.
    ///
    /// `on_abort` receives the flight id and runs before waiters are woken
    /// with an error, so it can clear whatever pointed callers at this flight.
    pub fn guard<F: FnOnce(u64)>(self, on_abort: F) -> GuardedLanding<T, F> {
        GuardedLanding {
            id: self.id,
            landing: Some(self),
            on_abort: Some(on_abort),
        }
    }
}

/// A [`Landing`] owned by a spawned call, see [`Landing::guard`].
pub struct GuardedLanding<T, F: FnOnce(u64)> {
    id: u64,
    landing: Option<Landing<T>>,
    on_abort: Option<F>,
}

impl<T, F: FnOnce(u64)> GuardedLanding<T, F> {
    /// Process-unique id of the guarded flight.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Publish the result, `on_abort` will not run.
    pub fn land(mut self, result: Result<T>) {
        self.on_abort = None;
        if let Some(landing) = self.landing.take() {
            landing.land(result);
        }
    }
}

impl<T, F: FnOnce(u64)> Drop for GuardedLanding<T, F> {
    fn drop(&mut self) {
        if let Some(on_abort) = self.on_abort.take() {
            on_abort(self.id);
        }
        // Waiters see the flight fail once the landing goes.
        self.landing = None;
    }
}
