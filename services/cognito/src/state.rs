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

use log::{debug, info, warn};
use std::collections::{HashMap, VecDeque};
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, ThreadId};

/// Coarse lifecycle phase of the current user's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserState {
    /// Nobody is signed in.
    SignedOut,
    /// A user is signed in with valid user pool tokens.
    SignedIn,
    /// The user pool rejected the refresh token; the user must sign in again.
    SignedOutUserPoolsTokenInvalid,
    /// The identity provider rejected the user's tokens.
    SignedOutFederatedTokensInvalid,
}

impl UserState {
    /// Whether a user is signed in.
    pub fn is_signed_in(self) -> bool {
        self == UserState::SignedIn
    }

    fn can_transition_to(self, next: UserState) -> bool {
        use UserState::*;

        match (self, next) {
            (_, SignedOut) => true,
            (SignedOut, SignedIn) => true,
            (SignedIn, SignedOutUserPoolsTokenInvalid) => true,
            (SignedIn, SignedOutFederatedTokensInvalid) => true,
            (SignedOutUserPoolsTokenInvalid, SignedIn) => true,
            (SignedOutFederatedTokensInvalid, SignedIn) => true,
            _ => false,
        }
    }
}

impl Display for UserState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UserState::SignedOut => write!(f, "signedOut"),
            UserState::SignedIn => write!(f, "signedIn"),
            UserState::SignedOutUserPoolsTokenInvalid => write!(f, "signedOutUserPoolsTokenInvalid"),
            UserState::SignedOutFederatedTokensInvalid => {
                write!(f, "signedOutFederatedTokensInvalid")
            }
        }
    }
}

/// Extra details passed along with a transition, like the username.
pub type StateInfo = HashMap<String, String>;

type Listener = Arc<dyn Fn(UserState, &StateInfo) + Send + Sync>;

/// SessionStateMachine tracks the current [`UserState`] and notifies listeners.
///
/// Listeners run outside the internal lock, in registration order, exactly
/// once per effective transition. Only one thread notifies listeners at a
/// time, so listeners always observe transitions one at a time.
pub struct SessionStateMachine {
    inner: Mutex<Inner>,
    idle: Condvar,
}

struct Inner {
    state: UserState,
    listeners: Vec<(String, Listener)>,
    queue: VecDeque<(UserState, StateInfo)>,
    dispatcher: Option<ThreadId>,
}

impl Debug for SessionStateMachine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().expect("lock poisoned");
        f.debug_struct("SessionStateMachine")
            .field("state", &inner.state)
            .field("listeners", &inner.listeners.len())
            .field("queued", &inner.queue.len())
            .finish()
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    /// Create a state machine in [`UserState::SignedOut`].
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: UserState::SignedOut,
                listeners: Vec::new(),
                queue: VecDeque::new(),
                dispatcher: None,
            }),
            idle: Condvar::new(),
        }
    }

    /// Current state.
    pub fn current(&self) -> UserState {
        self.inner.lock().expect("lock poisoned").state
    }

    /// Register `listener` for `owner`.
    ///
    /// Registering the same owner again replaces its listener in place.
    pub fn add_listener(
        &self,
        owner: impl Into<String>,
        listener: impl Fn(UserState, &StateInfo) + Send + Sync + 'static,
    ) {
        let owner = owner.into();
        let listener: Listener = Arc::new(listener);

        let mut inner = self.inner.lock().expect("lock poisoned");
        match inner.listeners.iter_mut().find(|(o, _)| *o == owner) {
            Some((_, l)) => *l = listener,
            None => inner.listeners.push((owner, listener)),
        }
    }

    /// Remove the listener of `owner`, returns whether one was registered.
    pub fn remove_listener(&self, owner: &str) -> bool {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let before = inner.listeners.len();
        inner.listeners.retain(|(o, _)| o != owner);
        inner.listeners.len() != before
    }

    /// Request a transition to `next`.
    ///
    /// Re-applying the current state is a no-op. Transitions that make no
    /// sense from the state they are applied to (for example reporting an
    /// invalid refresh token after the user already signed out) are dropped.
    ///
    /// When this returns, the transition has been applied and every listener
    /// has been notified. The one exception is a call made from a listener:
    /// it is queued and applied once the running notification round
    /// finishes. Calls from other threads wait for that round first.
    pub fn transition(&self, next: UserState, info: StateInfo) {
        let me = thread::current().id();
        let mut inner = self.inner.lock().expect("lock poisoned");
        if inner.dispatcher == Some(me) {
            debug!("user state transition to {next} queued");
            inner.queue.push_back((next, info));
            return;
        }
        while inner.dispatcher.is_some() {
            inner = self.idle.wait(inner).expect("lock poisoned");
        }
        inner.queue.push_back((next, info));
        inner.dispatcher = Some(me);
        let _guard = DispatchGuard(self);

        while let Some((next, info)) = inner.queue.pop_front() {
            let prev = inner.state;
            if prev == next {
                debug!("user state already {next}, skipping");
                continue;
            }
            if !prev.can_transition_to(next) {
                warn!("ignoring user state transition from {prev} to {next}");
                continue;
            }

            inner.state = next;
            info!("user state changed from {prev} to {next}");
            let listeners: Vec<Listener> = inner.listeners.iter().map(|(_, l)| l.clone()).collect();
            drop(inner);

            for listener in listeners {
                listener(next, &info);
            }

            inner = self.inner.lock().expect("lock poisoned");
        }

        inner.dispatcher = None;
        drop(inner);
        self.idle.notify_all();
    }
}

/// Releases the dispatcher if a listener panics, so other threads do not
/// wait forever.
struct DispatchGuard<'a>(&'a SessionStateMachine);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if !thread::panicking() {
            return;
        }
        if let Ok(mut inner) = self.0.inner.lock() {
            inner.dispatcher = None;
            inner.queue.clear();
        }
        self.0.idle.notify_all();
    }
}
