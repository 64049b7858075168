use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::watch;
use tracing::trace;

type Completion<V, E> = Option<Result<V, E>>;

enum Slot<V, E> {
    Ready(V),
    InFlight(watch::Receiver<Completion<V, E>>),
}

enum Lookup<V, E> {
    Ready(V),
    Wait(watch::Receiver<Completion<V, E>>),
    Claim(watch::Sender<Completion<V, E>>),
}

/// A concurrent map whose values are computed at most once per key.
///
/// The first caller for an absent key claims it with an in-progress marker and runs the
/// initializer; concurrent callers wait for that run and share its result. Successful values
/// are memoized. Failures are handed to every waiter and then forgotten, so a later call tries
/// again. The lock is held only to read or replace a slot, never across the initializer.
pub struct SingleFlightMap<V, E> {
    slots: Mutex<HashMap<String, Slot<V, E>>>,
}

impl<V, E> Default for SingleFlightMap<V, E> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone, E: Clone> SingleFlightMap<V, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_try_init<F, Fut>(&self, key: &str, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        loop {
            match self.lookup(key) {
                Lookup::Ready(value) => return Ok(value),
                Lookup::Wait(mut receiver) => {
                    trace!(key = key, "waiting for in-flight initialization.");

                    if let Ok(completion) = receiver.wait_for(|completion| completion.is_some()).await
                    {
                        if let Some(result) = completion.clone() {
                            return result;
                        }
                    }

                    // the claimant went away without a result. the marker is already gone.
                    continue;
                }
                Lookup::Claim(sender) => {
                    let claim = Claim {
                        map: self,
                        key,
                        sender: Some(sender),
                    };

                    let result = init().await;
                    claim.complete(&result);

                    return result;
                }
            }
        }
    }

    /// Stores `value` as resolved, replacing any memoized value.
    pub fn insert_ready(&self, key: &str, value: V) {
        self.slots
            .lock()
            .unwrap()
            .insert(key.to_string(), Slot::Ready(value));
    }

    pub fn get(&self, key: &str) -> Option<V> {
        match self.slots.lock().unwrap().get(key) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn ready_len(&self) -> usize {
        self.slots
            .lock()
            .unwrap()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    fn lookup(&self, key: &str) -> Lookup<V, E> {
        let mut slots = self.slots.lock().unwrap();
        match slots.get(key) {
            Some(Slot::Ready(value)) => Lookup::Ready(value.clone()),
            Some(Slot::InFlight(receiver)) => Lookup::Wait(receiver.clone()),
            None => {
                let (sender, receiver) = watch::channel(None);
                slots.insert(key.to_string(), Slot::InFlight(receiver));
                Lookup::Claim(sender)
            }
        }
    }
}

/// Ownership of an in-progress marker.
///
/// Dropping an incomplete claim (e.g. the claiming task was cancelled) removes the marker
/// before the completion channel closes, so woken waiters retry against an empty slot.
struct Claim<'a, V, E> {
    map: &'a SingleFlightMap<V, E>,
    key: &'a str,
    sender: Option<watch::Sender<Completion<V, E>>>,
}

impl<V: Clone, E: Clone> Claim<'_, V, E> {
    fn complete(mut self, result: &Result<V, E>) {
        {
            let mut slots = self.map.slots.lock().unwrap();
            match result {
                Ok(value) => {
                    slots.insert(self.key.to_string(), Slot::Ready(value.clone()));
                }
                Err(_) => {
                    slots.remove(self.key);
                }
            }
        }

        if let Some(sender) = self.sender.take() {
            sender.send_replace(Some(result.clone()));
        }
    }
}

impl<V, E> Drop for Claim<'_, V, E> {
    fn drop(&mut self) {
        if self.sender.is_none() {
            return;
        }

        if let Ok(mut slots) = self.map.slots.lock() {
            slots.remove(self.key);
        }
        self.sender = None;
    }
}
