//! Objects whose destruction aborts the calls watching them.
//!
//! An [`Observer`] keeps an explicit list of triggers. Dropping the last
//! handle fires every trigger still registered, on whichever thread drops
//! it. A call registers one trigger per execution and unregisters it through
//! the returned [`WatchGuard`] when the execution completes.

use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Trigger = Box<dyn FnOnce() + Send + Sync>;

struct ObserverInner {
    triggers: DashMap<u64, Trigger>,
    next_id: AtomicU64,
}

impl Drop for ObserverInner {
    fn drop(&mut self) {
        let triggers = std::mem::take(&mut self.triggers);
        if !triggers.is_empty() {
            tracing::debug!(count = triggers.len(), "observer destroyed, firing triggers");
        }
        for (_, trigger) in triggers {
            trigger();
        }
    }
}

/// Owning handle to an observer. Clones share the same observer.
#[derive(Clone)]
pub struct Observer {
    inner: Arc<ObserverInner>,
}

impl Observer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ObserverInner {
                triggers: DashMap::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register `trigger` to run when the observer is destroyed.
    ///
    /// The trigger is discarded without running if the guard is released or
    /// dropped first.
    pub fn watch<F>(&self, trigger: F) -> WatchGuard
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.triggers.insert(id, Box::new(trigger));
        WatchGuard {
            observer: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Number of triggers currently registered.
    pub fn watch_count(&self) -> usize {
        self.inner.triggers.len()
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("watches", &self.watch_count())
            .finish()
    }
}

/// Registration of one trigger. Dropping it unregisters the trigger.
#[derive(Debug)]
pub struct WatchGuard {
    observer: Weak<ObserverInner>,
    id: u64,
}

impl WatchGuard {
    /// Unregister the trigger and return the observer if it is still alive.
    pub fn release(self) -> Option<Observer> {
        let inner = self.observer.upgrade()?;
        inner.triggers.remove(&self.id);
        Some(Observer { inner })
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.observer.upgrade() {
            inner.triggers.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_drop_fires_triggers_once() {
        let observer = Observer::new();
        let (count, trigger) = counter();
        let _guard = observer.watch(trigger);
        let clone = observer.clone();
        drop(observer);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        drop(clone);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_unregisters() {
        let observer = Observer::new();
        let (count, trigger) = counter();
        let guard = observer.watch(trigger);
        assert_eq!(observer.watch_count(), 1);
        assert!(guard.release().is_some());
        assert_eq!(observer.watch_count(), 0);
        drop(observer);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_release_after_destroy() {
        let observer = Observer::new();
        let (count, trigger) = counter();
        let guard = observer.watch(trigger);
        drop(observer);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(guard.release().is_none());
    }

    #[test]
    fn test_drop_from_other_thread() {
        let observer = Observer::new();
        let (count, trigger) = counter();
        let _guard = observer.watch(trigger);
        std::thread::spawn(move || drop(observer)).join().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
