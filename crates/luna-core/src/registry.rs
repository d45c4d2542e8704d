use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::error::ControlError;
use crate::session::{Session, SessionId};
use crate::surface::TerminalSurface;

/// A session shared between the registry and whoever looked it up.
pub type SharedSession = Arc<Mutex<Session>>;

/// Single source of truth for which sessions exist.
///
/// Inserts and removals happen on the host's event thread, lookups on control
/// server tasks. The map lock is only held for the insert, lookup or removal
/// itself; commands run against the looked-up session after it is released.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, SharedSession>>,
    /// Monotonically increasing session ID counter, starting at 1.
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, SharedSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_id(&self) -> SessionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn insert(&self, id: SessionId, surface: Weak<dyn TerminalSurface>) -> SharedSession {
        let session = Arc::new(Mutex::new(Session::new(id, surface)));
        self.sessions().insert(id, Arc::clone(&session));
        session
    }

    /// Register a surface under a fresh id.
    pub fn register(&self, surface: Weak<dyn TerminalSurface>) -> SessionId {
        let id = self.allocate_id();
        self.insert(id, surface);
        log::debug!("registered session {id}");
        id
    }

    /// Allocate an id, let `create` build the surface for it, then register it.
    ///
    /// For surfaces that need to know their id while being built (the spawned
    /// shell is told its session id). If `create` fails the id is burned, never
    /// handed out again. The map is not locked while `create` runs.
    pub fn register_with<S, E, F>(&self, create: F) -> Result<(SharedSession, Arc<S>), E>
    where
        S: TerminalSurface + 'static,
        F: FnOnce(SessionId) -> Result<Arc<S>, E>,
    {
        let id = self.allocate_id();
        let surface = create(id)?;
        let weak: Weak<S> = Arc::downgrade(&surface);
        let session = self.insert(id, weak);
        log::debug!("registered session {id}");
        Ok((session, surface))
    }

    /// Look up a registered session.
    pub fn lookup(&self, id: SessionId) -> Result<SharedSession, ControlError> {
        self.sessions()
            .get(&id)
            .cloned()
            .ok_or(ControlError::SessionNotFound(id))
    }

    /// Remove a session. Removing an id that is not registered is a no-op.
    ///
    /// Returns whether anything was removed.
    pub fn unregister(&self, id: SessionId) -> bool {
        let removed = self.sessions().remove(&id).is_some();
        if removed {
            log::debug!("unregistered session {id}");
        }
        removed
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions().contains_key(&id)
    }

    /// All registered IDs, sorted.
    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSurface;
    use std::collections::HashSet;
    use std::thread;

    fn weak(surface: &Arc<FakeSurface>) -> Weak<dyn TerminalSurface> {
        let weak: Weak<FakeSurface> = Arc::downgrade(surface);
        weak
    }

    #[test]
    fn test_ids_increment() {
        let registry = SessionRegistry::new();
        let surface = FakeSurface::new();

        assert_eq!(registry.register(weak(&surface)), 1);
        assert_eq!(registry.register(weak(&surface)), 2);
        assert_eq!(registry.register(weak(&surface)), 3);
        assert_eq!(registry.ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_lookup_unknown_id() {
        let registry = SessionRegistry::new();
        let surface = FakeSurface::new();
        registry.register(weak(&surface));

        for id in [0, 2, 999] {
            assert!(matches!(
                registry.lookup(id),
                Err(ControlError::SessionNotFound(missing)) if missing == id
            ));
        }
    }

    #[test]
    fn test_lookup_returns_registered_session() {
        let registry = SessionRegistry::new();
        let surface = FakeSurface::new();
        let id = registry.register(weak(&surface));

        let session = registry.lookup(id).unwrap();
        assert_eq!(session.lock().unwrap().id(), id);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = SessionRegistry::new();
        let surface = FakeSurface::new();
        let id = registry.register(weak(&surface));

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(!registry.unregister(999));
        assert!(registry.lookup(id).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_not_reused_after_unregister() {
        let registry = SessionRegistry::new();
        let surface = FakeSurface::new();
        let first = registry.register(weak(&surface));
        registry.unregister(first);

        let second = registry.register(weak(&surface));
        assert!(second > first);
        assert!(registry.lookup(first).is_err());
    }

    #[test]
    fn test_register_with_passes_id() {
        let registry = SessionRegistry::new();

        let (session, surface) = registry
            .register_with(|id| {
                assert_eq!(id, 1);
                Ok::<_, String>(FakeSurface::new())
            })
            .unwrap();

        assert_eq!(session.lock().unwrap().id(), 1);
        assert!(registry.contains(1));
        drop(surface);
        assert!(!session.lock().unwrap().is_alive());
    }

    #[test]
    fn test_register_with_failure_burns_id() {
        let registry = SessionRegistry::new();

        let result = registry.register_with(|_| Err::<Arc<FakeSurface>, _>("spawn failed"));
        assert_eq!(result.err(), Some("spawn failed"));
        assert!(registry.is_empty());

        let surface = FakeSurface::new();
        assert_eq!(registry.register(weak(&surface)), 2);
    }

    #[test]
    fn test_concurrent_register_yields_distinct_ids() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 50;

        let registry = Arc::new(SessionRegistry::new());
        let surface = FakeSurface::new();

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let surface = weak(&surface);
                thread::spawn(move || {
                    let mut ids = Vec::with_capacity(PER_THREAD);
                    let mut last = 0;
                    for _ in 0..PER_THREAD {
                        let id = registry.register(surface.clone());
                        assert!(id > last, "ids must increase within a thread");
                        last = id;
                        ids.push(id);
                    }
                    ids
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all.insert(id), "duplicate id {id}");
            }
        }

        let total = (THREADS * PER_THREAD) as u64;
        assert_eq!(all.len() as u64, total);
        assert_eq!(registry.ids(), (1..=total).collect::<Vec<_>>());
    }

    #[test]
    fn test_no_resurrection_after_concurrent_unregister() {
        let registry = Arc::new(SessionRegistry::new());
        let surface = FakeSurface::new();

        for _ in 0..200 {
            let id = registry.register(weak(&surface));

            let remover = {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.unregister(id))
            };
            let looker = {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    // Either outcome is fine while the removal is in flight.
                    let _ = registry.lookup(id);
                })
            };

            assert!(remover.join().unwrap());
            looker.join().unwrap();
            assert!(registry.lookup(id).is_err());
        }
    }
}
