//! Audit stamping collaborators.
//!
//! # Responsibility
//! - Supply the ambient actor and the current time to repository writes.
//! - Resolve one [`AuditStamp`] per write; repositories turn it into
//!   [`AuditMetadata`](crate::model::audit::AuditMetadata).
//!
//! # Invariants
//! - Nothing here is global: every repository receives its `Auditing`
//!   explicitly at construction.
//! - A write without a resolvable actor is rejected before any SQL runs.

use crate::model::audit::AuditStamp;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the identity recorded in `created_by` / `modified_by`.
pub trait ActorProvider: Send + Sync {
    /// Returns the current actor, or `None` when no caller is known.
    fn current_actor(&self) -> Option<String>;
}

/// Source of the timestamps recorded in `created_at` / `modified_at`.
pub trait Clock: Send + Sync {
    /// Unix epoch milliseconds.
    fn now_epoch_ms(&self) -> i64;
}

/// Actor provider that always answers with the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedActor(String);

impl FixedActor {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl ActorProvider for FixedActor {
    fn current_actor(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Actor provider for contexts with no caller at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoActor;

impl ActorProvider for NoActor {
    fn current_actor(&self) -> Option<String> {
        None
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
            })
    }
}

/// Clock that only moves when told to. Shareable across threads.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn starting_at(epoch_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(epoch_ms),
        }
    }

    pub fn set(&self, epoch_ms: i64) {
        self.now.store(epoch_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_epoch_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Audit failure raised before a write reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    MissingActor,
}

impl Display for AuditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingActor => write!(f, "no current actor available for audit stamping"),
        }
    }
}

impl Error for AuditError {}

/// Actor + clock pair handed to repositories.
#[derive(Clone)]
pub struct Auditing {
    actor: Arc<dyn ActorProvider>,
    clock: Arc<dyn Clock>,
}

impl Auditing {
    pub fn new(actor: Arc<dyn ActorProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { actor, clock }
    }

    /// Fixed actor name on the wall clock.
    pub fn with_actor(name: impl Into<String>) -> Self {
        Self::new(Arc::new(FixedActor::new(name)), Arc::new(SystemClock))
    }

    /// Resolves the stamp for one write.
    pub fn resolve(&self) -> Result<AuditStamp, AuditError> {
        let actor = self
            .actor
            .current_actor()
            .ok_or(AuditError::MissingActor)?;
        Ok(AuditStamp {
            actor,
            now: self.clock.now_epoch_ms(),
        })
    }
}

impl std::fmt::Debug for Auditing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auditing").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ActorProvider, AuditError, Auditing, Clock, FixedActor, ManualClock, NoActor, SystemClock,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingActor {
        calls: AtomicUsize,
    }

    impl ActorProvider for CountingActor {
        fn current_actor(&self) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some("counted".to_string())
        }
    }

    #[test]
    fn resolve_uses_injected_actor_and_clock() {
        let clock = Arc::new(ManualClock::starting_at(42));
        let auditing = Auditing::new(Arc::new(FixedActor::new("jmj")), clock.clone());

        let stamp = auditing.resolve().expect("actor should resolve");
        assert_eq!(stamp.actor, "jmj");
        assert_eq!(stamp.now, 42);

        clock.advance(8);
        assert_eq!(auditing.resolve().expect("actor should resolve").now, 50);
    }

    #[test]
    fn resolve_rejects_missing_actor() {
        let auditing = Auditing::new(Arc::new(NoActor), Arc::new(SystemClock));
        assert_eq!(auditing.resolve(), Err(AuditError::MissingActor));
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_epoch_ms() > 1_577_836_800_000);
    }

    #[test]
    fn debug_output_does_not_consult_collaborators() {
        let actor = Arc::new(CountingActor::default());
        let auditing = Auditing::new(actor.clone(), Arc::new(SystemClock));

        assert_eq!(format!("{auditing:?}"), "Auditing { .. }");
        assert_eq!(actor.calls.load(Ordering::SeqCst), 0);

        auditing.resolve().expect("actor should resolve");
        assert_eq!(actor.calls.load(Ordering::SeqCst), 1);
    }
}
