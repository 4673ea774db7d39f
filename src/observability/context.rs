//! Thread-local context tracking for crash reports.
//!
//! Records which profile and run phase the current thread is in, and which
//! module is executing. The panic hook reads this to tell a module failure
//! (isolated by the executor) apart from a crash of corpuslens itself.
//!
//! Context guards use RAII for automatic cleanup on drop.

use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::pipeline::RunPhase;

static MODULES_COMPLETED: AtomicUsize = AtomicUsize::new(0);
static MODULES_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<RunContext> = const { RefCell::new(RunContext::new()) };
}

/// Context snapshot for the current run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub phase: Option<RunPhase>,
    /// Language code of the profile in use
    pub profile: Option<String>,
    /// Module currently constructing, checking readiness or analyzing
    pub current_module: Option<String>,
    /// Resource currently loading
    pub current_resource: Option<String>,
    /// True while a panic will be caught and recorded as a module failure
    pub isolated: bool,
}

impl RunContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            profile: None,
            current_module: None,
            current_resource: None,
            isolated: false,
        }
    }
}

/// RAII guard restoring the previous context on drop.
pub struct ContextGuard {
    previous: RunContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(change: impl FnOnce(&mut RunContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        change(&mut ctx.borrow_mut());
        ContextGuard { previous }
    })
}

/// Set the profile a run is using.
#[must_use]
pub fn set_profile(code: impl Into<String>) -> ContextGuard {
    let code = code.into();
    update(|ctx| ctx.profile = Some(code))
}

/// Set the current run phase.
///
/// Returns a guard that restores the previous phase on drop.
#[must_use]
pub fn set_phase(phase: RunPhase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

/// Mark a module as running inside the executor's panic boundary.
#[must_use]
pub fn enter_module(name: impl Into<String>) -> ContextGuard {
    let name = name.into();
    update(|ctx| {
        ctx.current_module = Some(name);
        ctx.isolated = true;
    })
}

/// Mark a resource as loading inside the store's panic boundary.
#[must_use]
pub fn enter_resource(name: impl Into<String>) -> ContextGuard {
    let name = name.into();
    update(|ctx| {
        ctx.current_resource = Some(name);
        ctx.isolated = true;
    })
}

pub fn set_progress(completed: usize, total: usize) {
    MODULES_COMPLETED.store(completed, Ordering::Relaxed);
    MODULES_TOTAL.store(total, Ordering::Relaxed);
}

pub fn increment_completed() {
    MODULES_COMPLETED.fetch_add(1, Ordering::Relaxed);
}

/// Get the current context snapshot.
#[must_use]
pub fn get_current_context() -> RunContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Modules (completed, total) of the most recent run.
#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        MODULES_COMPLETED.load(Ordering::Relaxed),
        MODULES_TOTAL.load(Ordering::Relaxed),
    )
}

/// Reset the current thread's context to empty.
pub fn reset_context() {
    CURRENT_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = RunContext::new();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guards_nest_and_restore() {
        reset_context();
        let _profile = set_profile("fr");
        let _phase = set_phase(RunPhase::Executing);
        {
            let _module = enter_module("diversity");
            let ctx = get_current_context();
            assert_eq!(ctx.current_module.as_deref(), Some("diversity"));
            assert!(ctx.isolated);
            assert_eq!(ctx.profile.as_deref(), Some("fr"));
        }
        let ctx = get_current_context();
        assert_eq!(ctx.current_module, None);
        assert!(!ctx.isolated);
        assert_eq!(ctx.phase, Some(RunPhase::Executing));
    }

    #[test]
    fn test_resource_guard_isolates() {
        reset_context();
        {
            let _resource = enter_resource("lexicon");
            let ctx = get_current_context();
            assert_eq!(ctx.current_resource.as_deref(), Some("lexicon"));
            assert!(ctx.isolated);
        }
        assert_eq!(get_current_context(), RunContext::new());
    }

    #[test]
    fn test_context_is_thread_local() {
        reset_context();
        let _phase = set_phase(RunPhase::Selecting);
        let other = std::thread::spawn(get_current_context).join().unwrap();
        assert_eq!(other.phase, None);
    }
}
