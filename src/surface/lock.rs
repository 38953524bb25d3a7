//! Scoped surface locking
//!
//! Software surfaces never need a lock. Surfaces backed by host memory can
//! carry a [`LockHook`]; its `lock` runs on the outermost acquisition and
//! its `unlock` when the last guard drops, so nested draw calls are free.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Host-side lock/unlock pair for surfaces whose pixels need exclusive access
pub trait LockHook {
    fn lock(&mut self) -> Result<(), String>;
    fn unlock(&mut self);
}

#[derive(Default)]
pub(crate) struct LockState {
    depth: Cell<u32>,
    hook: RefCell<Option<Box<dyn LockHook>>>,
}

impl LockState {
    pub(crate) fn set_hook(&self, hook: Option<Box<dyn LockHook>>) {
        *self.hook.borrow_mut() = hook;
    }

    pub(crate) fn must_lock(&self) -> bool {
        self.hook.borrow().is_some()
    }

    pub(crate) fn depth(&self) -> u32 {
        self.depth.get()
    }
}

impl fmt::Debug for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockState")
            .field("depth", &self.depth.get())
            .field("hooked", &self.must_lock())
            .finish()
    }
}

/// Held while pixels are being written; unlocks on drop
#[must_use = "the surface unlocks as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SurfaceLock {
    state: Option<Rc<LockState>>,
}

impl SurfaceLock {
    /// Guard that owns no lock (autolock disabled or no hook)
    pub(crate) fn unlocked() -> Self {
        Self { state: None }
    }

    pub(crate) fn acquire(state: &Rc<LockState>) -> Result<Self, String> {
        if !state.must_lock() {
            return Ok(Self::unlocked());
        }
        if state.depth.get() == 0 {
            if let Some(hook) = state.hook.borrow_mut().as_mut() {
                hook.lock()?;
            }
        }
        state.depth.set(state.depth.get() + 1);
        Ok(Self {
            state: Some(Rc::clone(state)),
        })
    }
}

impl Drop for SurfaceLock {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            let depth = state.depth.get().saturating_sub(1);
            state.depth.set(depth);
            if depth == 0 {
                if let Some(hook) = state.hook.borrow_mut().as_mut() {
                    hook.unlock();
                }
            }
        }
    }
}
