//! Per-thread bump allocator used for everything that lives for exactly one
//! bounce of the path tracer: ray packets' BSDF pointers, closure-tree
//! intermediates, and the handful of small per-bounce scratch records the
//! shading dispatch needs.
//!
//! One [`Arena`] is created per worker thread at startup and reset at every
//! bounce boundary (`lumen_integrator`'s per-bounce loop). It wraps a
//! [`bumpalo::Bump`], the same bump allocator the rest of this ecosystem
//! reaches for when it needs per-frame transient allocation; allocation is
//! whatever `bumpalo` does internally, `reset` hands every chunk but the
//! largest back to the allocator and rewinds the cursor, and
//! [`Arena::scope`] opens a nesting level that triggers that same reset once
//! the outermost scope closes — the scoped form is what the shading dispatch
//! uses so a bucket's closure evaluation can't leak allocations into the
//! next bucket.
//!
//! # Safety contract
//!
//! Allocation returns a reference borrowed from the arena, not from the
//! caller, so nothing in the type system stops a caller from holding onto
//! an `&T` past a `reset()` or past the last open [`ArenaScope`] closing.
//! This mirrors the real constraint bump allocators place on their callers:
//! **never retain a reference returned by [`Arena::alloc`] past the next
//! `reset`/outermost-scope exit.** Copy anything you need out of the arena
//! before that point.

use std::cell::{Cell, UnsafeCell};
use thiserror::Error;

/// Errors an arena can raise. Setup-time (`with_capacity`) failures are not
/// modeled here — only exhaustion during a render, which the caller
/// surfaces as a [`ArenaError::OutOfMemory`] and treats as a `ResourceError`
/// per the renderer's error taxonomy.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// `bumpalo` could not grow its backing chunks to fit the request.
    #[error("arena exhausted: requested {requested} bytes")]
    OutOfMemory { requested: usize },
}

/// A bump allocator backed by one [`bumpalo::Bump`], reset between bounces.
///
/// `!Sync` (via the inner `UnsafeCell`), matching a `Cell`-based allocator:
/// one `Arena` lives on exactly one worker thread and is never shared
/// across threads, only passed around by shared reference within it.
pub struct Arena {
    bump: UnsafeCell<bumpalo::Bump>,
    scope_depth: Cell<u32>,
}

impl Arena {
    /// Allocates a new arena with `capacity` bytes of initial backing
    /// storage. `bumpalo` grows past this on demand, so `capacity` is a
    /// sizing hint rather than a hard ceiling.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            bump: UnsafeCell::new(bumpalo::Bump::with_capacity(capacity)),
            scope_depth: Cell::new(0),
        }
    }

    /// Total bytes currently allocated across all of the arena's chunks.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        // SAFETY: shared read of `bumpalo`'s own accounting; no `&mut`
        // borrow of `bump` can be outstanding while we hold `&self`.
        unsafe { &*self.bump.get() }.allocated_bytes()
    }

    /// Rewinds the allocator to empty, freeing every chunk but the largest
    /// and resetting its cursor. Called once per bounce by the worker's
    /// tile loop.
    ///
    /// # Panics
    /// Panics (in debug builds) if called while an [`ArenaScope`] is open —
    /// resetting out from under a scope would invalidate its restore point.
    pub fn reset(&self) {
        debug_assert_eq!(self.scope_depth.get(), 0, "Arena::reset called while a scope is open");
        // SAFETY: no scope is open (checked above) and no other `&T`
        // borrowed from a previous `alloc` is allowed to outlive this call
        // per the module's safety contract, so reclaiming the chunks is
        // sound.
        unsafe { &mut *self.bump.get() }.reset();
    }

    /// Opens a scope. Scopes nest: only the outermost scope's drop actually
    /// resets the allocator, so an inner scope closing mid-bounce doesn't
    /// disturb allocations the outer scope still needs.
    #[must_use]
    pub fn scope(&self) -> ArenaScope<'_> {
        self.scope_depth.set(self.scope_depth.get() + 1);
        ArenaScope { arena: self }
    }

    /// Bump-allocates space for one `T` and moves `value` into it,
    /// returning a reference borrowed from the arena.
    ///
    /// # Errors
    /// Returns [`ArenaError::OutOfMemory`] if `bumpalo` cannot grow to fit
    /// the request.
    pub fn alloc<T>(&self, value: T) -> Result<&T, ArenaError> {
        let requested = std::mem::size_of::<T>();
        // SAFETY: `bumpalo::Bump::try_alloc` only needs `&self`; see the
        // type-level safety contract above for why a shared borrow here is
        // sound.
        let bump = unsafe { &*self.bump.get() };
        bump.try_alloc(value).map(|r| &*r).map_err(|_| ArenaError::OutOfMemory { requested })
    }
}

/// Scoped acquisition guard returned by [`Arena::scope`]. Decrements the
/// arena's nesting depth on drop, resetting the allocator once the
/// outermost scope has closed.
pub struct ArenaScope<'a> {
    arena: &'a Arena,
}

impl Drop for ArenaScope<'_> {
    fn drop(&mut self) {
        let depth = self.arena.scope_depth.get() - 1;
        self.arena.scope_depth.set(depth);
        if depth == 0 {
            // SAFETY: this is the outermost scope closing, so nothing else
            // holds the nesting depth open; per the safety contract callers
            // must not retain allocations past this point.
            unsafe { &mut *self.arena.bump.get() }.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_the_stored_value() {
        let arena = Arena::with_capacity(1024);
        let v = arena.alloc(42u64).unwrap();
        assert_eq!(*v, 42);
        assert!(arena.allocated_bytes() > 0);
    }

    #[test]
    fn reset_frees_prior_allocations() {
        let arena = Arena::with_capacity(1024);
        arena.alloc(1u32).unwrap();
        arena.alloc(2u32).unwrap();
        arena.reset();
        assert_eq!(arena.allocated_bytes(), 0);
    }

    #[test]
    fn scope_resets_once_the_outermost_guard_drops() {
        let arena = Arena::with_capacity(1024);
        {
            let _scope = arena.scope();
            arena.alloc(2u64).unwrap();
            arena.alloc(3u64).unwrap();
            assert!(arena.allocated_bytes() > 0);
        }
        assert_eq!(arena.allocated_bytes(), 0);
    }

    #[test]
    fn exhaustion_reports_out_of_memory() {
        // bumpalo refuses to grow a chunk past `isize::MAX`, so a single
        // absurdly large allocation is the reliable way to force failure.
        let arena = Arena::with_capacity(8);
        let err = arena.alloc([0u8; usize::MAX / 2]).unwrap_err();
        matches!(err, ArenaError::OutOfMemory { .. });
    }

    #[test]
    fn nested_scopes_only_reset_when_the_outer_scope_closes() {
        let arena = Arena::with_capacity(1024);
        let scope_a = arena.scope();
        arena.alloc(1u32).unwrap();
        let after_outer_alloc = arena.allocated_bytes();
        {
            let scope_b = arena.scope();
            arena.alloc(2u32).unwrap();
            assert!(arena.allocated_bytes() > after_outer_alloc);
            drop(scope_b);
            // Inner scope closing didn't reset anything; depth is still 1.
            assert!(arena.allocated_bytes() > 0);
        }
        drop(scope_a);
        assert_eq!(arena.allocated_bytes(), 0);
    }
}
