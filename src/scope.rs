//! Per-call state shared with the serde callbacks of [`Shared`](crate::Shared) and
//! [`Poly`](crate::Poly).
//!
//! Serde gives no way to hand a context to `Serialize`/`Deserialize` impls, so each codec call
//! pushes a frame on a thread-local stack for its duration. The frame is popped when the
//! [`Scope`] guard drops, on every exit path.

use crate::settings::Settings;
use crate::Error;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;

struct Frame {
    settings: Arc<Settings>,
    /// Addresses of the shared nodes currently being encoded, i.e. the ancestors of the value
    /// being written.
    ancestors: HashSet<usize>,
    /// Typed failures recorded so far, with the message each one was raised with.
    failures: Vec<(String, Error)>,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = RefCell::new(Vec::new());
}

pub struct Scope {
    depth: usize,
}

impl Scope {
    pub fn enter(settings: Arc<Settings>) -> Self {
        let depth = FRAMES.with(|frames| {
            let mut frames = frames.borrow_mut();
            frames.push(Frame {
                settings,
                ancestors: HashSet::new(),
                failures: Vec::new(),
            });
            frames.len()
        });
        Self { depth }
    }

    /// Enters a scope with the default settings unless one is already active on this thread.
    pub fn ensure() -> Option<Self> {
        if is_active() {
            None
        } else {
            Some(Self::enter(Settings::shared_default()))
        }
    }

    /// Takes the typed failure behind `raised`, the error the call ended with: the first one
    /// recorded whose message it carries. Failures serde recovered from are discarded.
    pub fn take_failure(&self, raised: &str) -> Option<Error> {
        FRAMES.with(|frames| {
            let mut frames = frames.borrow_mut();
            let frame = frames.get_mut(self.depth - 1)?;
            std::mem::take(&mut frame.failures)
                .into_iter()
                .find(|(message, _)| raised.contains(message.as_str()))
                .map(|(_, error)| error)
        })
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        FRAMES.with(|frames| frames.borrow_mut().truncate(self.depth - 1));
    }
}

pub fn is_active() -> bool {
    FRAMES.with(|frames| !frames.borrow().is_empty())
}

/// Settings of the innermost scope, or the default ones outside of any scope.
pub fn settings() -> Arc<Settings> {
    FRAMES
        .with(|frames| frames.borrow().last().map(|f| f.settings.clone()))
        .unwrap_or_else(Settings::shared_default)
}

/// Marks `node` as being encoded. Returns `false` when it already is, i.e. when reaching it
/// again closes a cycle.
pub fn enter_node(node: usize) -> bool {
    FRAMES.with(|frames| {
        frames
            .borrow_mut()
            .last_mut()
            .map(|f| f.ancestors.insert(node))
            .unwrap_or(true)
    })
}

pub fn leave_node(node: usize) {
    FRAMES.with(|frames| {
        if let Some(frame) = frames.borrow_mut().last_mut() {
            frame.ancestors.remove(&node);
        }
    })
}

/// Records `error` on the innermost scope and returns the message to raise it with.
pub fn fail(error: Error) -> String {
    let message = error.to_string();
    FRAMES.with(|frames| {
        if let Some(frame) = frames.borrow_mut().last_mut() {
            frame.failures.push((message.clone(), error));
        }
    });
    message
}
