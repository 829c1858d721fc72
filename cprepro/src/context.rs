//! Conditional-compilation state machine (spec.md §4.5), grounded on
//! `original_source`'s `Context` struct (`CPrePro.h`): a frame of three
//! booleans per nested `#if`, rather than the teacher's two-bool
//! `ConditionalState` simplification. The three-bool shape is kept because
//! it is the literal, testable representation of the invariant
//! "for any non-root frame F, F.active == parent(F).processing".

/// One nested `#if`/`#ifdef`/`#ifndef` frame.
#[derive(Debug, Clone, Copy)]
pub struct ConditionalFrame {
    /// Whether output/macro-processing is currently enabled inside this
    /// frame's innermost active branch. Always equal to `processing &&`
    /// the parent frame's `active` (the root frame is always active).
    pub active: bool,
    /// Whether the branch currently open (the one after the most recent
    /// `#if`/`#elif`/`#else` seen in this frame) is the one being taken.
    pub processing: bool,
    /// Whether any branch in this frame has already been taken. Once
    /// true, no later `#elif`/`#else` in the same frame may take over,
    /// even if its own condition would otherwise be true.
    pub processed: bool,
}

impl ConditionalFrame {
    fn root() -> Self {
        ConditionalFrame {
            active: true,
            processing: true,
            processed: true,
        }
    }

    fn child(parent: &ConditionalFrame, condition: bool) -> Self {
        let taking = parent.active && condition;
        ConditionalFrame {
            active: taking,
            processing: taking,
            processed: taking,
        }
    }
}

/// The nested stack of conditional frames for one input stream. Index 0 is
/// always the implicit root frame, which is always active and is never
/// popped.
pub struct ConditionalStack {
    frames: Vec<ConditionalFrame>,
}

impl Default for ConditionalStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionalStack {
    pub fn new() -> Self {
        ConditionalStack {
            frames: vec![ConditionalFrame::root()],
        }
    }

    /// Whether lines should currently be emitted/macro-processed.
    pub fn is_active(&self) -> bool {
        self.frames.last().is_some_and(|f| f.active)
    }

    /// Depth of conditional nesting, not counting the implicit root.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Whether the frame enclosing the current (innermost) one is active —
    /// what an `#elif`'s condition should be evaluated against, since the
    /// innermost frame's own `active` already reflects a branch that may
    /// since have been superseded.
    pub fn parent_active(&self) -> bool {
        if self.frames.len() < 2 {
            self.frames[0].active
        } else {
            self.frames[self.frames.len() - 2].active
        }
    }

    /// Push a new frame for `#if`/`#ifdef`/`#ifndef`.
    pub fn push_if(&mut self, condition: bool) {
        let parent = *self.frames.last().expect("root frame always present");
        self.frames.push(ConditionalFrame::child(&parent, condition));
    }

    /// Handle `#elif condition`. Returns `false` if there is no open frame
    /// to apply it to (an orphan `#elif` — the caller reports this as a
    /// diagnostic and ignores the line).
    pub fn elif(&mut self, condition: bool) -> bool {
        if self.frames.len() <= 1 {
            return false;
        }
        let parent_active = self.frames[self.frames.len() - 2].active;
        let frame = self.frames.last_mut().expect("checked above");
        if frame.processed {
            frame.processing = false;
            frame.active = false;
        } else {
            let taking = parent_active && condition;
            frame.processing = taking;
            frame.active = taking;
            if taking {
                frame.processed = true;
            }
        }
        true
    }

    /// Handle `#else`. Returns `false` for an orphan `#else`.
    pub fn else_branch(&mut self) -> bool {
        if self.frames.len() <= 1 {
            return false;
        }
        let parent_active = self.frames[self.frames.len() - 2].active;
        let frame = self.frames.last_mut().expect("checked above");
        if frame.processed {
            frame.processing = false;
            frame.active = false;
        } else {
            frame.processing = parent_active;
            frame.active = parent_active;
            frame.processed = true;
        }
        true
    }

    /// Handle `#endif`. Returns `false` for an orphan `#endif`.
    pub fn endif(&mut self) -> bool {
        if self.frames.len() <= 1 {
            return false;
        }
        self.frames.pop();
        true
    }

    /// Whether all frames opened by `#if` have been closed by a matching
    /// `#endif` (checked at end of input: an unterminated `#if` is a
    /// diagnostic, not a fatal error).
    pub fn is_balanced(&self) -> bool {
        self.frames.len() == 1
    }
}
