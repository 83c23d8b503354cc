//! Environment stack
//!
//! Frame 0 is the global frame. Blocks, for-loops and function calls push
//! frames above it. Lookup walks every active frame from the top down.

use crate::error::{Result, RuntimeError};
use crate::value::Val;
use std::collections::HashMap;

pub type Frame = HashMap<String, Val>;

/// Frames set aside while a lexically scoped call runs
#[must_use]
pub struct SavedFrames(Vec<Frame>);

#[derive(Debug)]
pub struct Env {
    frames: Vec<Frame>,
}

impl Env {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::new());
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pop the innermost frame. The global frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind `name` in the innermost frame, failing if it is already bound there
    pub fn declare(&mut self, name: &str, val: Val) -> Result<()> {
        let frame = self.innermost();
        if frame.contains_key(name) {
            return Err(RuntimeError::new(format!("'{}' is already declared", name)));
        }
        frame.insert(name.to_string(), val);
        Ok(())
    }

    /// Bind or overwrite `name` in the global frame
    pub fn define_global(&mut self, name: &str, val: Val) {
        self.frames[0].insert(name.to_string(), val);
    }

    pub fn get(&self, name: &str) -> Option<&Val> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Val> {
        self.frames.iter_mut().rev().find_map(|f| f.get_mut(name))
    }

    pub fn get_global(&self, name: &str) -> Option<&Val> {
        self.frames[0].get(name)
    }

    pub fn globals(&self) -> &Frame {
        &self.frames[0]
    }

    /// Hide every frame above the global one, leaving `[global]`
    pub fn enter_global_only(&mut self) -> SavedFrames {
        SavedFrames(self.frames.split_off(1))
    }

    /// Undo [`enter_global_only`](Self::enter_global_only)
    pub fn restore(&mut self, saved: SavedFrames) {
        self.frames.truncate(1);
        self.frames.extend(saved.0);
    }

    fn innermost(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
