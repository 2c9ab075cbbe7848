//! Block-structured storage for temporary rule variables.
//!
//! A stack of blocks, each owning a name→value map. Resolution walks outward
//! from a block to the base of the stack, so inner bindings shadow outer ones.
//! Popping a block drops every variable it declared.

use std::collections::HashMap;
use std::fmt;

use crate::expression::{EvalError, Value};

/// Identifier of one scope block. Never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

impl BlockId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Frame {
    id: BlockId,
    vars: HashMap<String, Value>,
}

#[derive(Debug, Default)]
pub struct ScopeStore {
    frames: Vec<Frame>,
    next_id: u64,
}

impl ScopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a block that is about to be entered.
    pub fn next_block_id(&mut self) -> BlockId {
        self.next_id += 1;
        BlockId(self.next_id)
    }

    pub fn push(&mut self, id: BlockId) {
        self.frames.push(Frame {
            id,
            vars: HashMap::new(),
        });
    }

    /// Pop the innermost block, returning its id.
    pub fn pop(&mut self) -> Option<BlockId> {
        self.frames.pop().map(|frame| frame.id)
    }

    pub fn current(&self) -> Option<BlockId> {
        self.frames.last().map(|frame| frame.id)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn position(&self, block: BlockId) -> Option<usize> {
        self.frames.iter().rposition(|frame| frame.id == block)
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        value: Value,
        block: BlockId,
    ) -> Result<(), EvalError> {
        let pos = self.position(block).ok_or(EvalError::UnknownBlock(block))?;
        self.frames[pos].vars.insert(name.into(), value);
        Ok(())
    }

    /// Nearest binding of `name` visible from `block`.
    pub fn resolve(&self, name: &str, block: BlockId) -> Result<&Value, EvalError> {
        let pos = self.position(block).ok_or(EvalError::UnknownBlock(block))?;
        self.frames[..=pos]
            .iter()
            .rev()
            .find_map(|frame| frame.vars.get(name))
            .ok_or_else(|| EvalError::UnboundVariable(name.to_string()))
    }

    /// Drop every block. Ids keep increasing so stale ids stay invalid.
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
