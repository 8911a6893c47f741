//! Conditional compilation state
//!
//! Tracks the nesting of `#if` / `#ifdef` / `#ifndef` blocks and whether
//! the text currently being read is included. Each open block is a frame on
//! a stack; `#endif` pops it.

use tracing::trace;

use crate::error::PreprocessorError;
use crate::token::Location;

/// One open conditional block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Whether the text around the block is included
    pub parent_active: bool,

    /// Whether the current branch is included
    pub active: bool,

    /// Whether some branch of this block has already been included
    pub taken: bool,

    /// Whether `#else` has been seen
    pub seen_else: bool,

    /// Where the opening directive was
    pub location: Location,
}

/// Stack of open conditional blocks.
///
/// # Example
///
/// ```
/// use glsl_pp::conditional::ConditionalStack;
/// use glsl_pp::Location;
///
/// let mut stack = ConditionalStack::new();
/// stack.push_if(false, Location::new(1, 0));
/// assert!(!stack.is_active());
///
/// stack.else_branch().unwrap();
/// assert!(stack.is_active());
///
/// stack.endif().unwrap();
/// assert!(stack.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConditionalStack {
    blocks: Vec<Block>,
}

impl ConditionalStack {
    /// Create an empty stack (everything is included).
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Whether text at the current position is included.
    pub fn is_active(&self) -> bool {
        self.blocks.last().map_or(true, |block| block.active)
    }

    /// Number of open blocks.
    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no block is open.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Open a block for `#if`, `#ifdef` or `#ifndef`.
    ///
    /// `condition` is ignored when the surrounding text is excluded.
    pub fn push_if(&mut self, condition: bool, location: Location) {
        let parent_active = self.is_active();
        let active = parent_active && condition;
        self.blocks.push(Block {
            parent_active,
            active,
            // An excluded parent means no branch may ever be taken
            taken: active || !parent_active,
            seen_else: false,
            location,
        });
        trace!(depth = self.blocks.len(), active, "opened conditional block");
    }

    /// Check an `#elif` and report whether its condition needs evaluating.
    pub fn elif_needs_condition(&self) -> Result<bool, PreprocessorError> {
        let block = self
            .blocks
            .last()
            .ok_or(PreprocessorError::ElifOutsideOfBlock)?;
        if block.seen_else {
            return Err(PreprocessorError::ElifAfterElse);
        }
        Ok(!block.taken)
    }

    /// Switch to an `#elif` branch.
    pub fn elif(&mut self, condition: bool) -> Result<(), PreprocessorError> {
        let evaluate = self.elif_needs_condition()?;
        if let Some(block) = self.blocks.last_mut() {
            block.active = evaluate && condition;
            block.taken |= block.active;
        }
        Ok(())
    }

    /// Switch to the `#else` branch.
    pub fn else_branch(&mut self) -> Result<(), PreprocessorError> {
        let block = self
            .blocks
            .last_mut()
            .ok_or(PreprocessorError::ElseOutsideOfBlock)?;
        if block.seen_else {
            return Err(PreprocessorError::MoreThanOneElse);
        }
        block.seen_else = true;
        block.active = !block.taken;
        block.taken = true;
        Ok(())
    }

    /// Close the innermost block.
    pub fn endif(&mut self) -> Result<Block, PreprocessorError> {
        let block = self
            .blocks
            .pop()
            .ok_or(PreprocessorError::EndifOutsideOfBlock)?;
        trace!(depth = self.blocks.len(), "closed conditional block");
        Ok(block)
    }

    /// Close everything at end of input, returning where the outermost
    /// block left open started.
    pub fn finish(&mut self) -> Option<Location> {
        let location = self.blocks.first().map(|block| block.location);
        self.blocks.clear();
        location
    }
}
