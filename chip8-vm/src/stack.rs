//! Subroutine call stack.
use crate::{
    constants::*,
    error::{Chip8Error, Chip8Result},
};

/// Stack of return pointers used for jumping when a routine call finishes.
///
/// The pointer indexes the top entry. An empty stack has no pointer, which
/// corresponds to the traditional `-1`.
pub struct CallStack {
    slots: [Address; STACK_SIZE],
    /// Number of occupied slots. The stack pointer is `depth - 1`.
    depth: usize,
}

impl Default for CallStack {
    fn default() -> Self {
        Self {
            slots: [0; STACK_SIZE],
            depth: 0,
        }
    }
}

impl CallStack {
    pub fn new() -> Self {
        Default::default()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.fill(0);
        self.depth = 0;
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.depth == STACK_SIZE
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Index of the top entry, or `None` when the stack is empty.
    #[inline]
    pub fn pointer(&self) -> Option<usize> {
        self.depth.checked_sub(1)
    }

    /// Return address on top of the stack.
    #[inline]
    pub fn top(&self) -> Option<Address> {
        self.pointer().map(|sp| self.slots[sp])
    }

    /// Raw slot contents, including stale entries above the pointer.
    pub fn slots(&self) -> &[Address] {
        &self.slots
    }

    pub fn push(&mut self, address: Address) -> Chip8Result<()> {
        if self.is_full() {
            return Err(Chip8Error::StackOverflow);
        }
        self.slots[self.depth] = address;
        self.depth += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Chip8Result<Address> {
        let sp = self.pointer().ok_or(Chip8Error::StackUnderflow)?;
        self.depth = sp;
        Ok(self.slots[sp])
    }

    /// Overwrite the stack contents and pointer directly.
    ///
    /// Intended for debuggers and test fixtures.
    pub fn set_state(&mut self, pointer: Option<usize>, slots: &[Address]) {
        let n = slots.len().min(STACK_SIZE);
        self.slots[..n].copy_from_slice(&slots[..n]);
        self.depth = pointer.map(|sp| (sp + 1).min(STACK_SIZE)).unwrap_or(0);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut stack = CallStack::new();
        assert_eq!(stack.pointer(), None);

        stack.push(0x202).unwrap();
        stack.push(0x304).unwrap();
        assert_eq!(stack.pointer(), Some(1));
        assert_eq!(stack.top(), Some(0x304));

        assert_eq!(stack.pop().unwrap(), 0x304);
        assert_eq!(stack.pop().unwrap(), 0x202);
        assert_eq!(stack.pointer(), None);
    }

    #[test]
    fn test_overflow() {
        let mut stack = CallStack::new();
        for i in 0..STACK_SIZE {
            stack.push(i as Address).unwrap();
        }
        assert_eq!(stack.pointer(), Some(15));
        assert!(matches!(stack.push(0xABC), Err(Chip8Error::StackOverflow)));
        // Rejected push must not clobber the top entry.
        assert_eq!(stack.top(), Some(15));
    }

    #[test]
    fn test_underflow() {
        let mut stack = CallStack::new();
        assert!(matches!(stack.pop(), Err(Chip8Error::StackUnderflow)));
        assert_eq!(stack.pointer(), None);
    }

    #[test]
    fn test_set_state() {
        let mut stack = CallStack::new();
        stack.set_state(Some(1), &[0x0, 0x9]);
        assert_eq!(stack.pointer(), Some(1));
        assert_eq!(stack.pop().unwrap(), 0x9);
        assert_eq!(stack.pointer(), Some(0));

        // Popped entries stay behind in their slots.
        assert_eq!(stack.slots().len(), STACK_SIZE);
        assert_eq!(&stack.slots()[..2], &[0x0, 0x9]);
    }
}
