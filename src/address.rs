//! Depth-first address assignment for command trees.
//!
//! Addresses flatten a (possibly nested) scan program into a single program
//! counter space: a loop command's own address precedes every address inside
//! its body, and the first address after the body goes to the loop's next
//! sibling. One counter is threaded through the whole tree, so addresses are
//! unique and strictly increasing in pre-order. The traversal is iterative
//! (an explicit stack of slice iterators rather than call-stack recursion),
//! so nesting depth is bounded by the heap, not the thread stack.
//!
//! This pass is the only producer of addresses. [`CommandSequence::add`]
//! re-runs it over the whole sequence after every append, which keeps the
//! numbering consistent at O(total command count) per append; sequences are
//! tens to low hundreds of commands built once, never a hot loop.
//!
//! [`CommandSequence::add`]: crate::sequence::CommandSequence::add

use crate::command::ScanCommand;

/// Stamp every command in the tree with its depth-first pre-order address,
/// starting at 0. Returns the number of commands addressed, i.e. the next
/// free address.
///
/// Re-running the pass on an unchanged tree reproduces identical addresses.
pub fn assign_addresses(commands: &mut [ScanCommand]) -> usize {
    let mut next = 0;
    let mut stack = vec![commands.iter_mut()];
    while let Some(frame) = stack.last_mut() {
        match frame.next() {
            None => {
                stack.pop();
            }
            Some(command) => {
                command.set_address(next);
                next += 1;
                if let ScanCommand::Loop(loop_cmd) = command {
                    stack.push(loop_cmd.body_mut().commands_mut().iter_mut());
                }
            }
        }
    }
    tracing::trace!("Addressing pass assigned {} addresses", next);
    next
}
