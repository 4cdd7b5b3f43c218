//! Re-entry guards for the recursive `Value` operations.
//!
//! Equality, hashing and formatting descend into shared containers. A
//! container that (directly or indirectly) contains itself would recurse
//! forever, so each operation keeps a per-thread stack of the cells it is
//! currently inside. Values are `Rc`-based and never cross threads, so a
//! thread-local stack sees every enclosing call.

use std::cell::RefCell;
use std::thread::LocalKey;

thread_local! {
    static HASHING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
    static COMPARING: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
    static FORMATTING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks one cell (or pair of cells) as entered; leaves it on drop.
pub(crate) struct Entered<K: 'static> {
    stack: &'static LocalKey<RefCell<Vec<K>>>,
}

impl<K: PartialEq + 'static> Entered<K> {
    /// `None` if `key` is already being processed further up the stack.
    fn enter(stack: &'static LocalKey<RefCell<Vec<K>>>, key: K) -> Option<Self> {
        stack.with(|entered| {
            let mut entered = entered.borrow_mut();
            if entered.contains(&key) {
                return None;
            }
            entered.push(key);
            Some(Self { stack })
        })
    }
}

impl<K: 'static> Drop for Entered<K> {
    fn drop(&mut self) {
        self.stack.with(|entered| {
            entered.borrow_mut().pop();
        });
    }
}

/// Enter the cell at `addr` for hashing.
pub(crate) fn hashing(addr: usize) -> Option<Entered<usize>> {
    Entered::enter(&HASHING, addr)
}

/// Enter the pair of cells `(left, right)` for an equality check. A pair
/// that is already being compared is assumed equal: any difference will be
/// found by the enclosing comparison.
pub(crate) fn comparing(left: usize, right: usize) -> Option<Entered<(usize, usize)>> {
    Entered::enter(&COMPARING, (left, right))
}

/// Enter the cell at `addr` for formatting.
pub(crate) fn formatting(addr: usize) -> Option<Entered<usize>> {
    Entered::enter(&FORMATTING, addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_entry_is_refused_until_left() {
        let outer = hashing(1).unwrap();
        assert!(hashing(1).is_none());
        assert!(hashing(2).is_some());
        drop(outer);
        assert!(hashing(1).is_some());
    }

    #[test]
    fn pairs_are_ordered() {
        let _entered = comparing(1, 2).unwrap();
        assert!(comparing(1, 2).is_none());
        assert!(comparing(2, 1).is_some());
    }
}
