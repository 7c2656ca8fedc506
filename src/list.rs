//! Intrusive doubly linked list used by the recency index.
//!
//! Nodes are heap allocated and addressed by raw pointer so that the owner can
//! keep a `key -> node` map and unlink or promote a node in O(1). Two sentinel
//! nodes (sigils) bracket the list, which removes every null check from the
//! link/unlink paths.
//!
//! This module is internal infrastructure. All pointer bookkeeping is owned by
//! [`RecencyIndex`](crate::recency::RecencyIndex).

use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

/// A node in the list. Sigil nodes leave `val` uninitialized.
pub(crate) struct Node<T> {
    val: mem::MaybeUninit<T>,
    prev: *mut Node<T>,
    next: *mut Node<T>,
}

impl<T> Node<T> {
    fn new(val: T) -> Self {
        Node {
            val: mem::MaybeUninit::new(val),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    fn new_sigil() -> Self {
        Node {
            val: mem::MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }
}

/// Unbounded doubly linked list. The front is the most recently attached node.
pub(crate) struct List<T> {
    len: usize,
    head: *mut Node<T>,
    tail: *mut Node<T>,
}

impl<T> List<T> {
    /// Creates an empty list with its two sentinel nodes linked together.
    pub(crate) fn new() -> Self {
        let head = Box::into_raw(Box::new(Node::new_sigil()));
        let tail = Box::into_raw(Box::new(Node::new_sigil()));

        // SAFETY: head and tail were just allocated and are uniquely owned here.
        unsafe {
            (*head).next = tail;
            (*tail).prev = head;
        }

        List { len: 0, head, tail }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocates a node for `val`, links it at the front and returns its address.
    ///
    /// The pointer stays valid until the node is passed to [`List::unlink`],
    /// popped by [`List::pop_back`], or the list is cleared or dropped.
    pub(crate) fn push_front(&mut self, val: T) -> NonNull<Node<T>> {
        let node = NonNull::from(Box::leak(Box::new(Node::new(val))));
        // SAFETY: node is freshly allocated and not linked anywhere yet.
        unsafe { self.attach(node.as_ptr()) };
        self.len += 1;
        node
    }

    /// Unlinks the last (coldest) node and returns its value.
    pub(crate) fn pop_back(&mut self) -> Option<T> {
        // SAFETY: tail is a valid sentinel for the lifetime of the list.
        let last = unsafe { (*self.tail).prev };
        if last == self.head {
            return None;
        }
        // SAFETY: last lies strictly between the sentinels, so it is a live
        // value node owned by this list.
        Some(unsafe { self.unlink(NonNull::new_unchecked(last)) })
    }

    /// Unlinks `node`, frees it and returns its value.
    ///
    /// # Safety
    ///
    /// `node` must have been returned by [`List::push_front`] on this list and
    /// must not have been unlinked since.
    pub(crate) unsafe fn unlink(&mut self, node: NonNull<Node<T>>) -> T {
        let node = node.as_ptr();
        // SAFETY: the caller guarantees node is a live value node of this list.
        unsafe {
            self.detach(node);
            self.len -= 1;
            let boxed = Box::from_raw(node);
            boxed.val.assume_init()
        }
    }

    /// Moves `node` to the front of the list.
    ///
    /// # Safety
    ///
    /// `node` must be a live value node of this list.
    pub(crate) unsafe fn move_to_front(&mut self, node: NonNull<Node<T>>) {
        let node = node.as_ptr();
        // SAFETY: head is a valid sentinel; the caller guarantees node is linked.
        unsafe {
            if (*self.head).next == node {
                return;
            }
            self.detach(node);
            self.attach(node);
        }
    }

    /// Iterates values from the back (coldest) towards the front.
    pub(crate) fn iter_back(&self) -> Iter<'_, T> {
        Iter {
            // SAFETY: tail is a valid sentinel for the lifetime of the list.
            cur: unsafe { (*self.tail).prev },
            end: self.head,
            forward: false,
            _marker: PhantomData,
        }
    }

    /// Iterates values from the front (hottest) towards the back.
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            // SAFETY: head is a valid sentinel for the lifetime of the list.
            cur: unsafe { (*self.head).next },
            end: self.tail,
            forward: true,
            _marker: PhantomData,
        }
    }

    /// Drops every value node, keeping the sentinels.
    pub(crate) fn clear(&mut self) {
        while self.pop_back().is_some() {}
    }

    /// # Safety
    ///
    /// `node` must currently be linked between the sentinels of this list.
    unsafe fn detach(&mut self, node: *mut Node<T>) {
        // SAFETY: a linked node always has valid prev and next neighbours.
        unsafe {
            (*(*node).prev).next = (*node).next;
            (*(*node).next).prev = (*node).prev;
        }
    }

    /// # Safety
    ///
    /// `node` must be valid and not currently linked into any list.
    unsafe fn attach(&mut self, node: *mut Node<T>) {
        // SAFETY: head is a valid sentinel and the caller guarantees node is
        // a valid, unlinked allocation.
        unsafe {
            (*node).next = (*self.head).next;
            (*node).prev = self.head;
            (*self.head).next = node;
            (*(*node).next).prev = node;
        }
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: the sentinels were allocated in `new` and are freed only here.
        unsafe {
            drop(Box::from_raw(self.head));
            drop(Box::from_raw(self.tail));
        }
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("len", &self.len).finish()
    }
}

/// Borrowing iterator over list values in either direction.
pub(crate) struct Iter<'a, T> {
    cur: *mut Node<T>,
    end: *mut Node<T>,
    forward: bool,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.cur == self.end {
            return None;
        }
        // SAFETY: cur is a value node between the sentinels; the shared borrow
        // of the list held by this iterator keeps it alive and unmodified.
        unsafe {
            let node = &*self.cur;
            self.cur = if self.forward { node.next } else { node.prev };
            Some(node.val.assume_init_ref())
        }
    }
}
