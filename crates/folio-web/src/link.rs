//! Weak handle from browser callbacks back to the page
//!
//! Timers, observers and listeners are created before (or while) the page
//! exists and must never keep it alive. They hold a [`PageLink`], which is
//! attached once the page is built and upgraded on every callback.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use folio_core::Page;

/// Shared, late-bound weak reference to the page
#[derive(Clone, Default)]
pub struct PageLink {
    page: Rc<RefCell<Weak<RefCell<Page>>>>,
}

impl PageLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point every clone of this link at `page`
    pub fn attach(&self, page: &Rc<RefCell<Page>>) {
        *self.page.borrow_mut() = Rc::downgrade(page);
    }

    /// Run `f` on the page if it is still alive and not already borrowed.
    ///
    /// A callback that arrives while the page is busy is dropped and logged;
    /// it never panics across the callback boundary.
    pub fn with<R>(&self, f: impl FnOnce(&mut Page) -> R) -> Option<R> {
        let page = self.page.borrow().upgrade()?;
        let result = match page.try_borrow_mut() {
            Ok(mut page) => Some(f(&mut page)),
            Err(_) => {
                tracing::warn!("page busy, callback dropped");
                None
            }
        };
        result
    }
}
