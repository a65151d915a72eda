//! Browser clock and scheduler
//!
//! `setTimeout` carries every deferred task. When a timeout fires, its task
//! is handed to [`Page::dispatch`](folio_core::Page::dispatch) through the
//! [`PageLink`]; the page decides whether the task is still relevant.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use folio_core::{Clock, Millis, Scheduler, Task, TimerHandle};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Performance, Window};

use crate::link::PageLink;

/// `performance.now()`, falling back to `Date.now()`
pub struct PerformanceClock {
    performance: Option<Performance>,
}

impl PerformanceClock {
    pub fn new(window: &Window) -> Self {
        let performance = window.performance();
        if performance.is_none() {
            tracing::warn!("performance.now unavailable, using Date.now");
        }
        Self { performance }
    }
}

impl Clock for PerformanceClock {
    fn now(&self) -> Millis {
        match &self.performance {
            Some(p) => p.now(),
            None => js_sys::Date::now(),
        }
    }
}

#[derive(Default)]
struct TimerTable {
    next: u64,
    live: HashMap<TimerHandle, i32>,
}

/// [`Scheduler`] on top of `window.setTimeout`
pub struct BrowserScheduler {
    window: Window,
    link: PageLink,
    table: Rc<RefCell<TimerTable>>,
}

impl BrowserScheduler {
    pub fn new(window: Window, link: PageLink) -> Self {
        Self {
            window,
            link,
            table: Rc::new(RefCell::new(TimerTable::default())),
        }
    }
}

/// Round a delay to whole milliseconds for `setTimeout`
fn timeout_ms(delay: Millis) -> i32 {
    if delay.is_finite() {
        // `as` saturates
        delay.max(0.0).round() as i32
    } else {
        0
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay: Millis, task: Task) -> TimerHandle {
        let handle = {
            let mut table = self.table.borrow_mut();
            table.next += 1;
            TimerHandle(table.next)
        };

        let table: Weak<RefCell<TimerTable>> = Rc::downgrade(&self.table);
        let link = self.link.clone();
        let callback = Closure::once_into_js(move || {
            if let Some(table) = table.upgrade() {
                table.borrow_mut().live.remove(&handle);
            }
            link.with(|page| page.dispatch(task));
        });

        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                timeout_ms(delay),
            ) {
            Ok(id) => {
                self.table.borrow_mut().live.insert(handle, id);
            }
            Err(err) => {
                tracing::error!(?err, ?task, "setTimeout failed, task dropped");
            }
        }
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        let id = self.table.borrow_mut().live.remove(&handle);
        if let Some(id) = id {
            self.window.clear_timeout_with_handle(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_rounding() {
        assert_eq!(timeout_ms(149.6), 150);
        assert_eq!(timeout_ms(-3.0), 0);
        assert_eq!(timeout_ms(f64::NAN), 0);
        assert_eq!(timeout_ms(1e12), i32::MAX);
    }
}
