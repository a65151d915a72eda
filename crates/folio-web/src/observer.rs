//! Viewport observation
//!
//! Wraps an `IntersectionObserver` and forwards each entry to the page as an
//! [`Observation`]. If the observer cannot be built, the caller falls back to
//! [`ObservationMode::AlwaysVisible`](folio_core::ObservationMode).

use std::cell::RefCell;
use std::rc::Rc;

use folio_core::{ContainerId, Env, Observation, Owner, VisibilityConfig};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::link::PageLink;

type Targets = Rc<RefCell<Vec<(ContainerId, Element)>>>;

/// Live intersection observer feeding the page
pub struct ViewportObserver {
    observer: IntersectionObserver,
    targets: Targets,
    callback: Option<Closure<dyn FnMut(js_sys::Array)>>,
}

impl ViewportObserver {
    /// Build an observer, or `None` if the browser has no usable one
    pub fn new(config: &VisibilityConfig, link: PageLink) -> Option<Self> {
        let window = web_sys::window()?;
        let supported = js_sys::Reflect::has(&window, &JsValue::from_str("IntersectionObserver"))
            .unwrap_or(false);
        if !supported {
            return None;
        }

        let targets: Targets = Rc::new(RefCell::new(Vec::new()));
        let lookup = targets.clone();
        let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                let target = entry.target();
                let container = lookup
                    .borrow()
                    .iter()
                    .find(|(_, el)| *el == target)
                    .map(|(id, _)| *id);
                let Some(container) = container else { continue };
                let observation =
                    Observation::new(entry.intersection_ratio(), entry.is_intersecting());
                link.with(|page| page.observe(container, observation));
            }
        });

        let thresholds: js_sys::Array = config
            .thresholds()
            .into_iter()
            .map(JsValue::from_f64)
            .collect();
        let init = IntersectionObserverInit::new();
        init.set_root_margin(&config.root_margin());
        init.set_threshold(&thresholds);

        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => Some(Self {
                observer,
                targets,
                callback: Some(callback),
            }),
            Err(err) => {
                tracing::warn!(?err, "IntersectionObserver construction failed");
                None
            }
        }
    }

    /// Start observing a gallery container
    pub fn observe(&self, container: ContainerId, element: &Element) {
        self.targets.borrow_mut().push((container, element.clone()));
        self.observer.observe(element);
    }

    /// Hand the observer to the cleanup registry; teardown disconnects it
    pub fn register(mut self, env: &Env) {
        let callback = self.callback.take();
        let observer = self.observer.clone();
        let targets = self.targets.clone();
        env.track(
            Owner::Visibility,
            Box::new(move || {
                observer.disconnect();
                targets.borrow_mut().clear();
                drop(callback);
            }),
        );
    }
}
