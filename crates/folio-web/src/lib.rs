//! Browser bindings for folio galleries
//!
//! Drives [`folio_core`] from a live document:
//! - Discovers gallery containers and mounts one carousel per container
//! - Renders slides, progress fills and the lightbox through `web-sys`
//! - Schedules deferred work with `setTimeout` and reads time from `performance.now()`
//! - Feeds `IntersectionObserver` entries into the visibility signal
//! - Forwards clicks, keys, touches and `transitionend` as typed page operations
//!
//! ## Usage
//!
//! ```js
//! import init, { Portfolio } from "./folio_web.js";
//!
//! await init();
//! const portfolio = new Portfolio(JSON.stringify({ tier: "high" }));
//! portfolio.start();
//! ```
//!
//! `pagehide` tears everything down; [`Portfolio::teardown`] does the same
//! on demand.

mod config;
mod dom;
mod events;
mod link;
mod log;
mod observer;
mod timers;

use std::cell::RefCell;
use std::rc::Rc;

use folio_core::{
    AdvanceTarget, ContainerId, Env, FolioError, ImageRef, LightboxView, ObservationMode, Owner,
    Page, PauseSource,
};
use wasm_bindgen::prelude::*;

pub use config::{DomSelectors, WebConfig};

use dom::{DomLightbox, NoLightbox};
use link::PageLink;
use observer::ViewportObserver;
use timers::{BrowserScheduler, PerformanceClock};

fn to_js(err: FolioError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn dom_error(what: &str) -> JsValue {
    to_js(FolioError::Dom(what.to_string()))
}

/// Gallery runtime for one document
#[wasm_bindgen]
pub struct Portfolio {
    config: WebConfig,
    window: web_sys::Window,
    document: web_sys::Document,
    env: Env,
    link: PageLink,
    page: Rc<RefCell<Page>>,
    observer: Option<ViewportObserver>,
    started: bool,
}

#[wasm_bindgen]
impl Portfolio {
    /// Create a runtime from an optional JSON configuration
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<Portfolio, JsValue> {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        let config = WebConfig::from_json(config.as_deref()).map_err(to_js)?;
        log::init(config.level());

        let window = web_sys::window().ok_or_else(|| dom_error("no window"))?;
        let document = window.document().ok_or_else(|| dom_error("no document"))?;

        let link = PageLink::new();
        let clock = Rc::new(PerformanceClock::new(&window));
        let scheduler = Rc::new(BrowserScheduler::new(window.clone(), link.clone()));
        let env = Env::new(clock, scheduler);

        let observer = ViewportObserver::new(&config.page.visibility, link.clone());
        let mode = if observer.is_some() {
            ObservationMode::Observed
        } else {
            ObservationMode::AlwaysVisible
        };

        let lightbox: Box<dyn LightboxView> = match DomLightbox::find(&document, &config.selectors) {
            Ok(lightbox) => {
                events::wire_lightbox(&env, &link, &lightbox, &document, &config.selectors);
                Box::new(lightbox)
            }
            Err(err) => {
                tracing::info!(error = %err, "lightbox disabled");
                Box::new(NoLightbox)
            }
        };

        let page = Rc::new(RefCell::new(Page::new(
            env.clone(),
            config.page.clone(),
            lightbox,
            mode,
        )));
        link.attach(&page);

        Ok(Portfolio {
            config,
            window,
            document,
            env,
            link,
            page,
            observer,
            started: false,
        })
    }

    /// Discover and mount every gallery. Returns how many were mounted.
    ///
    /// Galleries without slides are skipped and logged. Only the first call
    /// does anything.
    pub fn start(&mut self) -> Result<u32, JsValue> {
        if self.started {
            return Ok(0);
        }
        self.started = true;

        let galleries = dom::discover(&self.document, &self.config.selectors);
        let mounts = galleries
            .iter()
            .map(|g| g.mount(&self.window, &self.config.selectors));
        let report = self
            .page
            .try_borrow_mut()
            .map_err(|_| dom_error("page busy"))?
            .mount_all(mounts);

        for gallery in &galleries {
            let Some(id) = self.page.borrow().instance_id(gallery.container) else {
                continue;
            };
            events::wire_gallery(&self.env, &self.link, gallery, Owner::Instance(id));
            if let Some(observer) = &self.observer {
                observer.observe(gallery.container, &gallery.element);
            }
        }
        if let Some(observer) = self.observer.take() {
            observer.register(&self.env);
        }
        events::wire_page(&self.env, &self.link, &self.window, &self.document);

        tracing::info!(
            mounted = report.mounted.len(),
            skipped = report.skipped.len(),
            "galleries started"
        );
        Ok(report.mounted.len() as u32)
    }

    /// Tear down every gallery, timer and listener. Returns false if already done.
    pub fn teardown(&self) -> bool {
        self.link.with(|page| page.teardown()).unwrap_or(false)
    }

    /// Open the lightbox on a JSON list of `{ "src": ..., "alt": ... }` images
    #[wasm_bindgen(js_name = openLightbox)]
    pub fn open_lightbox(
        &self,
        images_json: &str,
        start: u32,
        owner: Option<u32>,
    ) -> Result<(), JsValue> {
        let images: Vec<ImageRef> =
            serde_json::from_str(images_json).map_err(|e| to_js(e.into()))?;
        self.with_page(|page| page.open_fullscreen(images, start as usize, owner.map(ContainerId)))
    }

    /// Close the lightbox
    #[wasm_bindgen(js_name = closeLightbox)]
    pub fn close_lightbox(&self) -> bool {
        self.link.with(|page| page.close_fullscreen()).unwrap_or(false)
    }

    /// Show slide `index` of gallery `container` (1-based, document order)
    #[wasm_bindgen(js_name = goTo)]
    pub fn go_to(&self, container: u32, index: f64) -> Result<Option<u32>, JsValue> {
        let target = AdvanceTarget::from_f64(index);
        self.with_page(|page| page.advance(ContainerId(container), target))
            .map(|index| index.map(|i| i as u32))
    }

    /// Hold a manual pause on a gallery
    pub fn pause(&self, container: u32) -> Result<bool, JsValue> {
        self.with_page(|page| page.request_pause(ContainerId(container), PauseSource::Manual))
    }

    /// Release a manual pause on a gallery
    pub fn resume(&self, container: u32) -> Result<bool, JsValue> {
        self.with_page(|page| page.request_resume(ContainerId(container), PauseSource::Manual))
    }

    /// Debug description of a gallery's state
    pub fn state(&self, container: u32) -> Option<String> {
        let page = self.page.try_borrow().ok()?;
        let instance = page.instance(ContainerId(container))?;
        Some(format!(
            "{:?} slide {}/{}",
            instance.state(),
            instance.active_index() + 1,
            instance.slide_count()
        ))
    }
}

impl Portfolio {
    fn with_page<T>(
        &self,
        op: impl FnOnce(&mut Page) -> folio_core::FolioResult<T>,
    ) -> Result<T, JsValue> {
        self.link
            .with(op)
            .ok_or_else(|| dom_error("page busy"))?
            .map_err(to_js)
    }
}
