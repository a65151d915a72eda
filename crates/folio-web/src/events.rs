//! DOM event wiring
//!
//! Every listener translates one DOM event into one typed page operation
//! and is registered with the cleanup registry under the owner it belongs
//! to, so teardown removes it. Errors are logged here; none crosses the
//! callback boundary.

use folio_core::{ContainerId, Env, FolioResult, GalleryCommand, Key, Owner, Page};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Event, EventTarget, FocusEvent, HtmlElement, KeyboardEvent, Node, PageTransitionEvent,
    TouchEvent, TransitionEvent,
};

use crate::dom::{DiscoveredGallery, DomLightbox};
use crate::link::PageLink;

/// Add a listener and track its removal under `owner`
pub fn listen(
    env: &Env,
    owner: Owner,
    target: &EventTarget,
    event: &'static str,
    handler: impl FnMut(Event) + 'static,
) {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    if let Err(err) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
    {
        tracing::warn!(event, ?err, "addEventListener failed");
        return;
    }
    let target = target.clone();
    env.track(
        owner,
        Box::new(move || {
            let _ = target
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
            drop(closure);
        }),
    );
}

/// Run a fallible page operation from a callback, logging failures
fn route<T>(link: &PageLink, what: &'static str, op: impl FnOnce(&mut Page) -> FolioResult<T>) {
    if let Some(Err(err)) = link.with(op) {
        tracing::warn!(what, error = %err, "event handling failed");
    }
}

fn command_on(link: &PageLink, container: ContainerId, command: GalleryCommand) {
    route(link, "command", |page| page.command(container, command));
}

fn first_touch(event: &Event) -> Option<(f64, f64)> {
    let touch = event
        .dyn_ref::<TouchEvent>()?
        .changed_touches()
        .get(0)?;
    Some((f64::from(touch.client_x()), f64::from(touch.client_y())))
}

/// Whether key presses on `target` belong to a text field
fn is_editable(target: Option<EventTarget>) -> bool {
    let Some(el) = target.and_then(|t| t.dyn_into::<HtmlElement>().ok()) else {
        return false;
    };
    el.is_content_editable() || matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT")
}

/// Whether focus moving to `next` leaves `container`
fn focus_leaves(container: &Node, next: Option<EventTarget>) -> bool {
    let next = next.and_then(|t| t.dyn_into::<Node>().ok());
    !container.contains(next.as_ref())
}

/// `pagehide` for a page going into the back/forward cache keeps galleries alive
fn page_discarded(event: &Event) -> bool {
    !event
        .dyn_ref::<PageTransitionEvent>()
        .is_some_and(|e| e.persisted())
}

/// Wire one mounted gallery's controls, gestures and fill
pub fn wire_gallery(env: &Env, link: &PageLink, gallery: &DiscoveredGallery, owner: Owner) {
    let container = gallery.container;

    let buttons = [
        (&gallery.next, GalleryCommand::Next),
        (&gallery.prev, GalleryCommand::Previous),
        (&gallery.toggle, GalleryCommand::TogglePlayback),
    ];
    for (button, command) in buttons {
        let Some(button) = button else { continue };
        let link = link.clone();
        listen(env, owner, button, "click", move |_| {
            command_on(&link, container, command);
        });
    }

    for (i, dot) in gallery.dots.iter().enumerate() {
        let link = link.clone();
        listen(env, owner, dot, "click", move |_| {
            command_on(&link, container, GalleryCommand::GoTo(i));
        });
    }

    for (event, command) in [
        ("pointerenter", GalleryCommand::PointerEnter),
        ("pointerleave", GalleryCommand::PointerLeave),
    ] {
        let link = link.clone();
        listen(env, owner, &gallery.element, event, move |_| {
            command_on(&link, container, command);
        });
    }

    let focus = link.clone();
    listen(env, owner, &gallery.element, "focusin", move |_| {
        focus.with(|page| page.focus(Some(container)));
    });
    let blur = link.clone();
    let element: Node = gallery.element.clone().into();
    listen(env, owner, &gallery.element, "focusout", move |event| {
        let next = event.dyn_ref::<FocusEvent>().and_then(|e| e.related_target());
        if focus_leaves(&element, next) {
            blur.with(|page| page.blur(container));
        }
    });

    let touch = link.clone();
    listen(env, owner, &gallery.element, "touchstart", move |event| {
        if let Some((x, y)) = first_touch(&event) {
            touch.with(|page| page.touch_start(container, x, y));
        }
    });
    let touch = link.clone();
    listen(env, owner, &gallery.element, "touchend", move |event| {
        if let Some((x, y)) = first_touch(&event) {
            route(&touch, "swipe", |page| page.touch_end(container, x, y));
        }
    });
    let touch = link.clone();
    listen(env, owner, &gallery.element, "touchcancel", move |_| {
        touch.with(|page| page.touch_cancel(container));
    });

    if let Some(fill) = &gallery.fill {
        let link = link.clone();
        listen(env, owner, fill, "transitionend", move |event| {
            let is_width = event
                .dyn_ref::<TransitionEvent>()
                .map_or(true, |e| e.property_name() == "width");
            if is_width {
                route(&link, "transitionend", |page| {
                    page.on_fill_transition_end(container)
                });
            }
        });
    }

    for (slide, image) in gallery.slides.iter().zip(&gallery.slide_images) {
        let Some(start) = *image else { continue };
        let link = link.clone();
        let images = gallery.images.clone();
        listen(env, owner, slide, "click", move |_| {
            route(&link, "open lightbox", |page| {
                page.open_fullscreen(images.clone(), start, Some(container))
            });
        });
    }
}

/// Wire the lightbox controls
pub fn wire_lightbox(
    env: &Env,
    link: &PageLink,
    lightbox: &DomLightbox,
    document: &web_sys::Document,
    selectors: &crate::config::DomSelectors,
) {
    let find = |selector: &str| -> Option<web_sys::Element> {
        document.query_selector(selector).ok().flatten()
    };

    if let Some(close) = find(&selectors.lightbox_close) {
        let link = link.clone();
        listen(env, Owner::Page, &close, "click", move |_| {
            link.with(|page| page.close_fullscreen());
        });
    }
    if let Some(next) = find(&selectors.lightbox_next) {
        let link = link.clone();
        listen(env, Owner::Page, &next, "click", move |_| {
            link.with(|page| page.fullscreen_next());
        });
    }
    if let Some(prev) = find(&selectors.lightbox_prev) {
        let link = link.clone();
        listen(env, Owner::Page, &prev, "click", move |_| {
            link.with(|page| page.fullscreen_previous());
        });
    }

    // Clicks on the backdrop itself close; clicks on the image don't
    let overlay = JsValue::from(lightbox.overlay().clone());
    let backdrop = link.clone();
    listen(env, Owner::Page, lightbox.overlay(), "click", move |event| {
        let on_backdrop = event
            .target()
            .is_some_and(|t| JsValue::from(t) == overlay);
        if on_backdrop {
            backdrop.with(|page| page.close_fullscreen());
        }
    });
}

/// Wire document keys and the page teardown signal
pub fn wire_page(env: &Env, link: &PageLink, window: &web_sys::Window, document: &web_sys::Document) {
    let keys = link.clone();
    listen(env, Owner::Page, document, "keydown", move |event| {
        let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        if is_editable(event.target()) {
            return;
        }
        let key = Key::from_dom(&event.key());
        if key == Key::Other {
            return;
        }
        if keys.with(|page| page.key(key)) == Some(true) {
            event.prevent_default();
        }
    });

    let teardown = link.clone();
    listen(env, Owner::Page, window, "pagehide", move |event| {
        if page_discarded(&event) {
            teardown.with(|page| page.teardown());
        } else {
            tracing::debug!("page cached, galleries kept");
        }
    });
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;
    use web_sys::{PageTransitionEventInit, Window};

    wasm_bindgen_test_configure!(run_in_browser);

    fn document() -> web_sys::Document {
        web_sys::window()
            .and_then(|w: Window| w.document())
            .unwrap()
    }

    fn element(tag: &str) -> web_sys::Element {
        document().create_element(tag).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_text_fields_keep_their_keys() {
        assert!(is_editable(Some(element("input").into())));
        assert!(is_editable(Some(element("textarea").into())));
        assert!(!is_editable(Some(element("div").into())));
        assert!(!is_editable(None));
    }

    #[wasm_bindgen_test]
    fn test_focus_inside_container_is_kept() {
        let container = element("div");
        let button = element("button");
        container.append_child(&button).unwrap();
        let node: Node = container.clone().into();

        assert!(!focus_leaves(&node, Some(button.into())));
        assert!(focus_leaves(&node, Some(element("input").into())));
        assert!(focus_leaves(&node, None));
    }

    #[wasm_bindgen_test]
    fn test_cached_pagehide_keeps_galleries() {
        let init = PageTransitionEventInit::new();
        init.set_persisted(true);
        let cached = PageTransitionEvent::new_with_event_init_dict("pagehide", &init).unwrap();
        assert!(!page_discarded(&cached));

        let gone = PageTransitionEvent::new("pagehide").unwrap();
        assert!(page_discarded(&gone));
        assert!(page_discarded(&Event::new("pagehide").unwrap()));
    }
}
