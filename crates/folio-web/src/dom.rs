//! DOM views and gallery discovery
//!
//! Implements the core view traits on real elements. Views only render;
//! they never hold a reference to the page.

use folio_core::{
    ContainerId, FolioError, FolioResult, GalleryMount, ImageRef, LightboxView, Millis,
    ProgressBar, SlideView,
};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlImageElement, Window};

use crate::config::DomSelectors;

fn set_style(el: &HtmlElement, property: &str, value: &str) {
    if let Err(err) = el.style().set_property(property, value) {
        tracing::trace!(property, ?err, "style update failed");
    }
}

fn toggle_class(el: &Element, class: &str, on: bool) {
    if let Err(err) = el.class_list().toggle_with_force(class, on) {
        tracing::trace!(class, ?err, "class toggle failed");
    }
}

/// All elements matching `selector` under `root`, as `HtmlElement`s
fn query_all(root: &Element, selector: &str) -> Vec<HtmlElement> {
    let Ok(list) = root.query_selector_all(selector) else {
        tracing::warn!(selector, "invalid selector");
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .collect()
}

fn query_one(root: &Element, selector: &str) -> Option<HtmlElement> {
    root.query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

fn percent(fraction: f64) -> String {
    format!("{:.3}%", fraction.clamp(0.0, 1.0) * 100.0)
}

// =============================================================================
// Progress fill
// =============================================================================

/// Progress fill rendered through the element's `width`
///
/// A gallery without a fill element still autoplays; completion then comes
/// from the guard timer alone.
pub struct DomProgressBar {
    window: Window,
    fill: Option<HtmlElement>,
}

impl DomProgressBar {
    pub fn new(window: Window, fill: Option<HtmlElement>) -> Self {
        Self { window, fill }
    }
}

impl ProgressBar for DomProgressBar {
    fn animate_fill(&mut self, from: f64, to: f64, duration_ms: Millis) {
        let Some(fill) = &self.fill else { return };
        set_style(fill, "transition", "none");
        set_style(fill, "width", &percent(from));
        // Force a reflow so the start width is committed before the transition
        let _ = fill.offset_width();
        set_style(
            fill,
            "transition",
            &format!("width {}ms linear", duration_ms.max(0.0).round()),
        );
        set_style(fill, "width", &percent(to));
    }

    fn set_fill(&mut self, fraction: f64) {
        let Some(fill) = &self.fill else { return };
        set_style(fill, "transition", "none");
        set_style(fill, "width", &percent(fraction));
    }

    fn rendered_fill(&self) -> Option<f64> {
        let fill = self.fill.as_ref()?;
        let style = self.window.get_computed_style(fill).ok().flatten()?;
        let width: f64 = style
            .get_property_value("width")
            .ok()?
            .trim_end_matches("px")
            .parse()
            .ok()?;
        let track = fill.parent_element()?.get_bounding_client_rect().width();
        if track > 0.0 && width.is_finite() {
            Some(width / track)
        } else {
            None
        }
    }

    fn set_compositor_hint(&mut self, enabled: bool) {
        if let Some(fill) = &self.fill {
            set_style(fill, "will-change", if enabled { "width" } else { "auto" });
        }
    }
}

// =============================================================================
// Slides
// =============================================================================

/// Slides and dots toggled with the active class
pub struct DomSlides {
    slides: Vec<HtmlElement>,
    dots: Vec<HtmlElement>,
    active_class: String,
}

impl SlideView for DomSlides {
    fn show_slide(&mut self, index: usize, _count: usize, animate: bool) {
        for (i, slide) in self.slides.iter().enumerate() {
            if animate {
                let _ = slide.style().remove_property("transition");
            } else {
                set_style(slide, "transition", "none");
            }
            toggle_class(slide, &self.active_class, i == index);
            if let Err(err) = slide.set_attribute("aria-hidden", if i == index { "false" } else { "true" }) {
                tracing::trace!(?err, "aria update failed");
            }
        }
        for (i, dot) in self.dots.iter().enumerate() {
            toggle_class(dot, &self.active_class, i == index);
        }
    }
}

// =============================================================================
// Lightbox
// =============================================================================

/// Lightbox overlay toggled with the open class
pub struct DomLightbox {
    overlay: HtmlElement,
    image: Option<HtmlImageElement>,
    open_class: String,
}

impl DomLightbox {
    /// Find the overlay in `document`
    pub fn find(document: &Document, selectors: &DomSelectors) -> FolioResult<Self> {
        let overlay = document
            .query_selector(&selectors.lightbox)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .ok_or_else(|| FolioError::Dom(format!("no lightbox matches {}", selectors.lightbox)))?;
        let image = document
            .query_selector(&selectors.lightbox_image)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlImageElement>().ok());
        Ok(Self {
            overlay,
            image,
            open_class: selectors.lightbox_open_class.clone(),
        })
    }

    /// The overlay element
    pub fn overlay(&self) -> &HtmlElement {
        &self.overlay
    }
}

impl LightboxView for DomLightbox {
    fn show(&mut self, image: &ImageRef, index: usize, count: usize) {
        if let Some(img) = &self.image {
            img.set_src(&image.src);
            img.set_alt(&image.alt);
        }
        let _ = self
            .overlay
            .set_attribute("data-position", &format!("{} / {}", index + 1, count));
        toggle_class(&self.overlay, &self.open_class, true);
    }

    fn hide(&mut self) {
        toggle_class(&self.overlay, &self.open_class, false);
    }
}

/// Stand-in used when the document has no lightbox markup
pub struct NoLightbox;

impl LightboxView for NoLightbox {
    fn show(&mut self, _image: &ImageRef, _index: usize, _count: usize) {}
    fn hide(&mut self) {}
}

// =============================================================================
// Discovery
// =============================================================================

/// One gallery container found in the document
#[derive(Clone)]
pub struct DiscoveredGallery {
    pub container: ContainerId,
    pub element: HtmlElement,
    pub slides: Vec<HtmlElement>,
    pub dots: Vec<HtmlElement>,
    pub fill: Option<HtmlElement>,
    pub next: Option<HtmlElement>,
    pub prev: Option<HtmlElement>,
    pub toggle: Option<HtmlElement>,
    /// Lightbox images, one per slide that has one
    pub images: Vec<ImageRef>,
    /// For each slide, its position in `images`
    pub slide_images: Vec<Option<usize>>,
}

impl DiscoveredGallery {
    /// Views for mounting this gallery
    pub fn mount(&self, window: &Window, selectors: &DomSelectors) -> GalleryMount {
        GalleryMount {
            container: self.container,
            slide_count: self.slides.len(),
            slides: Box::new(DomSlides {
                slides: self.slides.clone(),
                dots: self.dots.clone(),
                active_class: selectors.active_class.clone(),
            }),
            progress: Box::new(DomProgressBar::new(window.clone(), self.fill.clone())),
        }
    }
}

/// Lightbox image for a slide: `data-full` wins over the `<img>` source
fn slide_image(slide: &HtmlElement) -> Option<ImageRef> {
    let img = slide
        .query_selector("img")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlImageElement>().ok());
    let src = slide
        .get_attribute("data-full")
        .or_else(|| img.as_ref().map(|i| i.src()))
        .filter(|s| !s.is_empty())?;
    let alt = img.map(|i| i.alt()).unwrap_or_default();
    Some(ImageRef::new(src, alt))
}

/// Collect the slides' images, remembering where each slide's image landed
fn index_images(per_slide: Vec<Option<ImageRef>>) -> (Vec<ImageRef>, Vec<Option<usize>>) {
    let mut images = Vec::new();
    let positions = per_slide
        .into_iter()
        .map(|image| {
            image.map(|image| {
                images.push(image);
                images.len() - 1
            })
        })
        .collect();
    (images, positions)
}

/// Find every gallery container in document order.
///
/// Containers are numbered from 1 in document order. A container without
/// slides is still returned; mounting it fails and is logged.
pub fn discover(document: &Document, selectors: &DomSelectors) -> Vec<DiscoveredGallery> {
    let Some(root) = document.document_element() else {
        return Vec::new();
    };
    query_all(&root, &selectors.container)
        .into_iter()
        .zip(1u32..)
        .map(|(element, n)| {
            let slides = query_all(&element, &selectors.slide);
            let (images, slide_images) = index_images(slides.iter().map(slide_image).collect());
            DiscoveredGallery {
                container: ContainerId(n),
                dots: query_all(&element, &selectors.dot),
                fill: query_one(&element, &selectors.progress_fill),
                next: query_one(&element, &selectors.next_button),
                prev: query_one(&element, &selectors.prev_button),
                toggle: query_one(&element, &selectors.toggle_button),
                slides,
                images,
                slide_images,
                element,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slides_without_images_keep_indices_aligned() {
        let (images, positions) = index_images(vec![
            Some(ImageRef::new("a.jpg", "")),
            None,
            Some(ImageRef::new("c.jpg", "")),
        ]);
        assert_eq!(images.len(), 2);
        assert_eq!(positions, vec![Some(0), None, Some(1)]);
        assert_eq!(images[positions[2].unwrap()].src, "c.jpg");
    }
}
