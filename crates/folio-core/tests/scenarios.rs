//! End-to-end gallery scenarios on a headless host

use folio_core::{
    AdvanceTarget, CarouselState, ContainerId, FolioError, HeadlessHost, ImageRef,
    ObservationMode, PageConfig, PauseReasons, PauseSource, Task, TaskKind,
};

const GALLERY: ContainerId = ContainerId(1);

fn images(n: usize) -> Vec<ImageRef> {
    (0..n)
        .map(|i| ImageRef::new(format!("photo-{i}.webp"), format!("Photo {i}")))
        .collect()
}

fn no_settle() -> PageConfig {
    let mut config = PageConfig::default();
    config.carousel.settle_delay_ms = 0.0;
    config
}

#[test]
fn basic_loop_wraps_after_four_slides() {
    let mut host = HeadlessHost::new(no_settle());
    let gallery = host.mount(GALLERY, 4).unwrap();
    host.scroll_into_view(GALLERY);
    host.advance_by(0.0);
    assert_eq!(gallery.slides.last(), Some(0));

    for (step, expected) in [1, 2, 3, 0].into_iter().enumerate() {
        assert!(host.finish_fill(GALLERY).unwrap());
        let t = 5000.0 * (step as f64 + 1.0);
        assert_eq!(host.now(), t);
        assert_eq!(gallery.slides.last(), Some(expected));
        assert_eq!(gallery.fill.fill(), 0.0, "fill reset at t={t}");
    }
    assert_eq!(host.page().instance(GALLERY).unwrap().auto_advances(), 4);
}

#[test]
fn guard_advances_when_transition_end_never_arrives() {
    let mut host = HeadlessHost::new(no_settle());
    let gallery = host.mount(GALLERY, 4).unwrap();
    host.scroll_into_view(GALLERY);
    host.advance_by(0.0);

    host.run_until(4999.0);
    assert_eq!(gallery.slides.last(), Some(0));
    host.run_until(5200.0);
    assert_eq!(gallery.slides.last(), Some(1));
}

#[test]
fn viewport_interruption_resumes_with_remaining_time() {
    let mut host = HeadlessHost::new(PageConfig::default());
    let gallery = host.mount(GALLERY, 4).unwrap();
    host.scroll_into_view(GALLERY);
    host.advance_by(100.0);

    host.advance_by(2000.0);
    host.scroll_out_of_view(GALLERY);
    let instance = host.page().instance(GALLERY).unwrap();
    assert_eq!(instance.state(), CarouselState::Paused(PauseReasons::VIEWPORT));
    assert!((gallery.fill.fill() - 0.4).abs() < 1e-6);
    assert!((instance.elapsed_at_last_pause() - 2000.0).abs() < 1e-6);

    host.advance_by(10_000.0);
    assert!((gallery.fill.fill() - 0.4).abs() < 1e-6);
    assert_eq!(gallery.slides.last(), Some(0));

    host.scroll_into_view(GALLERY);
    let deadline = host
        .page()
        .instance(GALLERY)
        .unwrap()
        .autoplay_deadline()
        .unwrap();
    assert!((deadline - (host.now() + 3000.0)).abs() < 1e-6);

    host.advance_by(2900.0);
    assert_eq!(gallery.slides.last(), Some(0));
    host.advance_by(300.0 + 1.0);
    assert_eq!(gallery.slides.last(), Some(1));
}

#[test]
fn fullscreen_before_first_visibility() {
    let mut host = HeadlessHost::new(PageConfig::default());
    let gallery = host.mount(GALLERY, 3).unwrap();

    host.page_mut()
        .open_fullscreen(images(5), 2, Some(GALLERY))
        .unwrap();
    assert_eq!(
        host.page().instance(GALLERY).unwrap().state(),
        CarouselState::Uninitialized
    );
    assert_eq!(host.lightbox().shown(), Some(("photo-2.webp".into(), 2, 5)));

    host.scroll_into_view(GALLERY);
    let instance = host.page().instance(GALLERY).unwrap();
    assert!(instance.is_initialized());
    assert_eq!(instance.state(), CarouselState::Paused(PauseReasons::FULLSCREEN));

    host.advance_by(20_000.0);
    assert_eq!(gallery.slides.last(), Some(0));
    assert!(!host.page().instance(GALLERY).unwrap().is_timer_running());

    assert!(host.page_mut().close_fullscreen());
    host.advance_by(150.0);
    assert!(host.page().instance(GALLERY).unwrap().is_timer_running());

    host.advance_by(5200.0);
    assert_eq!(gallery.slides.last(), Some(1));
}

#[test]
fn lightbox_navigation_leaves_gallery_alone() {
    let mut host = HeadlessHost::new(PageConfig::default());
    let gallery = host.mount(GALLERY, 3).unwrap();
    host.scroll_into_view(GALLERY);
    host.page_mut()
        .open_fullscreen(images(4), 0, Some(GALLERY))
        .unwrap();

    assert_eq!(host.page_mut().fullscreen_next(), Some(1));
    assert_eq!(host.page_mut().fullscreen_previous(), Some(0));
    assert_eq!(host.page_mut().fullscreen_previous(), Some(3));
    assert_eq!(gallery.slides.last(), Some(0));
}

#[test]
fn transition_end_and_guard_advance_once() {
    let mut host = HeadlessHost::new(no_settle());
    let gallery = host.mount(GALLERY, 4).unwrap();
    host.scroll_into_view(GALLERY);
    host.advance_by(0.0);

    assert!(host.finish_fill(GALLERY).unwrap());
    assert!(!host.page_mut().on_fill_transition_end(GALLERY).unwrap());
    host.advance_by(200.0);
    assert_eq!(gallery.slides.history(), vec![0, 1]);
    assert_eq!(host.page().instance(GALLERY).unwrap().auto_advances(), 1);
}

#[test]
fn late_transition_end_after_guard_is_ignored() {
    let mut host = HeadlessHost::new(no_settle());
    let gallery = host.mount(GALLERY, 4).unwrap();
    host.scroll_into_view(GALLERY);
    host.advance_by(0.0);

    host.run_until(5200.0);
    assert_eq!(gallery.slides.last(), Some(1));
    assert!(!host.page_mut().on_fill_transition_end(GALLERY).unwrap());
    assert_eq!(gallery.slides.last(), Some(1));
}

#[test]
fn pause_composition_needs_every_source_cleared() {
    let mut host = HeadlessHost::new(PageConfig::default());
    host.mount(GALLERY, 3).unwrap();
    host.scroll_into_view(GALLERY);
    host.advance_by(100.0);

    let page = host.page_mut();
    page.request_pause(GALLERY, PauseSource::Viewport).unwrap();
    page.request_pause(GALLERY, PauseSource::Manual).unwrap();
    page.request_resume(GALLERY, PauseSource::Viewport).unwrap();
    assert!(!page.instance(GALLERY).unwrap().is_timer_running());

    page.request_resume(GALLERY, PauseSource::Manual).unwrap();
    assert!(page.instance(GALLERY).unwrap().is_timer_running());
}

#[test]
fn manual_slide_change_while_paused_restarts_from_zero() {
    let mut host = HeadlessHost::new(PageConfig::default());
    let gallery = host.mount(GALLERY, 3).unwrap();
    host.scroll_into_view(GALLERY);
    host.advance_by(100.0 + 3000.0);

    host.scroll_out_of_view(GALLERY);
    host.page_mut()
        .advance(GALLERY, AdvanceTarget::Index(2))
        .unwrap();
    assert_eq!(gallery.fill.fill(), 0.0);

    host.scroll_into_view(GALLERY);
    let deadline = host
        .page()
        .instance(GALLERY)
        .unwrap()
        .autoplay_deadline()
        .unwrap();
    assert_eq!(deadline, host.now() + 5000.0);
}

#[test]
fn stale_callbacks_after_teardown_are_discarded() {
    let mut host = HeadlessHost::new(PageConfig::default());
    let gallery = host.mount(GALLERY, 3).unwrap();
    host.scroll_into_view(GALLERY);
    host.advance_by(100.0);

    assert!(host.page_mut().teardown());
    assert!(!host
        .page_mut()
        .dispatch(Task::new(gallery.id, TaskKind::FillGuard { generation: 1 })));
    assert!(!host.page_mut().on_fill_transition_end(GALLERY).unwrap());
    assert_eq!(
        host.page_mut().open_fullscreen(images(1), 0, None),
        Err(FolioError::TornDown)
    );
    host.advance_by(60_000.0);
    assert_eq!(gallery.slides.last(), Some(0));
}

#[test]
fn low_tier_swaps_slides_without_animation() {
    let config: PageConfig =
        PageConfig::from_json(r#"{ "tier": "low", "carousel": { "settle_delay_ms": 50 } }"#)
            .unwrap();
    let mut host = HeadlessHost::new(config);
    let gallery = host.mount(GALLERY, 2).unwrap();
    host.scroll_into_view(GALLERY);

    host.advance_by(99.0);
    assert!(!host.page().instance(GALLERY).unwrap().is_timer_running());
    host.advance_by(1.0);
    assert!(host.page().instance(GALLERY).unwrap().is_timer_running());

    host.page_mut().advance(GALLERY, AdvanceTarget::Next).unwrap();
    assert_eq!(gallery.slides.last_animated(), Some(false));
}

#[test]
fn without_an_observer_galleries_start_at_mount_and_ignore_viewport() {
    let mut host = HeadlessHost::with_mode(PageConfig::default(), ObservationMode::AlwaysVisible);
    let gallery = host.mount(GALLERY, 3).unwrap();

    let instance = host.page().instance(GALLERY).unwrap();
    assert!(instance.is_initialized());
    assert!(instance.is_settling());
    assert_eq!(gallery.slides.last(), Some(0));

    host.scroll_out_of_view(GALLERY);
    let instance = host.page().instance(GALLERY).unwrap();
    assert!(!instance.is_paused_by(PauseSource::Viewport));
    assert_eq!(instance.state(), CarouselState::Playing);

    host.advance_by(100.0);
    assert!(host.page().instance(GALLERY).unwrap().is_timer_running());
    host.run_until(100.0 + 5000.0 + 200.0);
    assert_eq!(gallery.slides.last(), Some(1));
}
