//! Browser tests, run with `wasm-pack test --headless --firefox`

#![cfg(target_arch = "wasm32")]

use folio_web::{DomSelectors, WebConfig};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn config_parses_in_browser() {
    let config = WebConfig::from_json(Some(r#"{ "selectors": { "container": ".work" } }"#)).unwrap();
    assert_eq!(config.selectors.container, ".work");
    assert_eq!(config.selectors.slide, DomSelectors::default().slide);
}

#[wasm_bindgen_test]
fn portfolio_starts_on_empty_document() {
    let mut portfolio = folio_web::Portfolio::new(None).unwrap();
    assert_eq!(portfolio.start().unwrap(), 0);
    assert_eq!(portfolio.start().unwrap(), 0);
    assert!(portfolio.teardown());
    assert!(!portfolio.teardown());
}
