//! StudentCollab web front-end.
//!
//! This crate provides the Leptos application for the student/client
//! project marketplace: the navigation bar, the auth modal, guarded pages
//! and the server-side configuration hand-off.

#![allow(non_snake_case)]

pub mod app;
pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod pages;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::App;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
