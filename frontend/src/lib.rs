//! imgdrop - Frontend Rust/Leptos Application
//!
//! A WebAssembly front end for attaching an ordered set of images to a
//! post, with drag-to-reorder and background uploads.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        App (Router)                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  /posts/:post_id/edit → EditPostPage                         │
//! │  └── ImageUpload                                             │
//! │      ├── dropzone / file picker                              │
//! │      ├── tiles (thumbnail, progress ring, ✏️, 🗑️)             │
//! │      └── ImageMetaPopover                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`] - Common types (TileView, AppError)
//! - [`components`] - UI components (ImageUpload, ImageMetaPopover, EditPostPage)
//! - [`services`] - Backend communication (image upload)

use leptos::*;
use leptos_meta::provide_meta_context;
use leptos_router::*;
use wasm_bindgen::prelude::*;

// =============================================================================
// Module declarations
// =============================================================================

pub mod components;
pub mod config;
pub mod services;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

// Configuration
pub use config::*;

// Types
pub use types::{AppError, AppResult, TileView};

// Components
pub use components::*;

// Services
pub use services::*;

// =============================================================================
// Application Entry Point
// =============================================================================

/// WASM entry point - called automatically by trunk.
#[wasm_bindgen(start)]
pub fn main() {
    // Setup panic hook for better error messages
    console_error_panic_hook::set_once();

    // Setup console logging
    _ = console_log::init_with_level(log::Level::Debug);

    log::info!("🦀 imgdrop - Starting Leptos App");

    mount_to_body(|| view! { <App/> });
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Router>
            <main>
                <Routes>
                    <Route path="/posts/:post_id/edit" view=EditPostPage/>
                    <Route path="/*any" view=NotFound/>
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="container">
            <div class="error-message">"Page not found. Open /posts/<id>/edit to edit a post."</div>
        </div>
    }
}
