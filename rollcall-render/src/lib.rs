//! # rollcall-render
//!
//! Tera-based payload templating for downstream create/update/patch bodies.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rollcall_core::Person;
//! use rollcall_render::{PayloadContext, PayloadRenderer};
//!
//! fn render(person: &Person) {
//!     let renderer = PayloadRenderer::new([("create", r#"{"userName":{{ email | json_encode() }}}"#)]);
//!     if let Ok(renderer) = renderer {
//!         let ctx = PayloadContext::for_person(person);
//!         if let Ok(body) = renderer.render("create", &ctx) {
//!             println!("{body}");
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::PayloadContext;
pub use engine::PayloadRenderer;
pub use error::RenderError;
