//! # Crazy
//!
//! A thin application framework over GLFW windows and OpenGL 3.3 core
//! contexts.
//!
//! ## Features
//!
//! - **Window**: owned native window with its OpenGL context
//! - **Events**: per-kind keyboard, mouse and window listeners
//! - **Application**: lifecycle callbacks around a fixed frame loop
//! - **Renderer**: clear color, clearing, depth test, blending, viewport
//! - **Headless backend**: the whole stack without a display, for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crazy::prelude::*;
//!
//! fn main() {
//!     crazy::foundation::logging::init();
//!
//!     let mut app = Application::new(800, 600, "Quick Start");
//!
//!     app.set_render_callback(|renderer| {
//!         renderer.set_clear_color(0.2, 0.3, 0.3, 1.0);
//!         renderer.clear();
//!     });
//!
//!     let close = app.close_handle();
//!     if let Some(events) = app.event_handler_mut() {
//!         events.set_key_press_callback(move |event| {
//!             if event.key == Key::ESCAPE {
//!                 close.request_close();
//!             }
//!         });
//!     }
//!
//!     std::process::exit(app.run());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod events;
pub mod foundation;
pub mod platform;
pub mod render;
pub mod window;

mod application;

pub use application::{AppError, AppState, Application};
pub use config::{AppConfig, Config, ConfigError, LoggingConfig, WindowConfig};
pub use events::{
    EventHandler, EventType, Key, KeyEvent, Modifiers, MouseButton, MouseButtonEvent,
    MouseMoveEvent, WindowResizeEvent,
};
pub use platform::{Platform, PlatformError};
pub use render::Renderer;
pub use window::{CloseHandle, Window};

/// Common imports for framework users
pub mod prelude {
    pub use crate::{
        AppConfig, AppError, AppState, Application, CloseHandle, EventHandler, EventType, Key,
        KeyEvent, Modifiers, MouseButton, MouseButtonEvent, MouseMoveEvent, Platform, Renderer,
        Window, WindowResizeEvent,
        foundation::time::FrameTimer,
    };
}
