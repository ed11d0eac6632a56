//! Native platform layer
//!
//! Wraps one [`NativeBackend`] behind a cheaply clonable [`Platform`]
//! handle and keeps the per-window user-data slots that event handlers
//! register themselves in.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │ Window / EventHandler / Application │
//! └─────────────────┬───────────────────┘
//!                   │ Uses
//!            ┌──────▼──────┐
//!            │  Platform   │ ← user-data slots, global init/terminate
//!            └──────┬──────┘
//!                   │ Owns
//!          ┌────────▼────────┐
//!          │ NativeBackend   │ ← trait (backend.rs)
//!          └────────┬────────┘
//!                   │ Implemented by
//!   ┌───────────────▼───────────────┐
//!   │ GlfwBackend     (glfw + gl)   │
//!   │ HeadlessBackend (in-process)  │
//!   └───────────────────────────────┘
//! ```
//!
//! The platform is single-threaded: it is built on `Rc` and `RefCell` and
//! never borrows the backend across a listener call.

pub mod backend;
pub mod glfw_backend;
pub mod headless;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SecondaryMap};
use thiserror::Error;

use crate::events::HandlerSlot;
use crate::events::{Key, Modifiers, MouseButton};

pub use backend::{Capability, ClearMask, GlString, GraphicsApi, NativeBackend};
pub use glfw_backend::GlfwBackend;
pub use headless::{GlCall, HeadlessBackend, HeadlessControl};

new_key_type! {
    /// Identity of one native window
    ///
    /// Keys are generational, so a handle of a destroyed window never
    /// aliases a window created later.
    pub struct NativeHandle;
}

/// OpenGL context version requested for every window
pub const CONTEXT_VERSION: (u32, u32) = (3, 3);

/// Platform errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Global native library init failed
    #[error("Native library initialization failed: {0}")]
    InitFailed(String),

    /// The native layer refused to create a window
    #[error("Window creation failed: {title}")]
    WindowCreationFailed {
        /// Title of the window that was requested
        title: String,
    },
}

/// Platform result type
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Parameters for a native window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Title
    pub title: String,
    /// OpenGL context version (major, minor), core profile
    pub context_version: (u32, u32),
    /// Request a forward-compatible context
    pub forward_compat: bool,
}

impl WindowSpec {
    /// Spec with the fixed context configuration
    ///
    /// 3.3 core profile everywhere; forward-compatible on macOS, which
    /// refuses core contexts without it.
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            context_version: CONTEXT_VERSION,
            forward_compat: cfg!(target_os = "macos"),
        }
    }
}

/// Raw payload of one native callback
///
/// Action codes are the native ones: release = 0, press = 1, repeat = 2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeEvent {
    /// Key callback
    Key {
        /// Key code
        key: Key,
        /// Platform scancode
        scancode: i32,
        /// Raw action code
        action: i32,
        /// Modifier bits
        mods: Modifiers,
    },
    /// Mouse button callback
    MouseButton {
        /// Button id
        button: MouseButton,
        /// Raw action code
        action: i32,
        /// Modifier bits
        mods: Modifiers,
    },
    /// Cursor position callback
    CursorPos {
        /// Cursor x in screen coordinates
        x: f64,
        /// Cursor y in screen coordinates
        y: f64,
    },
    /// Framebuffer size callback
    FramebufferSize {
        /// New width in pixels
        width: i32,
        /// New height in pixels
        height: i32,
    },
    /// Close request callback
    Close,
}

/// Raw action codes
pub mod action {
    /// Key or button released
    pub const RELEASE: i32 = 0;
    /// Key or button pressed
    pub const PRESS: i32 = 1;
    /// Key held down long enough to repeat
    pub const REPEAT: i32 = 2;
}

struct PlatformInner {
    backend: RefCell<Box<dyn NativeBackend>>,
    user_data: RefCell<SecondaryMap<NativeHandle, HandlerSlot>>,
    initialized: Cell<bool>,
}

/// Shared handle to the native library
///
/// Clones refer to the same backend.
#[derive(Clone)]
pub struct Platform {
    inner: Rc<PlatformInner>,
}

impl Platform {
    /// Wrap a backend; nothing is initialized yet
    pub fn new(backend: Box<dyn NativeBackend>) -> Self {
        Self {
            inner: Rc::new(PlatformInner {
                backend: RefCell::new(backend),
                user_data: RefCell::new(SecondaryMap::new()),
                initialized: Cell::new(false),
            }),
        }
    }

    /// Platform over GLFW
    pub fn glfw() -> Self {
        Self::new(Box::new(GlfwBackend::new()))
    }

    /// Global native init
    pub fn init(&self) -> PlatformResult<()> {
        if self.inner.initialized.get() {
            return Ok(());
        }
        self.inner.backend.borrow_mut().init().map_err(|err| {
            log::error!("Failed to initialize native library: {err}");
            err
        })?;
        self.inner.initialized.set(true);
        log::debug!("Native library initialized");
        Ok(())
    }

    /// Global native teardown, idempotent
    pub fn terminate(&self) {
        if !self.inner.initialized.replace(false) {
            return;
        }
        self.inner.user_data.borrow_mut().clear();
        self.inner.backend.borrow_mut().terminate();
        log::debug!("Native library terminated");
    }

    /// Whether `init` succeeded and `terminate` has not run since
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.get()
    }

    /// Seconds since library init
    pub fn time(&self) -> f64 {
        self.inner.backend.borrow().time()
    }

    /// OpenGL entry points for the current context
    pub fn graphics_api(&self) -> Box<dyn GraphicsApi> {
        self.inner.backend.borrow().graphics_api()
    }

    /// Pump the native queue
    ///
    /// The backend borrow ends before this returns, so callers may invoke
    /// listeners that call back into the platform.
    pub(crate) fn poll_events(&self) -> Vec<(NativeHandle, NativeEvent)> {
        self.inner.backend.borrow_mut().poll_events()
    }

    pub(crate) fn with_backend<R>(&self, f: impl FnOnce(&mut dyn NativeBackend) -> R) -> R {
        f(&mut **self.inner.backend.borrow_mut())
    }

    pub(crate) fn with_backend_ref<R>(&self, f: impl FnOnce(&dyn NativeBackend) -> R) -> R {
        f(&**self.inner.backend.borrow())
    }

    /// Store the back-reference for a window, replacing any previous one
    pub(crate) fn set_user_data(&self, handle: NativeHandle, slot: HandlerSlot) {
        if self.inner.user_data.borrow_mut().insert(handle, slot).is_some() {
            log::debug!("Replacing event handler registered on {handle:?}");
        }
    }

    pub(crate) fn user_data(&self, handle: NativeHandle) -> Option<HandlerSlot> {
        self.inner.user_data.borrow().get(handle).cloned()
    }

    pub(crate) fn clear_user_data(&self, handle: NativeHandle) {
        self.inner.user_data.borrow_mut().remove(handle);
    }

    /// Whether the window is alive and its slot points at `slot`
    pub(crate) fn user_data_is(&self, handle: NativeHandle, slot: &HandlerSlot) -> bool {
        self.inner
            .user_data
            .borrow()
            .get(handle)
            .is_some_and(|current| current.ptr_eq(slot))
    }

    /// Clear the slot only if it still points at `slot`
    pub(crate) fn clear_user_data_if(&self, handle: NativeHandle, slot: &HandlerSlot) {
        if self.user_data_is(handle, slot) {
            self.inner.user_data.borrow_mut().remove(handle);
        }
    }

    pub(crate) fn downgrade(&self) -> WeakPlatform {
        WeakPlatform {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// Non-owning platform reference held by handles that may outlive it
#[derive(Clone)]
pub(crate) struct WeakPlatform {
    inner: Weak<PlatformInner>,
}

impl WeakPlatform {
    pub(crate) fn upgrade(&self) -> Option<Platform> {
        self.inner.upgrade().map(|inner| Platform { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let (backend, control) = HeadlessBackend::new();
        let platform = Platform::new(Box::new(backend));
        assert!(!platform.is_initialized());
        platform.init().unwrap();
        platform.init().unwrap();
        assert!(platform.is_initialized());
        assert_eq!(control.init_calls(), 1);
    }

    #[test]
    fn test_init_failure_is_reported() {
        let (backend, control) = HeadlessBackend::new();
        control.fail_init(true);
        let platform = Platform::new(Box::new(backend));
        assert!(matches!(platform.init(), Err(PlatformError::InitFailed(_))));
        assert!(!platform.is_initialized());
    }

    #[test]
    fn test_terminate_only_after_init() {
        let (backend, control) = HeadlessBackend::new();
        let platform = Platform::new(Box::new(backend));
        platform.terminate();
        assert_eq!(control.terminate_calls(), 0);
        platform.init().unwrap();
        platform.terminate();
        platform.terminate();
        assert_eq!(control.terminate_calls(), 1);
    }

    #[test]
    fn test_window_spec_context() {
        let spec = WindowSpec::new(640, 480, "spec");
        assert_eq!(spec.context_version, (3, 3));
        assert_eq!(spec.forward_compat, cfg!(target_os = "macos"));
    }

    #[test]
    fn test_weak_platform_dies_with_platform() {
        let (backend, _control) = HeadlessBackend::new();
        let platform = Platform::new(Box::new(backend));
        let weak = platform.downgrade();
        assert!(weak.upgrade().is_some());
        drop(platform);
        assert!(weak.upgrade().is_none());
    }
}
