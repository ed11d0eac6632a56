//! Backend contract for the native windowing and graphics library
//!
//! [`NativeBackend`] is the windowing half (GLFW in production) and
//! [`GraphicsApi`] the OpenGL half. Everything above this module talks to
//! these traits only, so the same window, event and loop code runs against
//! [`GlfwBackend`](super::GlfwBackend) and
//! [`HeadlessBackend`](super::HeadlessBackend).

use bitflags::bitflags;

use super::{NativeEvent, NativeHandle, PlatformResult, WindowSpec};

/// Windowing operations consumed from the native library
///
/// Operations on a handle the backend does not know (destroyed, or never
/// created) are silently ignored and queries return a neutral value.
///
/// # Thread Safety
/// Backends are not `Send`. GLFW requires its calls on the main thread and
/// the framework never leaves it.
pub trait NativeBackend {
    /// Global library initialization
    ///
    /// Also installs the native error reporter. Calling it again after a
    /// successful init is a no-op.
    fn init(&mut self) -> PlatformResult<()>;

    /// Global library teardown; destroys any window still alive
    fn terminate(&mut self);

    /// Create a window with a current-able OpenGL context
    ///
    /// Returns `None` if the native layer refuses.
    fn create_window(&mut self, spec: &WindowSpec) -> Option<NativeHandle>;

    /// Destroy a window and release its context
    fn destroy_window(&mut self, handle: NativeHandle);

    /// Bind the window's context to the calling thread
    fn make_context_current(&mut self, handle: NativeHandle);

    /// Present the back buffer
    fn swap_buffers(&mut self, handle: NativeHandle);

    /// Swap interval for the current context, 0 disables vsync
    fn set_swap_interval(&mut self, interval: u32);

    /// Live framebuffer size in pixels
    fn framebuffer_size(&self, handle: NativeHandle) -> Option<(i32, i32)>;

    /// Close-requested flag
    fn should_close(&self, handle: NativeHandle) -> bool;

    /// Set or clear the close-requested flag
    fn set_should_close(&mut self, handle: NativeHandle, value: bool);

    /// Push a new title to the window decoration
    fn set_title(&mut self, handle: NativeHandle, title: &str);

    /// Start delivering key, mouse-button, cursor-position,
    /// framebuffer-size and close notifications for the window
    fn enable_event_hooks(&mut self, handle: NativeHandle);

    /// Pump the native queue and return everything delivered for hooked windows
    fn poll_events(&mut self) -> Vec<(NativeHandle, NativeEvent)>;

    /// Seconds since library init
    fn time(&self) -> f64;

    /// OpenGL entry points for the current context
    fn graphics_api(&self) -> Box<dyn GraphicsApi>;
}

bitflags! {
    /// Buffers selected by a clear call
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClearMask: u32 {
        /// Color buffer
        const COLOR = 0b001;
        /// Depth buffer
        const DEPTH = 0b010;
        /// Stencil buffer
        const STENCIL = 0b100;
    }
}

/// Server-side capabilities toggled by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Depth testing
    DepthTest,
    /// Color blending
    Blend,
}

/// Driver strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlString {
    /// `GL_VERSION`
    Version,
    /// `GL_VENDOR`
    Vendor,
    /// `GL_RENDERER`
    Renderer,
}

/// OpenGL calls consumed by [`Renderer`](crate::Renderer)
pub trait GraphicsApi {
    /// `glClearColor`
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);

    /// `glClear`
    fn clear(&mut self, mask: ClearMask);

    /// `glEnable` / `glDisable`
    fn set_capability(&mut self, capability: Capability, enabled: bool);

    /// `glBlendFunc(GL_SRC_ALPHA, GL_ONE_MINUS_SRC_ALPHA)`
    fn blend_func_alpha(&mut self);

    /// `glViewport`
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// `glGetString`, `None` without a loaded context
    fn get_string(&self, name: GlString) -> Option<String>;
}
