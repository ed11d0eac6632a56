//! Renderer for common OpenGL state operations
//!
//! Clearing, clear color, depth testing, blending and the viewport. No
//! pipeline or scene management lives here.

use crate::platform::{Capability, ClearMask, GlString, GraphicsApi, Platform};

/// OpenGL state helper
///
/// # Example
/// ```rust,no_run
/// # use crazy::{Platform, Renderer, Window};
/// # let platform = Platform::glfw();
/// # platform.init().unwrap();
/// # let mut window = Window::new(&platform, 640, 480, "render");
/// # window.make_context_current();
/// let mut renderer = Renderer::new(&platform);
/// renderer.set_clear_color(0.1, 0.1, 0.2, 1.0);
///
/// while !window.should_close() {
///     renderer.clear();
///     window.swap_buffers();
/// #   break;
/// }
/// ```
pub struct Renderer {
    gl: Box<dyn GraphicsApi>,
    clear_color: [f32; 4],
    depth_test: bool,
    blending: bool,
}

impl Renderer {
    /// Create a renderer for the platform's current context
    pub fn new(platform: &Platform) -> Self {
        Self::with_api(platform.graphics_api())
    }

    /// Create a renderer over an explicit graphics API
    pub fn with_api(gl: Box<dyn GraphicsApi>) -> Self {
        Self {
            gl,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            depth_test: false,
            blending: false,
        }
    }

    /// Set the clear color (components in 0.0 to 1.0)
    pub fn set_clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.clear_color = [r, g, b, a];
        self.gl.clear_color(r, g, b, a);
    }

    /// Last clear color set
    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Clear the color buffer
    pub fn clear(&mut self) {
        self.gl.clear(ClearMask::COLOR);
    }

    /// Clear the selected buffers; nothing happens if none is selected
    pub fn clear_buffers(&mut self, color: bool, depth: bool, stencil: bool) {
        let mut mask = ClearMask::empty();
        mask.set(ClearMask::COLOR, color);
        mask.set(ClearMask::DEPTH, depth);
        mask.set(ClearMask::STENCIL, stencil);
        if !mask.is_empty() {
            self.gl.clear(mask);
        }
    }

    /// Enable or disable depth testing
    pub fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
        self.gl.set_capability(Capability::DepthTest, enabled);
    }

    /// Whether depth testing was last enabled
    pub fn depth_test(&self) -> bool {
        self.depth_test
    }

    /// Enable or disable alpha blending
    pub fn set_blending(&mut self, enabled: bool) {
        self.blending = enabled;
        self.gl.set_capability(Capability::Blend, enabled);
        if enabled {
            self.gl.blend_func_alpha();
        }
    }

    /// Whether blending was last enabled
    pub fn blending(&self) -> bool {
        self.blending
    }

    /// Set the viewport rectangle
    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.gl.viewport(x, y, width, height);
    }

    /// OpenGL version string
    pub fn opengl_version(&self) -> Option<String> {
        self.gl.get_string(GlString::Version)
    }

    /// OpenGL vendor string
    pub fn opengl_vendor(&self) -> Option<String> {
        self.gl.get_string(GlString::Vendor)
    }

    /// OpenGL renderer string
    pub fn opengl_renderer(&self) -> Option<String> {
        self.gl.get_string(GlString::Renderer)
    }
}
