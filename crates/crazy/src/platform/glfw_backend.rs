//! Window management using GLFW
//!
//! Provides window creation with an OpenGL context, polled event delivery
//! and the OpenGL entry points loaded through GLFW.

use std::ffi::CStr;

use glfw::Context as _;
use slotmap::SlotMap;

use super::backend::{Capability, ClearMask, GlString, GraphicsApi, NativeBackend};
use super::{NativeEvent, NativeHandle, PlatformError, PlatformResult, WindowSpec};
use crate::events::{Key, Modifiers, MouseButton};

/// GLFW error callback
fn log_glfw_error(error: glfw::Error, description: String) {
    log::error!("GLFW Error {error:?}: {description}");
}

struct GlfwWindow {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

/// GLFW-backed [`NativeBackend`]
///
/// Must be created and used on the main thread.
#[derive(Default)]
pub struct GlfwBackend {
    glfw: Option<glfw::Glfw>,
    windows: SlotMap<NativeHandle, GlfwWindow>,
    gl_loaded: bool,
}

impl GlfwBackend {
    /// Create an uninitialized backend
    pub fn new() -> Self {
        Self::default()
    }
}

impl NativeBackend for GlfwBackend {
    fn init(&mut self) -> PlatformResult<()> {
        if self.glfw.is_some() {
            return Ok(());
        }
        let glfw = glfw::init(log_glfw_error)
            .map_err(|err| PlatformError::InitFailed(format!("{err:?}")))?;
        self.glfw = Some(glfw);
        Ok(())
    }

    fn terminate(&mut self) {
        // Windows hold their own library reference; GLFW terminates once
        // the last one is gone.
        self.windows.clear();
        self.glfw = None;
        self.gl_loaded = false;
    }

    fn create_window(&mut self, spec: &WindowSpec) -> Option<NativeHandle> {
        let glfw = self.glfw.as_mut()?;

        let (major, minor) = spec.context_version;
        glfw.window_hint(glfw::WindowHint::ContextVersion(major, minor));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        if spec.forward_compat {
            glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        }

        let (window, events) =
            glfw.create_window(spec.width, spec.height, &spec.title, glfw::WindowMode::Windowed)?;
        Some(self.windows.insert(GlfwWindow { window, events }))
    }

    fn destroy_window(&mut self, handle: NativeHandle) {
        self.windows.remove(handle);
    }

    fn make_context_current(&mut self, handle: NativeHandle) {
        let Some(entry) = self.windows.get_mut(handle) else {
            return;
        };
        entry.window.make_current();
        if !self.gl_loaded {
            gl::load_with(|symbol| entry.window.get_proc_address(symbol) as *const _);
            self.gl_loaded = true;
        }
    }

    fn swap_buffers(&mut self, handle: NativeHandle) {
        if let Some(entry) = self.windows.get_mut(handle) {
            entry.window.swap_buffers();
        }
    }

    fn set_swap_interval(&mut self, interval: u32) {
        if let Some(glfw) = self.glfw.as_mut() {
            let interval = if interval == 0 {
                glfw::SwapInterval::None
            } else {
                glfw::SwapInterval::Sync(interval)
            };
            glfw.set_swap_interval(interval);
        }
    }

    fn framebuffer_size(&self, handle: NativeHandle) -> Option<(i32, i32)> {
        self.windows
            .get(handle)
            .map(|entry| entry.window.get_framebuffer_size())
    }

    fn should_close(&self, handle: NativeHandle) -> bool {
        self.windows
            .get(handle)
            .is_some_and(|entry| entry.window.should_close())
    }

    fn set_should_close(&mut self, handle: NativeHandle, value: bool) {
        if let Some(entry) = self.windows.get_mut(handle) {
            entry.window.set_should_close(value);
        }
    }

    fn set_title(&mut self, handle: NativeHandle, title: &str) {
        if let Some(entry) = self.windows.get_mut(handle) {
            entry.window.set_title(title);
        }
    }

    fn enable_event_hooks(&mut self, handle: NativeHandle) {
        if let Some(entry) = self.windows.get_mut(handle) {
            entry.window.set_key_polling(true);
            entry.window.set_mouse_button_polling(true);
            entry.window.set_cursor_pos_polling(true);
            entry.window.set_framebuffer_size_polling(true);
            entry.window.set_close_polling(true);
        }
    }

    fn poll_events(&mut self) -> Vec<(NativeHandle, NativeEvent)> {
        let Some(glfw) = self.glfw.as_mut() else {
            return Vec::new();
        };
        glfw.poll_events();

        let mut delivered = Vec::new();
        for (handle, entry) in &self.windows {
            for (_, event) in glfw::flush_messages(&entry.events) {
                if let Some(event) = translate_event(event) {
                    delivered.push((handle, event));
                }
            }
        }
        delivered
    }

    fn time(&self) -> f64 {
        self.glfw.as_ref().map_or(0.0, glfw::Glfw::get_time)
    }

    fn graphics_api(&self) -> Box<dyn GraphicsApi> {
        Box::new(GlApi)
    }
}

/// Map a polled GLFW event onto the raw callback payload
fn translate_event(event: glfw::WindowEvent) -> Option<NativeEvent> {
    match event {
        glfw::WindowEvent::Key(key, scancode, action, mods) => Some(NativeEvent::Key {
            key: Key(key as i32),
            scancode,
            action: action as i32,
            mods: Modifiers::from_bits_truncate(mods.bits()),
        }),
        glfw::WindowEvent::MouseButton(button, action, mods) => Some(NativeEvent::MouseButton {
            button: MouseButton(button as i32),
            action: action as i32,
            mods: Modifiers::from_bits_truncate(mods.bits()),
        }),
        glfw::WindowEvent::CursorPos(x, y) => Some(NativeEvent::CursorPos { x, y }),
        glfw::WindowEvent::FramebufferSize(width, height) => {
            Some(NativeEvent::FramebufferSize { width, height })
        }
        glfw::WindowEvent::Close => Some(NativeEvent::Close),
        _ => None,
    }
}

/// OpenGL through the `gl` function table
///
/// Valid once a context has been made current through [`GlfwBackend`].
struct GlApi;

impl GraphicsApi for GlApi {
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { gl::ClearColor(r, g, b, a) };
    }

    fn clear(&mut self, mask: ClearMask) {
        let mut bits = 0;
        if mask.contains(ClearMask::COLOR) {
            bits |= gl::COLOR_BUFFER_BIT;
        }
        if mask.contains(ClearMask::DEPTH) {
            bits |= gl::DEPTH_BUFFER_BIT;
        }
        if mask.contains(ClearMask::STENCIL) {
            bits |= gl::STENCIL_BUFFER_BIT;
        }
        unsafe { gl::Clear(bits) };
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        let cap = match capability {
            Capability::DepthTest => gl::DEPTH_TEST,
            Capability::Blend => gl::BLEND,
        };
        unsafe {
            if enabled {
                gl::Enable(cap);
            } else {
                gl::Disable(cap);
            }
        }
    }

    fn blend_func_alpha(&mut self) {
        unsafe { gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA) };
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { gl::Viewport(x, y, width, height) };
    }

    fn get_string(&self, name: GlString) -> Option<String> {
        if !gl::GetString::is_loaded() {
            return None;
        }
        let name = match name {
            GlString::Version => gl::VERSION,
            GlString::Vendor => gl::VENDOR,
            GlString::Renderer => gl::RENDERER,
        };
        let ptr = unsafe { gl::GetString(name) };
        if ptr.is_null() {
            return None;
        }
        // SAFETY: GL returns a static NUL-terminated string for these names
        let value = unsafe { CStr::from_ptr(ptr.cast()) };
        Some(value.to_string_lossy().into_owned())
    }
}
