//! Window wrapper owning one native window and its OpenGL context
//!
//! A [`Window`] is valid while it holds a native handle. Creation may fail
//! without being an error: the window is then invalid and every operation
//! degrades to a no-op or a neutral value. The native window is destroyed
//! exactly once, when the owning [`Window`] drops.

use crate::platform::{NativeHandle, Platform, WeakPlatform, WindowSpec};

/// Owned native window
///
/// Not `Clone`: the handle has a single owner. Moving the value moves the
/// handle; [`Window::take`] moves it out of a borrowed window.
pub struct Window {
    platform: Platform,
    handle: Option<NativeHandle>,
    width: u32,
    height: u32,
    title: String,
}

impl Window {
    /// Create a window with the fixed OpenGL 3.3 core context configuration
    ///
    /// Check [`is_valid`](Self::is_valid) afterwards.
    pub fn new(platform: &Platform, width: u32, height: u32, title: &str) -> Self {
        Self::from_spec(platform, &WindowSpec::new(width, height, title))
    }

    /// Create a window from a full spec
    pub fn from_spec(platform: &Platform, spec: &WindowSpec) -> Self {
        let handle = platform.with_backend(|backend| backend.create_window(spec));
        match handle {
            Some(handle) => log::info!(
                "Created window '{}' ({}x{}) as {handle:?}",
                spec.title,
                spec.width,
                spec.height
            ),
            None => log::error!("Failed to create window: {}", spec.title),
        }
        Self {
            platform: platform.clone(),
            handle,
            width: spec.width,
            height: spec.height,
            title: spec.title.clone(),
        }
    }

    /// Check if the window was created successfully
    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Check if the window should close; `false` when invalid
    pub fn should_close(&self) -> bool {
        self.handle.is_some_and(|handle| {
            self.platform
                .with_backend_ref(|backend| backend.should_close(handle))
        })
    }

    /// Set the window should close flag
    pub fn set_should_close(&mut self, value: bool) {
        if let Some(handle) = self.handle {
            self.platform
                .with_backend(|backend| backend.set_should_close(handle, value));
        }
    }

    /// Make the window's OpenGL context current
    pub fn make_context_current(&mut self) {
        if let Some(handle) = self.handle {
            self.platform
                .with_backend(|backend| backend.make_context_current(handle));
        }
    }

    /// Swap the front and back buffers
    pub fn swap_buffers(&mut self) {
        if let Some(handle) = self.handle {
            self.platform.with_backend(|backend| backend.swap_buffers(handle));
        }
    }

    /// Framebuffer width in pixels
    ///
    /// Queried live from the native window; the requested width when invalid.
    pub fn width(&self) -> u32 {
        self.size().0
    }

    /// Framebuffer height in pixels
    pub fn height(&self) -> u32 {
        self.size().1
    }

    /// Framebuffer size in pixels
    pub fn size(&self) -> (u32, u32) {
        let live = self.handle.and_then(|handle| {
            self.platform
                .with_backend_ref(|backend| backend.framebuffer_size(handle))
        });
        live.map_or((self.width, self.height), |(width, height)| {
            (
                u32::try_from(width).unwrap_or(0),
                u32::try_from(height).unwrap_or(0),
            )
        })
    }

    /// Cached window title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the window title
    pub fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.title);
        if let Some(handle) = self.handle {
            self.platform
                .with_backend(|backend| backend.set_title(handle, title));
        }
    }

    /// Enable or disable VSync
    ///
    /// Applies to the current context, so call after
    /// [`make_context_current`](Self::make_context_current).
    pub fn set_vsync(&mut self, enabled: bool) {
        if self.handle.is_some() {
            self.platform
                .with_backend(|backend| backend.set_swap_interval(u32::from(enabled)));
        }
    }

    /// Native handle, `None` when invalid
    pub fn native_handle(&self) -> Option<NativeHandle> {
        self.handle
    }

    /// Platform the window was created on
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Move the native window out, leaving this one invalid
    pub fn take(&mut self) -> Self {
        Self {
            platform: self.platform.clone(),
            handle: self.handle.take(),
            width: self.width,
            height: self.height,
            title: std::mem::take(&mut self.title),
        }
    }

    /// Token for raising or clearing the close flag from listeners
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            platform: self.platform.downgrade(),
            handle: self.handle,
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.platform.clear_user_data(handle);
            self.platform.with_backend(|backend| backend.destroy_window(handle));
            log::debug!("Destroyed window {handle:?}");
        }
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("handle", &self.handle)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

/// Weak access to one window's close flag
///
/// Meant to be captured by listeners, which cannot borrow the window that
/// ends up owning them. Every operation is a no-op once the window or the
/// platform is gone.
#[derive(Clone)]
pub struct CloseHandle {
    platform: WeakPlatform,
    handle: Option<NativeHandle>,
}

impl CloseHandle {
    /// Handle bound to no window; every operation is a no-op
    pub(crate) fn detached(platform: &Platform) -> Self {
        Self {
            platform: platform.downgrade(),
            handle: None,
        }
    }

    /// Raise the close flag; the loop exits at its next check
    pub fn request_close(&self) {
        self.set(true);
    }

    /// Clear the close flag, e.g. to veto a close request
    pub fn cancel_close(&self) {
        self.set(false);
    }

    /// Current close flag, `false` if the window is gone
    pub fn is_close_requested(&self) -> bool {
        match (self.platform.upgrade(), self.handle) {
            (Some(platform), Some(handle)) => {
                platform.with_backend_ref(|backend| backend.should_close(handle))
            }
            _ => false,
        }
    }

    fn set(&self, value: bool) {
        if let (Some(platform), Some(handle)) = (self.platform.upgrade(), self.handle) {
            platform.with_backend(|backend| backend.set_should_close(handle, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HeadlessBackend, HeadlessControl, NativeEvent};
    use crate::EventHandler;

    fn platform() -> (Platform, HeadlessControl) {
        let (backend, control) = HeadlessBackend::new();
        let platform = Platform::new(Box::new(backend));
        platform.init().unwrap();
        (platform, control)
    }

    #[test]
    fn test_valid_window_reports_live_size() {
        let (platform, _control) = platform();
        let window = Window::new(&platform, 800, 600, "T");
        assert!(window.is_valid());
        assert_eq!(window.size(), (800, 600));
        assert!(!window.should_close());
    }

    #[test]
    fn test_size_follows_resize_event() {
        let (platform, control) = platform();
        let window = Window::new(&platform, 800, 600, "T");
        let mut handler = EventHandler::new();
        let reported = std::rc::Rc::new(std::cell::Cell::new((0, 0)));
        let sink = std::rc::Rc::clone(&reported);
        handler.set_window_resize_callback(move |event| sink.set((event.width, event.height)));
        handler.attach(&window);

        control.push_event(
            window.native_handle().unwrap(),
            NativeEvent::FramebufferSize { width: 1024, height: 300 },
        );
        EventHandler::poll_events(&platform);

        assert_eq!(reported.get(), (1024, 300));
        assert_eq!(window.width(), 1024);
        assert_eq!(window.height(), 300);
    }

    #[test]
    fn test_invalid_window_degrades() {
        let (platform, control) = platform();
        control.fail_window_creation(true);
        let mut window = Window::new(&platform, 640, 480, "invalid");
        assert!(!window.is_valid());
        assert_eq!(window.size(), (640, 480));
        window.set_should_close(true);
        assert!(!window.should_close());
        window.make_context_current();
        window.swap_buffers();
        window.set_vsync(true);
        window.set_title("renamed");
        assert_eq!(window.title(), "renamed");
        assert_eq!(control.current_context(), None);
        assert_eq!(control.swap_interval(), None);
    }

    #[test]
    fn test_close_flag_round_trip() {
        let (platform, _control) = platform();
        let mut window = Window::new(&platform, 10, 10, "T");
        window.set_should_close(true);
        assert!(window.should_close());
        window.set_should_close(false);
        assert!(!window.should_close());
    }

    #[test]
    fn test_title_is_pushed_to_native_window() {
        let (platform, control) = platform();
        let mut window = Window::new(&platform, 10, 10, "before");
        window.set_title("after");
        assert_eq!(window.title(), "after");
        assert_eq!(control.title(window.native_handle().unwrap()).as_deref(), Some("after"));
    }

    #[test]
    fn test_vsync_and_swap() {
        let (platform, control) = platform();
        let mut window = Window::new(&platform, 10, 10, "T");
        let handle = window.native_handle().unwrap();
        window.make_context_current();
        window.set_vsync(true);
        assert_eq!(control.swap_interval(), Some(1));
        window.set_vsync(false);
        assert_eq!(control.swap_interval(), Some(0));
        window.swap_buffers();
        window.swap_buffers();
        assert_eq!(control.swap_count(handle), 2);
        assert_eq!(control.current_context(), Some(handle));
    }

    #[test]
    fn test_take_moves_handle() {
        let (platform, control) = platform();
        let mut source = Window::new(&platform, 10, 10, "moved");
        let handle = source.native_handle();
        let target = source.take();

        assert!(!source.is_valid());
        assert_eq!(target.native_handle(), handle);
        assert_eq!(target.title(), "moved");

        drop(source);
        assert_eq!(control.window_count(), 1);
        drop(target);
        assert_eq!(control.window_count(), 0);
    }

    #[test]
    fn test_close_handle_outlives_window() {
        let (platform, _control) = platform();
        let window = Window::new(&platform, 10, 10, "T");
        let close = window.close_handle();
        close.request_close();
        assert!(window.should_close());
        assert!(close.is_close_requested());
        close.cancel_close();
        assert!(!window.should_close());

        drop(window);
        close.request_close();
        assert!(!close.is_close_requested());
    }
}
