//! In-process backend without a display
//!
//! Windows are plain records, the clock only moves when told to, and input
//! is whatever the [`HeadlessControl`] queued. Native side effects are
//! applied at poll time the way GLFW applies them: a framebuffer resize
//! updates the stored size and a close request raises the close flag before
//! the notification is delivered.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use slotmap::SlotMap;

use super::backend::{Capability, ClearMask, GlString, GraphicsApi, NativeBackend};
use super::{NativeEvent, NativeHandle, PlatformError, PlatformResult, WindowSpec};

/// One recorded OpenGL call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlCall {
    /// `glClearColor`
    ClearColor([f32; 4]),
    /// `glClear`
    Clear(ClearMask),
    /// `glEnable` / `glDisable`
    SetCapability(Capability, bool),
    /// Alpha blend function
    BlendFuncAlpha,
    /// `glViewport`
    Viewport(i32, i32, i32, i32),
}

#[derive(Debug)]
struct HeadlessWindow {
    framebuffer: (i32, i32),
    title: String,
    should_close: bool,
    hooks_enabled: bool,
    swap_count: u32,
}

#[derive(Debug, Default)]
struct HeadlessState {
    fail_init: bool,
    fail_window_creation: bool,
    initialized: bool,
    init_calls: u32,
    terminate_calls: u32,
    windows: SlotMap<NativeHandle, HeadlessWindow>,
    last_created: Option<NativeHandle>,
    current_context: Option<NativeHandle>,
    swap_interval: Option<u32>,
    pending: VecDeque<(NativeHandle, NativeEvent)>,
    poll_count: u32,
    time: f64,
    frame_step: f64,
    gl_calls: Vec<GlCall>,
}

/// Backend half handed to a [`Platform`](super::Platform)
pub struct HeadlessBackend {
    state: Rc<RefCell<HeadlessState>>,
}

/// Test-side half of a [`HeadlessBackend`]
///
/// Clones share the same state, so a control can be captured in listeners
/// to script input frame by frame.
#[derive(Clone)]
pub struct HeadlessControl {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessBackend {
    /// Create a backend and the control that drives it
    pub fn new() -> (Self, HeadlessControl) {
        let state = Rc::new(RefCell::new(HeadlessState::default()));
        (
            Self {
                state: Rc::clone(&state),
            },
            HeadlessControl { state },
        )
    }
}

impl NativeBackend for HeadlessBackend {
    fn init(&mut self) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        state.init_calls += 1;
        if state.fail_init {
            return Err(PlatformError::InitFailed("headless init disabled".to_string()));
        }
        state.initialized = true;
        Ok(())
    }

    fn terminate(&mut self) {
        let mut state = self.state.borrow_mut();
        state.terminate_calls += 1;
        state.initialized = false;
        state.windows.clear();
        state.pending.clear();
        state.current_context = None;
    }

    fn create_window(&mut self, spec: &WindowSpec) -> Option<NativeHandle> {
        let mut state = self.state.borrow_mut();
        if !state.initialized || state.fail_window_creation {
            return None;
        }
        let handle = state.windows.insert(HeadlessWindow {
            framebuffer: (
                i32::try_from(spec.width).unwrap_or(i32::MAX),
                i32::try_from(spec.height).unwrap_or(i32::MAX),
            ),
            title: spec.title.clone(),
            should_close: false,
            hooks_enabled: false,
            swap_count: 0,
        });
        state.last_created = Some(handle);
        Some(handle)
    }

    fn destroy_window(&mut self, handle: NativeHandle) {
        let mut state = self.state.borrow_mut();
        state.windows.remove(handle);
        if state.current_context == Some(handle) {
            state.current_context = None;
        }
    }

    fn make_context_current(&mut self, handle: NativeHandle) {
        let mut state = self.state.borrow_mut();
        if state.windows.contains_key(handle) {
            state.current_context = Some(handle);
        }
    }

    fn swap_buffers(&mut self, handle: NativeHandle) {
        let mut state = self.state.borrow_mut();
        let step = state.frame_step;
        if let Some(window) = state.windows.get_mut(handle) {
            window.swap_count += 1;
            state.time += step;
        }
    }

    fn set_swap_interval(&mut self, interval: u32) {
        let mut state = self.state.borrow_mut();
        if state.current_context.is_some() {
            state.swap_interval = Some(interval);
        }
    }

    fn framebuffer_size(&self, handle: NativeHandle) -> Option<(i32, i32)> {
        self.state.borrow().windows.get(handle).map(|window| window.framebuffer)
    }

    fn should_close(&self, handle: NativeHandle) -> bool {
        self.state
            .borrow()
            .windows
            .get(handle)
            .is_some_and(|window| window.should_close)
    }

    fn set_should_close(&mut self, handle: NativeHandle, value: bool) {
        if let Some(window) = self.state.borrow_mut().windows.get_mut(handle) {
            window.should_close = value;
        }
    }

    fn set_title(&mut self, handle: NativeHandle, title: &str) {
        if let Some(window) = self.state.borrow_mut().windows.get_mut(handle) {
            window.title = title.to_string();
        }
    }

    fn enable_event_hooks(&mut self, handle: NativeHandle) {
        if let Some(window) = self.state.borrow_mut().windows.get_mut(handle) {
            window.hooks_enabled = true;
        }
    }

    fn poll_events(&mut self) -> Vec<(NativeHandle, NativeEvent)> {
        let mut state = self.state.borrow_mut();
        state.poll_count += 1;
        let pending = std::mem::take(&mut state.pending);
        let mut delivered = Vec::with_capacity(pending.len());
        for (handle, event) in pending {
            let Some(window) = state.windows.get_mut(handle) else {
                continue;
            };
            match event {
                NativeEvent::FramebufferSize { width, height } => window.framebuffer = (width, height),
                NativeEvent::Close => window.should_close = true,
                _ => {}
            }
            if window.hooks_enabled {
                delivered.push((handle, event));
            }
        }
        delivered
    }

    fn time(&self) -> f64 {
        self.state.borrow().time
    }

    fn graphics_api(&self) -> Box<dyn GraphicsApi> {
        Box::new(HeadlessGraphics {
            state: Rc::clone(&self.state),
        })
    }
}

struct HeadlessGraphics {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessGraphics {
    fn record(&self, call: GlCall) {
        self.state.borrow_mut().gl_calls.push(call);
    }
}

impl GraphicsApi for HeadlessGraphics {
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.record(GlCall::ClearColor([r, g, b, a]));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.record(GlCall::Clear(mask));
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        self.record(GlCall::SetCapability(capability, enabled));
    }

    fn blend_func_alpha(&mut self) {
        self.record(GlCall::BlendFuncAlpha);
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport(x, y, width, height));
    }

    fn get_string(&self, name: GlString) -> Option<String> {
        self.state.borrow().current_context?;
        let value = match name {
            GlString::Version => "3.3.0 Headless",
            GlString::Vendor => "crazy",
            GlString::Renderer => "headless",
        };
        Some(value.to_string())
    }
}

impl HeadlessControl {
    /// Make the next `init` fail
    pub fn fail_init(&self, fail: bool) {
        self.state.borrow_mut().fail_init = fail;
    }

    /// Make window creation fail
    pub fn fail_window_creation(&self, fail: bool) {
        self.state.borrow_mut().fail_window_creation = fail;
    }

    /// Queue a native event for delivery on the next poll
    pub fn push_event(&self, handle: NativeHandle, event: NativeEvent) {
        self.state.borrow_mut().pending.push_back((handle, event));
    }

    /// Queue a native event for the most recently created window
    ///
    /// Dropped if no window was created yet.
    pub fn push_event_to_last_window(&self, event: NativeEvent) {
        let mut state = self.state.borrow_mut();
        if let Some(handle) = state.last_created {
            state.pending.push_back((handle, event));
        }
    }

    /// Handle of the most recently created window
    pub fn last_window(&self) -> Option<NativeHandle> {
        self.state.borrow().last_created
    }

    /// Advance the clock
    pub fn advance_time(&self, seconds: f64) {
        self.state.borrow_mut().time += seconds;
    }

    /// Advance the clock by `seconds` on every buffer swap
    pub fn set_frame_step(&self, seconds: f64) {
        self.state.borrow_mut().frame_step = seconds;
    }

    /// Set a window's close flag from the native side
    pub fn set_should_close(&self, handle: NativeHandle, value: bool) {
        if let Some(window) = self.state.borrow_mut().windows.get_mut(handle) {
            window.should_close = value;
        }
    }

    /// Number of `init` calls, failed ones included
    pub fn init_calls(&self) -> u32 {
        self.state.borrow().init_calls
    }

    /// Number of `terminate` calls
    pub fn terminate_calls(&self) -> u32 {
        self.state.borrow().terminate_calls
    }

    /// Whether the library is between init and terminate
    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    /// Number of live windows
    pub fn window_count(&self) -> usize {
        self.state.borrow().windows.len()
    }

    /// Buffer swaps performed on a window
    pub fn swap_count(&self, handle: NativeHandle) -> u32 {
        self.state
            .borrow()
            .windows
            .get(handle)
            .map_or(0, |window| window.swap_count)
    }

    /// Number of event pumps
    pub fn poll_count(&self) -> u32 {
        self.state.borrow().poll_count
    }

    /// Title as last pushed to the native window
    pub fn title(&self, handle: NativeHandle) -> Option<String> {
        self.state
            .borrow()
            .windows
            .get(handle)
            .map(|window| window.title.clone())
    }

    /// Whether event hooks are installed on a window
    pub fn hooks_enabled(&self, handle: NativeHandle) -> bool {
        self.state
            .borrow()
            .windows
            .get(handle)
            .is_some_and(|window| window.hooks_enabled)
    }

    /// Window whose context is current
    pub fn current_context(&self) -> Option<NativeHandle> {
        self.state.borrow().current_context
    }

    /// Last swap interval set on a current context
    pub fn swap_interval(&self) -> Option<u32> {
        self.state.borrow().swap_interval
    }

    /// OpenGL calls recorded so far
    pub fn gl_calls(&self) -> Vec<GlCall> {
        self.state.borrow().gl_calls.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Key;
    use crate::platform::action;

    fn initialized() -> (HeadlessBackend, HeadlessControl) {
        let (mut backend, control) = HeadlessBackend::new();
        backend.init().unwrap();
        (backend, control)
    }

    #[test]
    fn test_no_windows_before_init() {
        let (mut backend, _control) = HeadlessBackend::new();
        assert!(backend.create_window(&WindowSpec::new(10, 10, "x")).is_none());
    }

    #[test]
    fn test_events_need_hooks() {
        let (mut backend, control) = initialized();
        let handle = backend.create_window(&WindowSpec::new(10, 10, "x")).unwrap();
        let key = NativeEvent::Key {
            key: Key::A,
            scancode: 0,
            action: action::PRESS,
            mods: crate::events::Modifiers::empty(),
        };
        control.push_event(handle, key);
        assert!(backend.poll_events().is_empty());

        backend.enable_event_hooks(handle);
        control.push_event(handle, key);
        assert_eq!(backend.poll_events(), vec![(handle, key)]);
        assert_eq!(control.poll_count(), 2);
    }

    #[test]
    fn test_resize_and_close_side_effects_apply_without_hooks() {
        let (mut backend, control) = initialized();
        let handle = backend.create_window(&WindowSpec::new(10, 10, "x")).unwrap();
        control.push_event(handle, NativeEvent::FramebufferSize { width: 30, height: 40 });
        control.push_event(handle, NativeEvent::Close);
        backend.poll_events();
        assert_eq!(backend.framebuffer_size(handle), Some((30, 40)));
        assert!(backend.should_close(handle));
    }

    #[test]
    fn test_destroyed_handles_are_ignored() {
        let (mut backend, control) = initialized();
        let handle = backend.create_window(&WindowSpec::new(10, 10, "x")).unwrap();
        backend.destroy_window(handle);
        backend.set_should_close(handle, true);
        backend.swap_buffers(handle);
        assert!(!backend.should_close(handle));
        assert_eq!(backend.framebuffer_size(handle), None);
        assert_eq!(control.swap_count(handle), 0);

        let next = backend.create_window(&WindowSpec::new(10, 10, "y")).unwrap();
        assert_ne!(handle, next);
    }

    #[test]
    fn test_frame_step_advances_clock_on_swap() {
        let (mut backend, control) = initialized();
        let handle = backend.create_window(&WindowSpec::new(10, 10, "x")).unwrap();
        control.set_frame_step(0.5);
        backend.swap_buffers(handle);
        backend.swap_buffers(handle);
        assert!((backend.time() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_terminate_destroys_windows() {
        let (mut backend, control) = initialized();
        backend.create_window(&WindowSpec::new(10, 10, "x")).unwrap();
        backend.terminate();
        assert_eq!(control.window_count(), 0);
        assert!(!control.is_initialized());
    }
}
