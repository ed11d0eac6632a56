//! Application lifecycle and main loop
//!
//! [`Application`] owns the window, its event handler and a renderer, and
//! drives the frame loop:
//!
//! ```text
//! loop while !window.should_close():
//!     delta = now - last          (seconds)
//!     update(delta)
//!     render(&mut renderer)
//!     swap buffers
//!     poll events                 (key/mouse/resize/close listeners run here)
//! ```
//!
//! Construction never panics and never returns an error. A failed step
//! leaves the application not initialized; `initialize` and `run` then
//! report the failure instead of doing anything.

use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::events::EventHandler;
use crate::foundation::time::FrameTimer;
use crate::platform::{NativeBackend, Platform, PlatformError, WindowSpec};
use crate::render::Renderer;
use crate::window::{CloseHandle, Window};

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Construction did not complete, or the application was shut down
    #[error("Application is not initialized")]
    NotInitialized,

    /// Native layer failure during construction
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Rejected configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Lifecycle states
///
/// ```text
/// Unconstructed                    (construction failed)
/// Initializing ⇄ Running           (each run() enters and leaves the loop)
/// Initializing → ShuttingDown → Terminated
/// ```
///
/// `Running` and `ShuttingDown` only hold while `run` or `shutdown` is on
/// the stack, so `state()` observed from outside reports one of the other
/// three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    /// Construction failed; nothing will run
    Unconstructed,
    /// Ready for `initialize` / `run`, including after a run returned
    Initializing,
    /// Inside the frame loop
    Running,
    /// Shutdown listener and resource release in progress
    ShuttingDown,
    /// Shut down; the native library has been terminated
    Terminated,
}

type InitCallback = Box<dyn FnMut()>;
type UpdateCallback = Box<dyn FnMut(f32)>;
type RenderCallback = Box<dyn FnMut(&mut Renderer)>;
type ShutdownCallback = Box<dyn FnMut()>;

/// Application coordinating the window, events and the main loop
///
/// # Example
/// ```rust,no_run
/// use crazy::{Application, Key};
///
/// let mut app = Application::new(800, 600, "My App");
///
/// app.set_update_callback(|delta_time| {
///     // Update game logic
/// });
///
/// app.set_render_callback(|renderer| {
///     renderer.set_clear_color(0.1, 0.1, 0.2, 1.0);
///     renderer.clear();
/// });
///
/// let close = app.close_handle();
/// if let Some(events) = app.event_handler_mut() {
///     events.set_key_press_callback(move |event| {
///         if event.key == Key::ESCAPE {
///             close.request_close();
///         }
///     });
/// }
///
/// std::process::exit(app.run());
/// ```
pub struct Application {
    platform: Platform,
    state: AppState,
    initialized: bool,
    construction_error: Option<AppError>,

    // Dropped in this order during shutdown
    renderer: Option<Renderer>,
    event_handler: Option<EventHandler>,
    window: Option<Window>,

    init_callback: Option<InitCallback>,
    update_callback: Option<UpdateCallback>,
    render_callback: Option<RenderCallback>,
    shutdown_callback: Option<ShutdownCallback>,

    timer: FrameTimer,
}

impl Application {
    /// Create an application on GLFW with a window of the given size
    pub fn new(width: u32, height: u32, title: &str) -> Self {
        Self::from_config(&AppConfig::new(width, height, title))
    }

    /// Create an application on GLFW from a configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_platform(Platform::glfw(), config)
    }

    /// Create an application on an explicit backend
    pub fn with_backend(backend: Box<dyn NativeBackend>, config: &AppConfig) -> Self {
        Self::with_platform(Platform::new(backend), config)
    }

    fn with_platform(platform: Platform, config: &AppConfig) -> Self {
        let mut app = Self {
            platform,
            state: AppState::Unconstructed,
            initialized: false,
            construction_error: None,
            renderer: None,
            event_handler: None,
            window: None,
            init_callback: None,
            update_callback: None,
            render_callback: None,
            shutdown_callback: None,
            timer: FrameTimer::new(),
        };
        if let Err(err) = app.construct(config) {
            log::error!("Application construction failed: {err}");
            app.construction_error = Some(err);
        }
        app
    }

    fn construct(&mut self, config: &AppConfig) -> Result<(), AppError> {
        config.validate()?;
        self.platform.init()?;

        let window_config = &config.window;
        let mut window = Window::from_spec(
            &self.platform,
            &WindowSpec::new(window_config.width, window_config.height, window_config.title.as_str()),
        );
        if !window.is_valid() {
            self.platform.terminate();
            return Err(PlatformError::WindowCreationFailed {
                title: window_config.title.clone(),
            }
            .into());
        }

        window.make_context_current();

        let renderer = Renderer::new(&self.platform);
        let mut event_handler = EventHandler::new();
        event_handler.attach(&window);

        window.set_vsync(window_config.vsync);

        self.renderer = Some(renderer);
        self.event_handler = Some(event_handler);
        self.window = Some(window);
        self.initialized = true;
        self.state = AppState::Initializing;
        Ok(())
    }

    /// Whether construction completed and shutdown has not run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Current lifecycle state
    pub fn state(&self) -> AppState {
        self.state
    }

    /// Why construction failed, if it did
    pub fn construction_error(&self) -> Option<&AppError> {
        self.construction_error.as_ref()
    }

    /// Run the init listener
    ///
    /// Fires the listener on every call; callers that may initialize more
    /// than once must guard against repeated setup themselves.
    pub fn initialize(&mut self) -> Result<(), AppError> {
        if !self.initialized {
            log::error!("Application initialization failed");
            return Err(AppError::NotInitialized);
        }

        if let Some(callback) = self.init_callback.as_mut() {
            callback();
        }
        Ok(())
    }

    /// Run the main application loop
    ///
    /// Returns the process exit code: 0 after the window closed normally,
    /// -1 if the application is not initialized.
    pub fn run(&mut self) -> i32 {
        match self.try_run() {
            Ok(()) => 0,
            Err(err) => {
                log::error!("Cannot run application: {err}");
                -1
            }
        }
    }

    /// [`run`](Self::run) with the failure as an error value
    pub fn try_run(&mut self) -> Result<(), AppError> {
        self.initialize()?;

        log::info!("Application started successfully");
        if let Some(renderer) = &self.renderer {
            log::info!(
                "OpenGL Version: {}",
                renderer.opengl_version().as_deref().unwrap_or("unavailable")
            );
        }

        self.state = AppState::Running;
        self.timer.start(self.platform.time());

        while !self.window_should_close() {
            let delta_time = self.timer.tick(self.platform.time());

            if let Some(callback) = self.update_callback.as_mut() {
                callback(delta_time);
            }

            if let (Some(callback), Some(renderer)) =
                (self.render_callback.as_mut(), self.renderer.as_mut())
            {
                callback(renderer);
            }

            if let Some(window) = self.window.as_mut() {
                window.swap_buffers();
            }

            EventHandler::poll_events(&self.platform);
        }

        log::info!("Main loop exited after {} frames", self.timer.frame_count());
        // Still constructed; another run is allowed until shutdown
        self.state = AppState::Initializing;
        Ok(())
    }

    fn window_should_close(&self) -> bool {
        self.window.as_ref().map_or(true, Window::should_close)
    }

    /// Shutdown the application
    ///
    /// Runs the shutdown listener, releases renderer, event handler and
    /// window in that order, then terminates the native library. Does
    /// nothing if not initialized, so repeated calls are safe.
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.state = AppState::ShuttingDown;

        if let Some(callback) = self.shutdown_callback.as_mut() {
            callback();
        }

        self.renderer = None;
        self.event_handler = None;
        self.window = None;

        self.platform.terminate();

        if self.timer.frame_count() > 0 {
            log::info!(
                "Rendered {} frames in {:.2}s ({:.1} fps average)",
                self.timer.frame_count(),
                self.timer.total_time(),
                self.timer.average_fps()
            );
        }

        self.initialized = false;
        self.state = AppState::Terminated;
    }

    /// Set the initialization callback
    ///
    /// Called by every [`initialize`](Self::initialize), including the one
    /// at the start of [`run`](Self::run).
    pub fn set_init_callback(&mut self, callback: impl FnMut() + 'static) {
        self.init_callback = Some(Box::new(callback));
    }

    /// Set the update callback
    ///
    /// Called once per frame before rendering with the delta time in seconds.
    pub fn set_update_callback(&mut self, callback: impl FnMut(f32) + 'static) {
        self.update_callback = Some(Box::new(callback));
    }

    /// Set the render callback
    ///
    /// Called once per frame after update, before the buffer swap.
    pub fn set_render_callback(&mut self, callback: impl FnMut(&mut Renderer) + 'static) {
        self.render_callback = Some(Box::new(callback));
    }

    /// Set the shutdown callback
    ///
    /// Called once during shutdown, before cleanup.
    pub fn set_shutdown_callback(&mut self, callback: impl FnMut() + 'static) {
        self.shutdown_callback = Some(Box::new(callback));
    }

    /// Request application exit
    ///
    /// The loop exits at its next close-flag check.
    pub fn quit(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.set_should_close(true);
        }
    }

    /// Close token for listeners; inert if there is no window
    pub fn close_handle(&self) -> CloseHandle {
        self.window.as_ref().map_or_else(
            || CloseHandle::detached(&self.platform),
            Window::close_handle,
        )
    }

    /// Get the window
    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    /// Get mutable access to the window
    pub fn window_mut(&mut self) -> Option<&mut Window> {
        self.window.as_mut()
    }

    /// Get the event handler
    pub fn event_handler(&self) -> Option<&EventHandler> {
        self.event_handler.as_ref()
    }

    /// Get mutable access to the event handler
    pub fn event_handler_mut(&mut self) -> Option<&mut EventHandler> {
        self.event_handler.as_mut()
    }

    /// Get the renderer
    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    /// Get mutable access to the renderer
    pub fn renderer_mut(&mut self) -> Option<&mut Renderer> {
        self.renderer.as_mut()
    }

    /// Frame timing of the last run
    pub fn frame_timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Platform the application runs on
    pub fn platform(&self) -> &Platform {
        &self.platform
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HeadlessBackend, HeadlessControl};

    fn headless(config: &AppConfig) -> (Application, HeadlessControl) {
        let (backend, control) = HeadlessBackend::new();
        (Application::with_backend(Box::new(backend), config), control)
    }

    #[test]
    fn test_construction_order() {
        let (app, control) = headless(&AppConfig::new(800, 600, "T"));
        assert!(app.is_initialized());
        assert_eq!(app.state(), AppState::Initializing);
        assert!(app.construction_error().is_none());

        let handle = app.window().and_then(Window::native_handle).unwrap();
        assert_eq!(control.current_context(), Some(handle));
        assert!(control.hooks_enabled(handle));
        assert_eq!(control.swap_interval(), Some(1));
    }

    #[test]
    fn test_vsync_follows_config() {
        let config = AppConfig::new(800, 600, "T")
            .with_window(crate::config::WindowConfig::new(800, 600, "T").with_vsync(false));
        let (_app, control) = headless(&config);
        assert_eq!(control.swap_interval(), Some(0));
    }

    #[test]
    fn test_invalid_config_skips_native_init() {
        let (mut app, control) = headless(&AppConfig::new(0, 600, "T"));
        assert!(!app.is_initialized());
        assert_eq!(app.state(), AppState::Unconstructed);
        assert!(matches!(app.construction_error(), Some(AppError::Config(_))));
        assert_eq!(control.init_calls(), 0);
        assert_eq!(app.run(), -1);
    }

    #[test]
    fn test_window_failure_terminates_native_layer() {
        let (backend, control) = HeadlessBackend::new();
        control.fail_window_creation(true);
        let app = Application::with_backend(Box::new(backend), &AppConfig::default());
        assert!(!app.is_initialized());
        assert!(matches!(
            app.construction_error(),
            Some(AppError::Platform(PlatformError::WindowCreationFailed { .. }))
        ));
        assert!(app.window().is_none());
        assert!(app.event_handler().is_none());
        assert!(app.renderer().is_none());
        assert_eq!(control.terminate_calls(), 1);
        assert!(!control.is_initialized());
    }

    #[test]
    fn test_quit_sets_close_flag() {
        let (mut app, _control) = headless(&AppConfig::default());
        app.quit();
        assert!(app.window().unwrap().should_close());
        assert!(app.close_handle().is_close_requested());
    }

    #[test]
    fn test_state_after_run_allows_another_run() {
        let (mut app, _control) = headless(&AppConfig::default());
        let updates = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = std::rc::Rc::clone(&updates);
        let close = app.close_handle();
        app.set_update_callback(move |_| {
            counter.set(counter.get() + 1);
            close.request_close();
        });

        assert_eq!(app.run(), 0);
        assert_eq!(app.state(), AppState::Initializing);
        assert!(app.is_initialized());

        app.close_handle().cancel_close();
        assert_eq!(app.run(), 0);
        assert_eq!(updates.get(), 2);
        assert_eq!(app.state(), AppState::Initializing);

        app.shutdown();
        assert_eq!(app.state(), AppState::Terminated);
    }

    #[test]
    fn test_shutdown_releases_everything_once() {
        let (mut app, control) = headless(&AppConfig::default());
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = std::rc::Rc::clone(&calls);
        app.set_shutdown_callback(move || counter.set(counter.get() + 1));

        app.shutdown();
        app.shutdown();
        assert_eq!(calls.get(), 1);
        assert_eq!(app.state(), AppState::Terminated);
        assert!(app.window().is_none());
        assert_eq!(control.window_count(), 0);
        assert_eq!(control.terminate_calls(), 1);
        assert!(matches!(app.initialize(), Err(AppError::NotInitialized)));

        drop(app);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_close_handle_without_window_is_inert() {
        let (backend, control) = HeadlessBackend::new();
        control.fail_init(true);
        let mut app = Application::with_backend(Box::new(backend), &AppConfig::default());
        let close = app.close_handle();
        close.request_close();
        app.quit();
        assert!(!close.is_close_requested());
    }
}
