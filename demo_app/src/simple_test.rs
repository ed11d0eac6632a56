//! Window, renderer and event handler used directly, without `Application`
//!
//! Usage: `simple_test [--headless]`

use crazy::platform::{action, HeadlessBackend, NativeEvent};
use crazy::{EventHandler, Key, Modifiers, Platform, Renderer, Window};

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let headless = std::env::args().skip(1).any(|arg| arg == "--headless");
    let (platform, control) = if headless {
        let (backend, control) = HeadlessBackend::new();
        control.set_frame_step(1.0 / 60.0);
        (Platform::new(Box::new(backend)), Some(control))
    } else {
        (Platform::glfw(), None)
    };

    if let Err(err) = platform.init() {
        log::error!("Failed to initialize GLFW: {err}");
        std::process::exit(-1);
    }

    log::info!("=== Simple Wrapper Test ===");

    let mut window = Window::new(&platform, 640, 480, "Simple Wrapper Test");
    if !window.is_valid() {
        log::error!("Failed to create window");
        platform.terminate();
        std::process::exit(-1);
    }

    log::info!("Window created: {}x{}", window.width(), window.height());

    window.make_context_current();
    window.set_vsync(true);

    let mut renderer = Renderer::new(&platform);

    let unavailable = || "unavailable".to_string();
    log::info!("OpenGL Version: {}", renderer.opengl_version().unwrap_or_else(unavailable));
    log::info!("OpenGL Vendor: {}", renderer.opengl_vendor().unwrap_or_else(unavailable));
    log::info!("OpenGL Renderer: {}", renderer.opengl_renderer().unwrap_or_else(unavailable));

    let mut event_handler = EventHandler::new();
    event_handler.attach(&window);

    let close = window.close_handle();
    event_handler.set_key_press_callback(move |event| {
        if event.key == Key::ESCAPE {
            log::info!("ESC pressed, closing...");
            close.request_close();
        }
    });

    log::info!("Press ESC to close the window");

    renderer.set_clear_color(0.2, 0.3, 0.3, 1.0);

    let mut frame_count = 0u64;
    while !window.should_close() {
        renderer.clear();
        window.swap_buffers();

        // Headless runs press ESC after a couple of seconds' worth of frames
        if let Some(control) = control.as_ref().filter(|_| frame_count == 120) {
            control.push_event_to_last_window(NativeEvent::Key {
                key: Key::ESCAPE,
                scancode: 0,
                action: action::PRESS,
                mods: Modifiers::empty(),
            });
        }

        EventHandler::poll_events(&platform);
        frame_count += 1;
    }

    log::info!("Rendered {frame_count} frames");

    drop(event_handler);
    drop(window);
    platform.terminate();

    log::info!("Test completed successfully!");
}
