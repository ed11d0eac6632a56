//! Application demo
//!
//! Opens an 800x600 window cleared to dark blue and logs key, mouse and
//! resize events. ESC closes the window.
//!
//! Usage: `wrappers_demo [--headless] [--config <file.toml|file.ron>]`
//!
//! With `--headless` the demo runs without a display and replays a short
//! scripted input sequence ending with ESC.

use std::cell::Cell;
use std::rc::Rc;

use crazy::platform::{action, HeadlessBackend, HeadlessControl, NativeEvent};
use crazy::prelude::*;
use crazy::Config as _;

struct Options {
    headless: bool,
    config: Option<String>,
}

fn parse_args() -> Options {
    let mut options = Options {
        headless: false,
        config: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headless" => options.headless = true,
            "--config" => options.config = args.next(),
            other => log::warn!("Ignoring unknown argument '{other}'"),
        }
    }
    options
}

fn load_config(path: Option<&str>) -> AppConfig {
    let default = AppConfig::new(800, 600, "Crazy Wrappers Demo");
    let Some(path) = path else {
        return default;
    };
    match AppConfig::load_from_file(path) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Failed to load config '{path}': {err}, using defaults");
            default
        }
    }
}

/// Feed one input per frame, ending with ESC
fn script_input(app: &mut Application, control: HeadlessControl) {
    control.set_frame_step(1.0 / 60.0);
    let frame = Cell::new(0u32);
    app.set_update_callback(move |_| {
        frame.set(frame.get() + 1);
        let key = |key, action| NativeEvent::Key {
            key,
            scancode: 0,
            action,
            mods: Modifiers::empty(),
        };
        let event = match frame.get() {
            1 => key(Key::SPACE, action::PRESS),
            2 => NativeEvent::MouseButton {
                button: MouseButton::LEFT,
                action: action::PRESS,
                mods: Modifiers::empty(),
            },
            3 => NativeEvent::CursorPos { x: 400.0, y: 300.0 },
            4 => NativeEvent::FramebufferSize {
                width: 1024,
                height: 768,
            },
            _ => key(Key::ESCAPE, action::PRESS),
        };
        control.push_event_to_last_window(event);
    });
}

fn main() {
    let options = parse_args();
    let config = load_config(options.config.as_deref());
    crazy::foundation::logging::init_from_config(&config.logging);

    let mut app = if options.headless {
        let (backend, control) = HeadlessBackend::new();
        let mut app = Application::with_backend(Box::new(backend), &config);
        script_input(&mut app, control);
        app
    } else {
        Application::from_config(&config)
    };

    app.set_init_callback(|| log::info!("Application initialized!"));

    app.set_render_callback(|renderer| {
        renderer.set_clear_color(0.1, 0.1, 0.2, 1.0);
        renderer.clear();
    });

    app.set_shutdown_callback(|| log::info!("Application shutting down!"));

    let close = app.close_handle();
    let mut viewport = Renderer::new(app.platform());
    let moves = Rc::new(Cell::new(0u64));
    let move_count = Rc::clone(&moves);

    if let Some(events) = app.event_handler_mut() {
        events.set_key_press_callback(move |event| {
            if event.key == Key::ESCAPE {
                log::info!("ESC pressed, closing window...");
                close.request_close();
            }
            if event.key == Key::SPACE {
                log::info!("SPACE pressed!");
            }
        });

        events.set_mouse_button_press_callback(|event| {
            log::info!("Mouse button {} pressed", event.button.0);
        });

        // Too frequent to log
        events.set_mouse_move_callback(move |_| move_count.set(move_count.get() + 1));

        events.set_window_resize_callback(move |event| {
            log::info!("Window resized to: {}x{}", event.width, event.height);
            viewport.set_viewport(
                0,
                0,
                i32::try_from(event.width).unwrap_or(i32::MAX),
                i32::try_from(event.height).unwrap_or(i32::MAX),
            );
        });
    }

    log::info!("Press ESC to exit");
    log::info!("Press SPACE to test key events");
    log::info!("Click mouse buttons to test mouse events");

    let code = app.run();
    log::debug!("Cursor moved {} times", moves.get());
    app.shutdown();
    std::process::exit(code);
}
