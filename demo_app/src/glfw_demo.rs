//! Bare GLFW and OpenGL, no framework types
//!
//! The baseline the framework wraps: one 3.3 core window cleared to dark
//! blue until ESC is pressed.

use glfw::{Action, Context, Key, WindowEvent};

fn error_callback(error: glfw::Error, description: String) {
    log::error!("GLFW Error {error:?}: {description}");
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut glfw = match glfw::init(error_callback) {
        Ok(glfw) => glfw,
        Err(err) => {
            log::error!("Failed to initialize GLFW: {err:?}");
            std::process::exit(-1);
        }
    };

    glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
    glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
    #[cfg(target_os = "macos")]
    glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));

    let Some((mut window, events)) = glfw.create_window(
        800,
        600,
        "Crazy Framework - GLFW/OpenGL Demo",
        glfw::WindowMode::Windowed,
    ) else {
        log::error!("Failed to create GLFW window");
        std::process::exit(-1);
    };

    window.make_current();
    window.set_key_polling(true);
    gl::load_with(|symbol| window.get_proc_address(symbol) as *const _);

    glfw.set_swap_interval(glfw::SwapInterval::Sync(1));

    log::info!("GLFW/OpenGL initialized successfully!");
    // SAFETY: the context is current and the entry points are loaded
    let version = unsafe {
        let raw = gl::GetString(gl::VERSION);
        if raw.is_null() {
            "unavailable".to_string()
        } else {
            std::ffi::CStr::from_ptr(raw.cast()).to_string_lossy().into_owned()
        }
    };
    log::info!("OpenGL Version: {version}");
    log::info!("Press ESC to close the window");

    while !window.should_close() {
        // SAFETY: the context stays current on this thread for the whole loop
        unsafe {
            gl::ClearColor(0.1, 0.1, 0.2, 1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }

        window.swap_buffers();

        glfw.poll_events();
        for (_, event) in glfw::flush_messages(&events) {
            if let WindowEvent::Key(Key::Escape, _, Action::Press, _) = event {
                window.set_should_close(true);
            }
        }
    }

    drop(window);
    log::info!("GLFW/OpenGL demo terminated successfully");
}
