//! Event handling for keyboard, mouse and window notifications
//!
//! An [`EventHandler`] holds one optional listener per [`EventType`]. Once
//! attached to a [`Window`], the native hooks of that window route into the
//! handler through the trampolines in [`trampoline`]:
//!
//! ```text
//! native queue ─► EventHandler::poll_events ─► trampoline ─► listener slot
//! ```
//!
//! The window's user-data slot holds a weak back-reference to the handler's
//! listener storage. Attaching another handler to the same window replaces
//! it (last writer wins), and dropping a handler makes the reference dead,
//! so a stale handler is never invoked.

mod trampoline;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bitflags::bitflags;

use crate::platform::{NativeHandle, Platform, WeakPlatform};
use crate::window::Window;

/// Event types for the event system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Key pressed
    KeyPress,
    /// Key released
    KeyRelease,
    /// Key held and repeating
    KeyRepeat,
    /// Mouse button pressed
    MouseButtonPress,
    /// Mouse button released
    MouseButtonRelease,
    /// Cursor moved
    MouseMove,
    /// Framebuffer resized
    WindowResize,
    /// Close requested
    WindowClose,
}

impl EventType {
    /// Every event kind, in slot order
    pub const ALL: [Self; 8] = [
        Self::KeyPress,
        Self::KeyRelease,
        Self::KeyRepeat,
        Self::MouseButtonPress,
        Self::MouseButtonRelease,
        Self::MouseMove,
        Self::WindowResize,
        Self::WindowClose,
    ];
}

/// Native key code (GLFW numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(pub i32);

impl Key {
    /// Key the platform could not identify
    pub const UNKNOWN: Self = Self(-1);
    /// Space bar
    pub const SPACE: Self = Self(32);
    /// 0 key
    pub const NUM_0: Self = Self(48);
    /// A key
    pub const A: Self = Self(65);
    /// D key
    pub const D: Self = Self(68);
    /// Q key
    pub const Q: Self = Self(81);
    /// S key
    pub const S: Self = Self(83);
    /// W key
    pub const W: Self = Self(87);
    /// X key
    pub const X: Self = Self(88);
    /// Escape key
    pub const ESCAPE: Self = Self(256);
    /// Enter key
    pub const ENTER: Self = Self(257);
    /// Tab key
    pub const TAB: Self = Self(258);
    /// Backspace key
    pub const BACKSPACE: Self = Self(259);
    /// Right arrow
    pub const RIGHT: Self = Self(262);
    /// Left arrow
    pub const LEFT: Self = Self(263);
    /// Down arrow
    pub const DOWN: Self = Self(264);
    /// Up arrow
    pub const UP: Self = Self(265);
}

/// Native mouse button id (GLFW numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MouseButton(pub i32);

impl MouseButton {
    /// Left button
    pub const LEFT: Self = Self(0);
    /// Right button
    pub const RIGHT: Self = Self(1);
    /// Middle button
    pub const MIDDLE: Self = Self(2);
}

bitflags! {
    /// Modifier keys held during a key or mouse button event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: i32 {
        /// Shift
        const SHIFT = 0x0001;
        /// Control
        const CONTROL = 0x0002;
        /// Alt
        const ALT = 0x0004;
        /// Super / command / windows key
        const SUPER = 0x0008;
        /// Caps lock active
        const CAPS_LOCK = 0x0010;
        /// Num lock active
        const NUM_LOCK = 0x0020;
    }
}

/// Key event data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key code
    pub key: Key,
    /// Platform scancode
    pub scancode: i32,
    /// Modifier bits
    pub mods: Modifiers,
}

/// Mouse button event data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseButtonEvent {
    /// Button id
    pub button: MouseButton,
    /// Modifier bits
    pub mods: Modifiers,
}

/// Mouse move event data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseMoveEvent {
    /// Cursor x in screen coordinates
    pub x: f64,
    /// Cursor y in screen coordinates
    pub y: f64,
}

/// Window resize event data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowResizeEvent {
    /// New framebuffer width in pixels
    pub width: u32,
    /// New framebuffer height in pixels
    pub height: u32,
}

type KeyListener = dyn FnMut(&KeyEvent);
type MouseButtonListener = dyn FnMut(&MouseButtonEvent);
type MouseMoveListener = dyn FnMut(&MouseMoveEvent);
type WindowResizeListener = dyn FnMut(&WindowResizeEvent);
type WindowCloseListener = dyn FnMut();

/// One replaceable listener
///
/// The revision changes on every set or clear. A listener checked out for
/// a call is only put back if nobody touched the slot meanwhile, and it
/// still counts as set until then.
pub(crate) struct Slot<L: ?Sized> {
    listener: Option<Box<L>>,
    revision: u64,
    checked_out: Option<u64>,
}

impl<L: ?Sized> Default for Slot<L> {
    fn default() -> Self {
        Self {
            listener: None,
            revision: 0,
            checked_out: None,
        }
    }
}

impl<L: ?Sized> Slot<L> {
    fn set(&mut self, listener: Box<L>) {
        self.listener = Some(listener);
        self.revision += 1;
    }

    fn clear(&mut self) {
        self.listener = None;
        self.revision += 1;
    }

    fn is_set(&self) -> bool {
        self.listener.is_some() || self.checked_out == Some(self.revision)
    }

    fn checkout(&mut self) -> Option<(Box<L>, u64)> {
        let listener = self.listener.take()?;
        self.checked_out = Some(self.revision);
        Some((listener, self.revision))
    }

    fn checkin(&mut self, listener: Box<L>, revision: u64) {
        self.checked_out = None;
        if self.revision == revision {
            self.listener = Some(listener);
        }
    }
}

/// Listener storage shared between an [`EventHandler`] and the user-data slot
#[derive(Default)]
pub(crate) struct ListenerSlots {
    key_press: Slot<KeyListener>,
    key_release: Slot<KeyListener>,
    key_repeat: Slot<KeyListener>,
    mouse_button_press: Slot<MouseButtonListener>,
    mouse_button_release: Slot<MouseButtonListener>,
    mouse_move: Slot<MouseMoveListener>,
    window_resize: Slot<WindowResizeListener>,
    window_close: Slot<WindowCloseListener>,
}

impl ListenerSlots {
    fn clear(&mut self, kind: EventType) {
        match kind {
            EventType::KeyPress => self.key_press.clear(),
            EventType::KeyRelease => self.key_release.clear(),
            EventType::KeyRepeat => self.key_repeat.clear(),
            EventType::MouseButtonPress => self.mouse_button_press.clear(),
            EventType::MouseButtonRelease => self.mouse_button_release.clear(),
            EventType::MouseMove => self.mouse_move.clear(),
            EventType::WindowResize => self.window_resize.clear(),
            EventType::WindowClose => self.window_close.clear(),
        }
    }

    fn is_set(&self, kind: EventType) -> bool {
        match kind {
            EventType::KeyPress => self.key_press.is_set(),
            EventType::KeyRelease => self.key_release.is_set(),
            EventType::KeyRepeat => self.key_repeat.is_set(),
            EventType::MouseButtonPress => self.mouse_button_press.is_set(),
            EventType::MouseButtonRelease => self.mouse_button_release.is_set(),
            EventType::MouseMove => self.mouse_move.is_set(),
            EventType::WindowResize => self.window_resize.is_set(),
            EventType::WindowClose => self.window_close.is_set(),
        }
    }
}

/// Back-reference stored in a window's user-data slot
pub(crate) type HandlerSlot = Weak<RefCell<ListenerSlots>>;

struct Attachment {
    platform: WeakPlatform,
    handle: NativeHandle,
}

/// Event handler for input and window events
///
/// # Example
/// ```rust,no_run
/// use crazy::{EventHandler, Key, Platform, Window};
///
/// let platform = Platform::glfw();
/// platform.init().unwrap();
/// let window = Window::new(&platform, 640, 480, "events");
/// let close = window.close_handle();
///
/// let mut handler = EventHandler::new();
/// handler.set_key_press_callback(move |event| {
///     if event.key == Key::ESCAPE {
///         close.request_close();
///     }
/// });
/// handler.attach(&window);
///
/// while !window.should_close() {
///     EventHandler::poll_events(&platform);
/// }
/// ```
#[derive(Default)]
pub struct EventHandler {
    slots: Rc<RefCell<ListenerSlots>>,
    attachments: Vec<Attachment>,
}

impl EventHandler {
    /// Create a handler with every slot empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach this event handler to a window
    ///
    /// Records the handler in the window's user-data slot and installs the
    /// key, mouse-button, cursor-position, framebuffer-size and close hooks.
    /// A handler attached earlier to the same window stops receiving its
    /// events. Attaching to an invalid window does nothing.
    pub fn attach(&mut self, window: &Window) {
        let Some(handle) = window.native_handle() else {
            log::warn!("Ignoring attach to invalid window '{}'", window.title());
            return;
        };
        let platform = window.platform();
        let slot = Rc::downgrade(&self.slots);

        // Forget windows that were destroyed or taken over by another handler
        self.attachments.retain(|attachment| {
            attachment.handle != handle
                && attachment
                    .platform
                    .upgrade()
                    .is_some_and(|owner| owner.user_data_is(attachment.handle, &slot))
        });

        platform.set_user_data(handle, slot);
        platform.with_backend(|backend| backend.enable_event_hooks(handle));
        self.attachments.push(Attachment {
            platform: platform.downgrade(),
            handle,
        });
        log::debug!("Event handler attached to {handle:?}");
    }

    /// Set the key press callback
    pub fn set_key_press_callback(&mut self, callback: impl FnMut(&KeyEvent) + 'static) {
        self.slots.borrow_mut().key_press.set(Box::new(callback));
    }

    /// Set the key release callback
    pub fn set_key_release_callback(&mut self, callback: impl FnMut(&KeyEvent) + 'static) {
        self.slots.borrow_mut().key_release.set(Box::new(callback));
    }

    /// Set the key repeat callback
    pub fn set_key_repeat_callback(&mut self, callback: impl FnMut(&KeyEvent) + 'static) {
        self.slots.borrow_mut().key_repeat.set(Box::new(callback));
    }

    /// Set the mouse button press callback
    pub fn set_mouse_button_press_callback(
        &mut self,
        callback: impl FnMut(&MouseButtonEvent) + 'static,
    ) {
        self.slots.borrow_mut().mouse_button_press.set(Box::new(callback));
    }

    /// Set the mouse button release callback
    pub fn set_mouse_button_release_callback(
        &mut self,
        callback: impl FnMut(&MouseButtonEvent) + 'static,
    ) {
        self.slots.borrow_mut().mouse_button_release.set(Box::new(callback));
    }

    /// Set the mouse move callback
    ///
    /// Fires for every cursor position the platform reports, unfiltered.
    pub fn set_mouse_move_callback(&mut self, callback: impl FnMut(&MouseMoveEvent) + 'static) {
        self.slots.borrow_mut().mouse_move.set(Box::new(callback));
    }

    /// Set the window resize callback
    ///
    /// The handler does not touch the viewport; reconfigure it here.
    pub fn set_window_resize_callback(
        &mut self,
        callback: impl FnMut(&WindowResizeEvent) + 'static,
    ) {
        self.slots.borrow_mut().window_resize.set(Box::new(callback));
    }

    /// Set the window close callback
    ///
    /// The platform has already raised the close flag when this fires.
    /// Clearing it with [`CloseHandle::cancel_close`](crate::CloseHandle::cancel_close)
    /// keeps the window open.
    pub fn set_window_close_callback(&mut self, callback: impl FnMut() + 'static) {
        self.slots.borrow_mut().window_close.set(Box::new(callback));
    }

    /// Empty the slot for one event kind
    pub fn clear_callback(&mut self, kind: EventType) {
        self.slots.borrow_mut().clear(kind);
    }

    /// Whether a listener is registered for one event kind
    ///
    /// A listener that is currently running counts as registered unless it
    /// cleared or replaced its own slot.
    pub fn has_callback(&self, kind: EventType) -> bool {
        self.slots.borrow().is_set(kind)
    }

    /// Poll for events
    ///
    /// Pumps every pending native event of every window on `platform` and
    /// runs the matching listeners before returning. Call once per frame.
    pub fn poll_events(platform: &Platform) {
        for (handle, event) in platform.poll_events() {
            trampoline::dispatch(platform, handle, event);
        }
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        let slot = Rc::downgrade(&self.slots);
        for attachment in &self.attachments {
            if let Some(platform) = attachment.platform.upgrade() {
                platform.clear_user_data_if(attachment.handle, &slot);
            }
        }
    }
}
