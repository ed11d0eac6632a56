//! Native callback trampolines
//!
//! One free function per native hook. Each recovers the handler registered
//! in the window's user-data slot, builds the typed event and forwards it.
//! A window without a live handler swallows the event.

use std::cell::RefCell;
use std::rc::Rc;

use super::{
    KeyEvent, ListenerSlots, MouseButtonEvent, MouseMoveEvent, Slot, WindowResizeEvent, Key,
    Modifiers, MouseButton,
};
use crate::platform::{action, NativeEvent, NativeHandle, Platform};

/// Route one pumped native event to its trampoline
pub(super) fn dispatch(platform: &Platform, handle: NativeHandle, event: NativeEvent) {
    match event {
        NativeEvent::Key {
            key,
            scancode,
            action,
            mods,
        } => key_callback(platform, handle, key, scancode, action, mods),
        NativeEvent::MouseButton { button, action, mods } => {
            mouse_button_callback(platform, handle, button, action, mods);
        }
        NativeEvent::CursorPos { x, y } => cursor_pos_callback(platform, handle, x, y),
        NativeEvent::FramebufferSize { width, height } => {
            framebuffer_size_callback(platform, handle, width, height);
        }
        NativeEvent::Close => window_close_callback(platform, handle),
    }
}

fn key_callback(
    platform: &Platform,
    handle: NativeHandle,
    key: Key,
    scancode: i32,
    action: i32,
    mods: Modifiers,
) {
    let Some(slots) = handler_from_window(platform, handle) else {
        return;
    };
    let event = KeyEvent { key, scancode, mods };
    match action {
        action::PRESS => fire(&slots, |s| &mut s.key_press, |l| l(&event)),
        action::RELEASE => fire(&slots, |s| &mut s.key_release, |l| l(&event)),
        action::REPEAT => fire(&slots, |s| &mut s.key_repeat, |l| l(&event)),
        other => log::trace!("Dropping key event with unmapped action {other}"),
    }
}

fn mouse_button_callback(
    platform: &Platform,
    handle: NativeHandle,
    button: MouseButton,
    action: i32,
    mods: Modifiers,
) {
    let Some(slots) = handler_from_window(platform, handle) else {
        return;
    };
    let event = MouseButtonEvent { button, mods };
    match action {
        action::PRESS => fire(&slots, |s| &mut s.mouse_button_press, |l| l(&event)),
        action::RELEASE => fire(&slots, |s| &mut s.mouse_button_release, |l| l(&event)),
        other => log::trace!("Dropping mouse button event with unmapped action {other}"),
    }
}

fn cursor_pos_callback(platform: &Platform, handle: NativeHandle, x: f64, y: f64) {
    let Some(slots) = handler_from_window(platform, handle) else {
        return;
    };
    let event = MouseMoveEvent { x, y };
    fire(&slots, |s| &mut s.mouse_move, |l| l(&event));
}

fn framebuffer_size_callback(platform: &Platform, handle: NativeHandle, width: i32, height: i32) {
    let Some(slots) = handler_from_window(platform, handle) else {
        return;
    };
    let event = WindowResizeEvent {
        width: u32::try_from(width).unwrap_or(0),
        height: u32::try_from(height).unwrap_or(0),
    };
    log::debug!("Framebuffer of {handle:?} resized to {}x{}", event.width, event.height);
    fire(&slots, |s| &mut s.window_resize, |l| l(&event));
}

fn window_close_callback(platform: &Platform, handle: NativeHandle) {
    let Some(slots) = handler_from_window(platform, handle) else {
        return;
    };
    log::debug!("Close requested for {handle:?}");
    fire(&slots, |s| &mut s.window_close, |l| l());
}

/// Recover the handler stored in the window's user-data slot
fn handler_from_window(platform: &Platform, handle: NativeHandle) -> Option<Rc<RefCell<ListenerSlots>>> {
    platform.user_data(handle)?.upgrade()
}

/// Call the listener in one slot, if any
///
/// The listener is taken out of the slot for the duration of the call so it
/// can freely replace or clear slots on the same handler.
fn fire<L: ?Sized>(
    slots: &RefCell<ListenerSlots>,
    select: impl Fn(&mut ListenerSlots) -> &mut Slot<L>,
    call: impl FnOnce(&mut L),
) {
    let checked_out = select(&mut slots.borrow_mut()).checkout();
    let Some((mut listener, revision)) = checked_out else {
        return;
    };
    call(&mut listener);
    select(&mut slots.borrow_mut()).checkin(listener, revision);
}
