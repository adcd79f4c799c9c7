//! Platform-agnostic keyboard handling for the driving controls

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),
    FocusLost,
    VisibilityChanged { visible: bool },
}

/// Driving controls currently held
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub reset: bool,
}

/// Which control a key drives
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Forward,
    Backward,
    Left,
    Right,
    Reset,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent, bindings: &KeyBindings) {
        match event {
            InputEvent::KeyDown(key) => {
                if let Some(control) = bindings.control_for(key) {
                    self.set(control, true);
                }
            }
            InputEvent::KeyUp(key) => {
                if let Some(control) = bindings.control_for(key) {
                    self.set(control, false);
                }
            }
            InputEvent::FocusLost | InputEvent::VisibilityChanged { .. } => {
                self.clear_keys();
            }
        }
    }

    pub fn set(&mut self, control: Control, held: bool) {
        match control {
            Control::Forward => self.forward = held,
            Control::Backward => self.backward = held,
            Control::Left => self.left = held,
            Control::Right => self.right = held,
            Control::Reset => self.reset = held,
        }
    }

    pub fn clear_keys(&mut self) {
        *self = Self::default();
    }
}

/// Key mapping configuration. Letters match case-insensitively.
#[derive(Clone, Debug)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub reset: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = |ks: &[&str]| ks.iter().map(|k| k.to_string()).collect::<Vec<_>>();
        Self {
            forward: keys(&["w", "ArrowUp"]),
            backward: keys(&["s", "ArrowDown"]),
            left: keys(&["a", "ArrowLeft"]),
            right: keys(&["d", "ArrowRight"]),
            reset: keys(&["r"]),
        }
    }
}

impl KeyBindings {
    pub fn control_for(&self, key: &str) -> Option<Control> {
        let matches = |keys: &[String]| keys.iter().any(|k| k.eq_ignore_ascii_case(key));
        if matches(&self.forward) {
            Some(Control::Forward)
        } else if matches(&self.backward) {
            Some(Control::Backward)
        } else if matches(&self.left) {
            Some(Control::Left)
        } else if matches(&self.right) {
            Some(Control::Right)
        } else if matches(&self.reset) {
            Some(Control::Reset)
        } else {
            None
        }
    }

    /// Keys whose browser default (page scrolling) should be suppressed
    pub fn is_bound(&self, key: &str) -> bool {
        self.control_for(key).is_some()
    }
}

pub mod wasm {
    use super::*;
    use web_sys::KeyboardEvent;

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let key = e.key();
        if is_down {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use super::*;
    use winit::event::ElementState;
    use winit::keyboard::KeyCode;

    /// Browser `KeyboardEvent.key` name for the keys the game cares about
    pub fn key_name(code: KeyCode) -> Option<&'static str> {
        let name = match code {
            KeyCode::KeyW => "w",
            KeyCode::KeyA => "a",
            KeyCode::KeyS => "s",
            KeyCode::KeyD => "d",
            KeyCode::KeyR => "r",
            KeyCode::ArrowUp => "ArrowUp",
            KeyCode::ArrowDown => "ArrowDown",
            KeyCode::ArrowLeft => "ArrowLeft",
            KeyCode::ArrowRight => "ArrowRight",
            _ => return None,
        };
        Some(name)
    }

    pub fn key_to_input(code: KeyCode, state: ElementState) -> Option<InputEvent> {
        let key = key_name(code)?.to_string();
        Some(match state {
            ElementState::Pressed => InputEvent::KeyDown(key),
            ElementState::Released => InputEvent::KeyUp(key),
        })
    }
}
