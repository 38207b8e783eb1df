//! Input canonicalization.
//!
//! Raw device events from the host become one [`InputEvent`] per step:
//! view and document position, buttons, modifiers, wheel delta, key, a
//! gesture phase and a double-click flag. The event that started the
//! current gesture is kept separately so tools can compute drag vectors.

use serde::{Deserialize, Serialize};

use diagramkit_settings::InteractionSettings;

use crate::geometry::Point;
use crate::viewport::Viewport;

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Pressed mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons {
    pub left: bool,
    pub middle: bool,
    pub right: bool,
}

impl Buttons {
    pub fn any(&self) -> bool {
        self.left || self.middle || self.right
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => self.left,
            MouseButton::Middle => self.middle,
            MouseButton::Right => self.right,
        }
    }

    fn set(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.left = pressed,
            MouseButton::Middle => self.middle = pressed,
            MouseButton::Right => self.right = pressed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Enter,
    Left,
    Right,
    Up,
    Down,
    Char(char),
}

/// A device event as delivered by the host, in view pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawInput {
    MouseDown {
        x: f64,
        y: f64,
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        time_ms: u64,
    },
    MouseMove {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        time_ms: u64,
    },
    MouseUp {
        x: f64,
        y: f64,
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        time_ms: u64,
    },
    Wheel {
        x: f64,
        y: f64,
        /// Positive away from the user (zoom in).
        delta: f64,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        time_ms: u64,
    },
    KeyDown {
        key: Key,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        time_ms: u64,
    },
    FocusLost {
        #[serde(default)]
        time_ms: u64,
    },
}

impl RawInput {
    pub fn time_ms(&self) -> u64 {
        match self {
            RawInput::MouseDown { time_ms, .. }
            | RawInput::MouseMove { time_ms, .. }
            | RawInput::MouseUp { time_ms, .. }
            | RawInput::Wheel { time_ms, .. }
            | RawInput::KeyDown { time_ms, .. }
            | RawInput::FocusLost { time_ms } => *time_ms,
        }
    }
}

/// Interaction phase of a canonical event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Start,
    Continue,
    Finish,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    #[default]
    Mouse,
    Wheel,
    Key,
    Focus,
}

/// One canonical input step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputEvent {
    pub kind: InputKind,
    pub phase: Phase,
    pub view_point: Point,
    pub doc_point: Point,
    /// Button that changed state on this step, if any.
    pub button: Option<MouseButton>,
    /// Buttons held after this step.
    pub buttons: Buttons,
    pub modifiers: Modifiers,
    pub wheel_delta: f64,
    pub key: Option<Key>,
    pub double_click: bool,
    /// The gesture has moved past the drag threshold.
    pub dragging: bool,
    pub time_ms: u64,
}

impl InputEvent {
    /// Document-space vector from `first` to this event.
    pub fn doc_delta(&self, first: &InputEvent) -> (f64, f64) {
        (
            self.doc_point.x - first.doc_point.x,
            self.doc_point.y - first.doc_point.y,
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Click {
    at: Point,
    time_ms: u64,
    button: MouseButton,
}

/// Turns raw host events into canonical events.
#[derive(Debug, Clone)]
pub struct InputCanonicalizer {
    current: InputEvent,
    first: InputEvent,
    buttons: Buttons,
    modifiers: Modifiers,
    last_position: Point,
    last_click: Option<Click>,
    enabled: bool,
    double_click_ms: u64,
    drag_threshold_px: f64,
}

impl InputCanonicalizer {
    pub fn new(settings: &InteractionSettings) -> Self {
        Self {
            current: InputEvent::default(),
            first: InputEvent::default(),
            buttons: Buttons::default(),
            modifiers: Modifiers::NONE,
            last_position: Point::ORIGIN,
            last_click: None,
            enabled: true,
            double_click_ms: settings.double_click_ms,
            drag_threshold_px: settings.drag_threshold_px,
        }
    }

    pub fn current(&self) -> &InputEvent {
        &self.current
    }

    /// The event that started the current (or last) gesture.
    pub fn first(&self) -> &InputEvent {
        &self.first
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// While disabled, host input is ignored and the canonical record is
    /// left untouched; [`inject`](Self::inject) still works.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn in_gesture(&self) -> bool {
        self.buttons.any()
    }

    /// Canonicalizes host input. Returns `None` while input is disabled.
    pub fn canonicalize(&mut self, raw: &RawInput, viewport: &Viewport) -> Option<&InputEvent> {
        if !self.enabled {
            tracing::debug!("Input disabled, ignoring {:?}", raw);
            return None;
        }
        Some(self.inject(raw, viewport))
    }

    /// Canonicalizes an event regardless of the enabled flag.
    pub fn inject(&mut self, raw: &RawInput, viewport: &Viewport) -> &InputEvent {
        let mut event = InputEvent {
            time_ms: raw.time_ms(),
            dragging: self.current.dragging && self.buttons.any(),
            ..InputEvent::default()
        };

        match *raw {
            RawInput::MouseDown {
                x,
                y,
                button,
                modifiers,
                time_ms,
            } => {
                let at = Point::new(x, y);
                let starts_gesture = !self.buttons.any();
                self.buttons.set(button, true);
                self.modifiers = modifiers;
                event.phase = if starts_gesture { Phase::Start } else { Phase::Continue };
                event.button = Some(button);
                event.view_point = at;
                event.double_click = self.is_double_click(at, time_ms, button);
                self.last_click = if event.double_click {
                    None
                } else {
                    Some(Click { at, time_ms, button })
                };
                if starts_gesture {
                    event.dragging = false;
                }
            }
            RawInput::MouseMove { x, y, modifiers, .. } => {
                self.modifiers = modifiers;
                event.phase = Phase::Continue;
                event.view_point = Point::new(x, y);
            }
            RawInput::MouseUp {
                x,
                y,
                button,
                modifiers,
                ..
            } => {
                self.buttons.set(button, false);
                self.modifiers = modifiers;
                event.phase = if self.buttons.any() { Phase::Continue } else { Phase::Finish };
                event.button = Some(button);
                event.view_point = Point::new(x, y);
            }
            RawInput::Wheel {
                x, y, delta, modifiers, ..
            } => {
                self.modifiers = modifiers;
                event.kind = InputKind::Wheel;
                event.phase = Phase::Continue;
                event.view_point = Point::new(x, y);
                event.wheel_delta = delta;
            }
            RawInput::KeyDown { key, modifiers, .. } => {
                self.modifiers = modifiers;
                event.kind = InputKind::Key;
                event.phase = Phase::Start;
                event.view_point = self.last_position;
                event.key = Some(key);
            }
            RawInput::FocusLost { .. } => {
                self.buttons = Buttons::default();
                self.modifiers = Modifiers::NONE;
                event.kind = InputKind::Focus;
                event.phase = Phase::Cancel;
                event.view_point = self.last_position;
            }
        }

        event.buttons = self.buttons;
        event.modifiers = self.modifiers;
        event.doc_point = viewport.view_to_doc(event.view_point);
        self.last_position = event.view_point;

        if event.kind == InputKind::Mouse && event.phase == Phase::Start {
            self.first = event.clone();
        } else if event.kind == InputKind::Mouse
            && (self.buttons.any() || event.phase == Phase::Finish)
            && !event.dragging
            && event.view_point.distance_to(&self.first.view_point) > self.drag_threshold_px
        {
            event.dragging = true;
        }

        tracing::trace!("{:?} {:?} at {}", event.kind, event.phase, event.doc_point);
        self.current = event;
        &self.current
    }

    fn is_double_click(&self, at: Point, time_ms: u64, button: MouseButton) -> bool {
        self.last_click.is_some_and(|c| {
            c.button == button
                && time_ms.saturating_sub(c.time_ms) <= self.double_click_ms
                && c.at.distance_to(&at) <= self.drag_threshold_px
        })
    }

    /// Re-derives the current document point after the viewport changed
    /// under a stationary pointer (autoscroll, zoom during a drag).
    pub fn refresh_doc_points(&mut self, viewport: &Viewport) {
        self.current.doc_point = viewport.view_to_doc(self.current.view_point);
    }

    /// Forgets gesture state, e.g. after the document was replaced.
    pub fn reset(&mut self) {
        self.buttons = Buttons::default();
        self.current = InputEvent::default();
        self.first = InputEvent::default();
        self.last_click = None;
    }
}
