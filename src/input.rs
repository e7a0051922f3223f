use glam::Vec2;

/// Pointer events in field coordinates.
/// The front end translates terminal mouse events into these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Cursor moved with no button held
    PointerMove { x: f32, y: f32 },
    /// Primary button pressed
    PointerDown { x: f32, y: f32 },
    /// Cursor moved with the primary button held
    PointerDrag { x: f32, y: f32 },
    /// Cursor left the field area
    PointerLeave,
}

impl InputEvent {
    /// Position carried by the event, if any
    pub fn position(&self) -> Option<Vec2> {
        match *self {
            InputEvent::PointerMove { x, y }
            | InputEvent::PointerDown { x, y }
            | InputEvent::PointerDrag { x, y } => Some(Vec2::new(x, y)),
            InputEvent::PointerLeave => None,
        }
    }
}

/// Last observed pointer position; last write wins.
/// Written by the input side, read once per tick, never blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerState {
    position: Option<Vec2>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new pointer position
    pub fn set(&mut self, position: Vec2) {
        self.position = Some(position);
    }

    /// Forget the pointer (it left the field)
    pub fn clear(&mut self) {
        self.position = None;
    }

    /// Current position, if the pointer is over the field
    pub fn get(&self) -> Option<Vec2> {
        self.position
    }

    /// Update from an event
    pub fn observe(&mut self, event: &InputEvent) {
        match event.position() {
            Some(position) => self.set(position),
            None => self.clear(),
        }
    }
}

/// A queue of input events.
/// The event loop pushes; the app drains once per frame.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Take all pending events, leaving the queue empty
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }
}
