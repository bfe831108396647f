//! Input event queue.
//!
//! winit callbacks never touch the camera directly. They translate their
//! events into [`InputEvent`]s and push them onto an [`InputQueue`], which the
//! frame drains exactly once through [`InputState::drain`]. Draining applies
//! mouse motion and scroll offsets in arrival order, then performs at most one
//! camera move for the keys held at that point.

use std::collections::{HashSet, VecDeque};

use winit::event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::{Camera, Projection};

/// The keys the demo reacts to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    S,
    A,
    D,
    Up,
    Down,
    Escape,
}

impl Key {
    pub fn from_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::KeyW => Some(Key::W),
            KeyCode::KeyS => Some(Key::S),
            KeyCode::KeyA => Some(Key::A),
            KeyCode::KeyD => Some(Key::D),
            KeyCode::ArrowUp => Some(Key::Up),
            KeyCode::ArrowDown => Some(Key::Down),
            KeyCode::Escape => Some(Key::Escape),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key { key: Key, pressed: bool },
    /// Raw mouse motion; `dy` grows downwards.
    MouseMoved { dx: f64, dy: f64 },
    Scrolled { dy: f32 },
    Resized { width: u32, height: u32 },
    CloseRequested,
}

/// What the event loop has to do with an event before the next frame runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Urgency {
    /// Waits in the queue for the next frame.
    Deferred,
    /// Needs a frame even if the platform stopped sending redraws.
    Redraw,
    /// Ends the event loop now.
    Exit,
}

impl InputEvent {
    pub fn urgency(&self) -> Urgency {
        match self {
            InputEvent::CloseRequested => Urgency::Exit,
            InputEvent::Resized { .. } => Urgency::Redraw,
            _ => Urgency::Deferred,
        }
    }
}

/// Translates a winit window event into an [`InputEvent`].
///
/// Returns `None` for events the demo does not consume.
pub fn translate_window_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            let PhysicalKey::Code(code) = event.physical_key else {
                return None;
            };
            Key::from_code(code).map(|key| InputEvent::Key {
                key,
                pressed: event.state == ElementState::Pressed,
            })
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let dy = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                // roughly one line per 20 physical pixels on touchpads
                MouseScrollDelta::PixelDelta(p) => (p.y / 20.0) as f32,
            };
            Some(InputEvent::Scrolled { dy })
        }
        WindowEvent::Resized(size) => Some(InputEvent::Resized {
            width: size.width,
            height: size.height,
        }),
        WindowEvent::CloseRequested => Some(InputEvent::CloseRequested),
        _ => None,
    }
}

/// Translates raw device motion into an [`InputEvent`].
///
/// Relative motion keeps arriving while the cursor is grabbed, so looking
/// around is not bounded by the window edges.
pub fn translate_device_event(event: &DeviceEvent) -> Option<InputEvent> {
    match event {
        DeviceEvent::MouseMotion { delta: (dx, dy) } => Some(InputEvent::MouseMoved { dx: *dx, dy: *dy }),
        _ => None,
    }
}

/// FIFO of events collected between two frames.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }
}

impl Extend<InputEvent> for InputQueue {
    fn extend<I: IntoIterator<Item = InputEvent>>(&mut self, events: I) {
        self.events.extend(events);
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl Movement {
    pub fn apply(self, camera: &mut Camera) {
        match self {
            Movement::Forward => camera.move_forward(),
            Movement::Backward => camera.move_backward(),
            Movement::Left => camera.move_left(),
            Movement::Right => camera.move_right(),
            Movement::Up => camera.move_up(),
            Movement::Down => camera.move_down(),
        }
    }
}

// Only the first held key in this order moves the camera in a given frame.
const MOVEMENT_PRIORITY: [(Key, Movement); 6] = [
    (Key::W, Movement::Forward),
    (Key::S, Movement::Backward),
    (Key::A, Movement::Left),
    (Key::D, Movement::Right),
    (Key::Up, Movement::Up),
    (Key::Down, Movement::Down),
];

/// What the frame has to act on after the queue was drained.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameRequests {
    pub close: bool,
    pub resize: Option<(u32, u32)>,
    pub movement: Option<Movement>,
}

/// Input state that persists across frames.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn movement(&self) -> Option<Movement> {
        MOVEMENT_PRIORITY
            .iter()
            .find(|(key, _)| self.held.contains(key))
            .map(|(_, movement)| *movement)
    }

    /// Drains `queue` and applies it to the camera and projection.
    ///
    /// Camera speed must already be set for this frame; the selected movement
    /// is applied once after all queued events.
    pub fn drain(
        &mut self,
        queue: &mut InputQueue,
        camera: &mut Camera,
        projection: &mut Projection,
    ) -> FrameRequests {
        let mut requests = FrameRequests::default();
        for event in queue.drain() {
            match event {
                InputEvent::Key { key, pressed: true } => {
                    self.held.insert(key);
                }
                InputEvent::Key { key, pressed: false } => {
                    self.held.remove(&key);
                }
                InputEvent::MouseMoved { dx, dy } => camera.rotate(dx as f32, dy as f32),
                InputEvent::Scrolled { dy } => projection.zoom(dy),
                InputEvent::Resized { width, height } => {
                    requests.resize = Some((width, height));
                }
                InputEvent::CloseRequested => requests.close = true,
            }
        }

        if self.held.contains(&Key::Escape) {
            requests.close = true;
        }
        requests.movement = self.movement();
        if let Some(movement) = requests.movement {
            movement.apply(camera);
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::Deg;

    use super::*;

    fn camera_and_projection() -> (Camera, Projection) {
        let mut camera = Camera::new((0.0, 0.0, 3.0), (0.0, 0.0, -1.0), (0.0, 1.0, 0.0));
        camera.set_speed(1.0);
        (camera, Projection::new(800, 600, Deg(45.0), 0.1, 100.0))
    }

    fn press(key: Key) -> InputEvent {
        InputEvent::Key { key, pressed: true }
    }

    fn release(key: Key) -> InputEvent {
        InputEvent::Key { key, pressed: false }
    }

    #[test]
    fn queue_is_empty_after_drain() {
        let (mut camera, mut projection) = camera_and_projection();
        let mut queue = InputQueue::new();
        queue.push(InputEvent::Scrolled { dy: 1.0 });
        queue.push(InputEvent::MouseMoved { dx: 10.0, dy: 10.0 });
        assert_eq!(queue.len(), 2);

        InputState::new().drain(&mut queue, &mut camera, &mut projection);
        assert!(queue.is_empty());
    }

    fn wheel(delta: MouseScrollDelta) -> WindowEvent {
        WindowEvent::MouseWheel {
            device_id: winit::event::DeviceId::dummy(),
            delta,
            phase: winit::event::TouchPhase::Moved,
        }
    }

    fn motion(dx: f64, dy: f64) -> DeviceEvent {
        DeviceEvent::MouseMotion { delta: (dx, dy) }
    }

    #[test]
    fn mouse_motion_becomes_relative_offsets() {
        assert_eq!(
            translate_device_event(&motion(12.0, -3.0)),
            Some(InputEvent::MouseMoved { dx: 12.0, dy: -3.0 })
        );
        assert_eq!(translate_device_event(&DeviceEvent::Added), None);
    }

    #[test]
    fn motion_past_the_window_edge_keeps_turning() {
        let (mut camera, mut projection) = camera_and_projection();
        let mut state = InputState::new();
        let mut queue = InputQueue::new();
        // far more travel than an 800 pixel window could report as cursor positions
        for _ in 0..10 {
            queue.extend(translate_device_event(&motion(400.0, 0.0)));
        }
        state.drain(&mut queue, &mut camera, &mut projection);
        assert_relative_eq!(camera.yaw().0, -90.0 + 40.0, epsilon = 1e-4);
    }

    #[test]
    fn moving_the_mouse_down_pitches_up() {
        let (mut camera, mut projection) = camera_and_projection();
        let mut queue = InputQueue::new();
        queue.extend(translate_device_event(&motion(0.0, 500.0)));
        InputState::new().drain(&mut queue, &mut camera, &mut projection);
        assert_relative_eq!(camera.pitch().0, 5.0, epsilon = 1e-4);
        assert!(camera.front().y > 0.0);
    }

    #[test]
    fn large_mouse_motion_reaches_the_pitch_limit() {
        let (mut camera, mut projection) = camera_and_projection();
        let mut queue = InputQueue::new();
        queue.extend(translate_device_event(&motion(0.0, 9000.0)));
        InputState::new().drain(&mut queue, &mut camera, &mut projection);
        assert_relative_eq!(camera.pitch().0, 89.0);
    }

    #[test]
    fn wheel_deltas_become_scroll_events() {
        let (mut camera, mut projection) = camera_and_projection();
        let mut queue = InputQueue::new();
        queue.extend(translate_window_event(&wheel(MouseScrollDelta::LineDelta(0.0, 2.0))));
        queue.extend(translate_window_event(&wheel(MouseScrollDelta::PixelDelta(
            winit::dpi::PhysicalPosition::new(0.0, 60.0),
        ))));
        let events: Vec<_> = queue.drain().collect();
        assert_eq!(
            events,
            vec![InputEvent::Scrolled { dy: 2.0 }, InputEvent::Scrolled { dy: 3.0 }]
        );

        queue.extend(events);
        InputState::new().drain(&mut queue, &mut camera, &mut projection);
        assert_relative_eq!(projection.fovy().0, 40.0);
    }

    #[test]
    fn window_lifecycle_events_are_translated() {
        assert_eq!(
            translate_window_event(&WindowEvent::Resized(winit::dpi::PhysicalSize::new(640, 480))),
            Some(InputEvent::Resized { width: 640, height: 480 })
        );
        assert_eq!(
            translate_window_event(&WindowEvent::CloseRequested),
            Some(InputEvent::CloseRequested)
        );
        assert_eq!(translate_window_event(&WindowEvent::Focused(true)), None);
    }

    #[test]
    fn only_one_movement_per_frame() {
        let (mut camera, mut projection) = camera_and_projection();
        let mut state = InputState::new();
        let mut queue = InputQueue::new();
        queue.push(press(Key::D));
        queue.push(press(Key::W));

        let requests = state.drain(&mut queue, &mut camera, &mut projection);
        assert_eq!(requests.movement, Some(Movement::Forward));
        assert_relative_eq!(camera.position.x, 0.0);
        assert_relative_eq!(camera.position.z, 2.0);

        queue.push(release(Key::W));
        let requests = state.drain(&mut queue, &mut camera, &mut projection);
        assert_eq!(requests.movement, Some(Movement::Right));
        assert_relative_eq!(camera.position.x, 1.0);
    }

    #[test]
    fn held_key_keeps_moving_without_new_events() {
        let (mut camera, mut projection) = camera_and_projection();
        let mut state = InputState::new();
        let mut queue = InputQueue::new();
        queue.push(press(Key::Up));
        state.drain(&mut queue, &mut camera, &mut projection);
        state.drain(&mut queue, &mut camera, &mut projection);
        assert_relative_eq!(camera.position.y, 2.0);
        assert!(state.is_held(Key::Up));
    }

    #[test]
    fn escape_and_close_request_close() {
        let (mut camera, mut projection) = camera_and_projection();
        let mut state = InputState::new();
        let mut queue = InputQueue::new();
        assert!(!state.drain(&mut queue, &mut camera, &mut projection).close);

        queue.push(press(Key::Escape));
        assert!(state.drain(&mut queue, &mut camera, &mut projection).close);

        let mut state = InputState::new();
        queue.push(InputEvent::CloseRequested);
        assert!(state.drain(&mut queue, &mut camera, &mut projection).close);
    }

    #[test]
    fn events_apply_in_arrival_order() {
        let (mut camera, mut projection) = camera_and_projection();
        let mut state = InputState::new();
        let mut queue = InputQueue::new();
        queue.push(InputEvent::MouseMoved { dx: 0.0, dy: 5000.0 });
        queue.push(InputEvent::MouseMoved { dx: 0.0, dy: 4000.0 });
        queue.push(InputEvent::Resized { width: 640, height: 480 });
        queue.push(InputEvent::Resized { width: 1024, height: 768 });
        queue.push(InputEvent::Scrolled { dy: 5.0 });

        let requests = state.drain(&mut queue, &mut camera, &mut projection);
        assert_relative_eq!(camera.pitch().0, 89.0);
        assert_eq!(requests.resize, Some((1024, 768)));
        assert_relative_eq!(projection.fovy().0, 40.0);
    }

    #[test]
    fn close_and_resize_do_not_wait_for_a_redraw() {
        let close = translate_window_event(&WindowEvent::CloseRequested);
        assert_eq!(close.map(|e| e.urgency()), Some(Urgency::Exit));

        let resize = translate_window_event(&WindowEvent::Resized(winit::dpi::PhysicalSize::new(1, 1)));
        assert_eq!(resize.map(|e| e.urgency()), Some(Urgency::Redraw));

        assert_eq!(InputEvent::Scrolled { dy: 1.0 }.urgency(), Urgency::Deferred);
        assert_eq!(press(Key::Escape).urgency(), Urgency::Deferred);
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(Key::from_code(KeyCode::KeyQ), None);
        assert_eq!(Key::from_code(KeyCode::ArrowDown), Some(Key::Down));
    }
}
