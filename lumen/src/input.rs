use glam::Vec2;
use lumen_render::camera_controller::MovementIntent;
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Key {
    W,
    A,
    S,
    D,
    E,
    Q,
}

/// What the UI layer reports about the scene viewport for one frame.
#[derive(Clone, Debug)]
pub struct ViewportInput {
    pub focused: bool,
    pub hovered: bool,
    /// Panel size in pixels.
    pub size: Vec2,
    pub held_keys: HashSet<Key>,
    pub mouse_position: Vec2,
    pub right_mouse_down: bool,
    pub scroll: f32,
}

impl Default for ViewportInput {
    fn default() -> Self {
        Self {
            focused: false,
            hovered: false,
            size: Vec2::new(1280.0, 720.0),
            held_keys: HashSet::new(),
            mouse_position: Vec2::ZERO,
            right_mouse_down: false,
            scroll: 0.0,
        }
    }
}

impl ViewportInput {
    pub fn is_active(&self) -> bool {
        self.focused || self.hovered
    }

    /// W/S forward and back, A/D strafe, E/Q up and down.
    pub fn movement(&self) -> MovementIntent {
        let held = |key| self.held_keys.contains(&key);
        MovementIntent {
            forward: held(Key::W),
            backward: held(Key::S),
            left: held(Key::A),
            right: held(Key::D),
            up: held(Key::E),
            down: held(Key::Q),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_movement() {
        let input = ViewportInput {
            held_keys: [Key::W, Key::Q].into_iter().collect(),
            ..Default::default()
        };

        assert_eq!(
            input.movement(),
            MovementIntent {
                forward: true,
                down: true,
                ..Default::default()
            }
        );
    }
}
