//! Raw joystick value normalization
//!
//! Converts raw driver readings into the normalized values the pipeline
//! emits:
//!
//! - [`normalize_axis`]: signed 16-bit axis reading to [-1.0, 1.0]
//! - [`HatDirection`]: 8-way hat code to a direction and 2D vector

/// Divisor for negative raw axis values
///
/// Uses 32768.0 so that `i16::MIN` maps exactly to -1.0.
const AXIS_NEGATIVE_RANGE: f32 = 32768.0;

/// Divisor for non-negative raw axis values
const AXIS_POSITIVE_RANGE: f32 = 32767.0;

/// Normalize a raw axis reading with asymmetric scaling.
///
/// # Example
/// ```
/// use inputmap::input::joystick::normalize_axis;
///
/// assert_eq!(normalize_axis(-32768), -1.0);
/// assert_eq!(normalize_axis(0), 0.0);
/// assert_eq!(normalize_axis(32767), 1.0);
/// ```
pub fn normalize_axis(raw: i16) -> f32 {
    let value = if raw < 0 {
        raw as f32 / AXIS_NEGATIVE_RANGE
    } else {
        raw as f32 / AXIS_POSITIVE_RANGE
    };
    value.clamp(-1.0, 1.0)
}

/// Convert a normalized float reading back into the raw signed range.
///
/// Used by backends that report floats, so every backend feeds the same
/// raw path.
pub fn denormalize_axis(value: f32) -> i16 {
    let value = value.clamp(-1.0, 1.0);
    if value < 0.0 {
        (value * AXIS_NEGATIVE_RANGE).round() as i16
    } else {
        (value * AXIS_POSITIVE_RANGE).round() as i16
    }
}

/// Raw hat codes (bit flags: up=1, right=2, down=4, left=8)
pub mod hat_code {
    pub const CENTERED: u8 = 0x00;
    pub const UP: u8 = 0x01;
    pub const RIGHT: u8 = 0x02;
    pub const DOWN: u8 = 0x04;
    pub const LEFT: u8 = 0x08;
    pub const RIGHT_UP: u8 = RIGHT | UP;
    pub const RIGHT_DOWN: u8 = RIGHT | DOWN;
    pub const LEFT_UP: u8 = LEFT | UP;
    pub const LEFT_DOWN: u8 = LEFT | DOWN;
}

/// Direction of an 8-way hat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HatDirection {
    #[default]
    Centered,
    Up,
    RightUp,
    Right,
    RightDown,
    Down,
    LeftDown,
    Left,
    LeftUp,
}

impl HatDirection {
    /// Every non-centered direction, in key synthesis order
    pub const ALL: [HatDirection; 8] = [
        HatDirection::Up,
        HatDirection::RightUp,
        HatDirection::Right,
        HatDirection::RightDown,
        HatDirection::Down,
        HatDirection::LeftDown,
        HatDirection::Left,
        HatDirection::LeftUp,
    ];

    /// Decode a raw hat code. Unknown codes (opposing bits) read as centered.
    pub fn from_code(code: u8) -> Self {
        match code {
            hat_code::UP => HatDirection::Up,
            hat_code::RIGHT_UP => HatDirection::RightUp,
            hat_code::RIGHT => HatDirection::Right,
            hat_code::RIGHT_DOWN => HatDirection::RightDown,
            hat_code::DOWN => HatDirection::Down,
            hat_code::LEFT_DOWN => HatDirection::LeftDown,
            hat_code::LEFT => HatDirection::Left,
            hat_code::LEFT_UP => HatDirection::LeftUp,
            _ => HatDirection::Centered,
        }
    }

    /// Encode from pressed directions
    pub fn code_from_pressed(up: bool, right: bool, down: bool, left: bool) -> u8 {
        let mut code = hat_code::CENTERED;
        if up {
            code |= hat_code::UP;
        }
        if right {
            code |= hat_code::RIGHT;
        }
        if down {
            code |= hat_code::DOWN;
        }
        if left {
            code |= hat_code::LEFT;
        }
        code
    }

    /// Direction vector, north is (0, 1)
    pub fn vector(self) -> (i8, i8) {
        match self {
            HatDirection::Centered => (0, 0),
            HatDirection::Up => (0, 1),
            HatDirection::RightUp => (1, 1),
            HatDirection::Right => (1, 0),
            HatDirection::RightDown => (1, -1),
            HatDirection::Down => (0, -1),
            HatDirection::LeftDown => (-1, -1),
            HatDirection::Left => (-1, 0),
            HatDirection::LeftUp => (-1, 1),
        }
    }

    /// Name used in key identifiers
    pub fn name(self) -> &'static str {
        match self {
            HatDirection::Centered => "Centered",
            HatDirection::Up => "Up",
            HatDirection::RightUp => "RightUp",
            HatDirection::Right => "Right",
            HatDirection::RightDown => "RightDown",
            HatDirection::Down => "Down",
            HatDirection::LeftDown => "LeftDown",
            HatDirection::Left => "Left",
            HatDirection::LeftUp => "LeftUp",
        }
    }

    /// Position in [`HatDirection::ALL`], `None` when centered
    pub fn index(self) -> Option<usize> {
        Self::ALL.iter().position(|d| *d == self)
    }
}
