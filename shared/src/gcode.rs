//! G-code command builder
//!
//! Commands are opaque strings to the printer host; this module only
//! assembles the handful the panel sends.

/// Relative coordinate mode
pub const RELATIVE_POSITIONING: &str = "G91";
/// Absolute coordinate mode
pub const ABSOLUTE_POSITIONING: &str = "G90";
/// Linear move
pub const MOVE: &str = "G1";
/// Home axes
pub const HOME: &str = "G28";
/// Set hotend target temperature
pub const SET_HOTEND_TEMP: &str = "M104";
/// Set bed target temperature
pub const SET_BED_TEMP: &str = "M140";

/// Default feed rate (mm/min)
pub const DEFAULT_SPEED: u32 = 3000;
/// Slow feed rate
pub const SLOW_SPEED: u32 = 1000;
/// Fast feed rate
pub const FAST_SPEED: u32 = 5000;

/// Machine axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
    E,
}

impl Axis {
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::E => 'E',
        }
    }
}

impl std::str::FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X" => Ok(Axis::X),
            "Y" => Ok(Axis::Y),
            "Z" => Ok(Axis::Z),
            "E" => Ok(Axis::E),
            other => Err(format!("unknown axis: {other}")),
        }
    }
}

/// G-code script builder
///
/// Lines are joined with `\n`, which the printer host runs in order.
#[derive(Debug, Default, Clone)]
pub struct GcodeBuilder {
    lines: Vec<String>,
}

impl GcodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw line
    pub fn raw(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn relative(&mut self) -> &mut Self {
        self.raw(RELATIVE_POSITIONING)
    }

    pub fn absolute(&mut self) -> &mut Self {
        self.raw(ABSOLUTE_POSITIONING)
    }

    /// `G1` move by the given distances at `speed` mm/min
    pub fn move_by(&mut self, moves: &[(Axis, f64)], speed: u32) -> &mut Self {
        let mut line = String::from(MOVE);
        for (axis, distance) in moves {
            line.push(' ');
            line.push(axis.letter());
            line.push_str(&format_number(*distance));
        }
        line.push_str(&format!(" F{speed}"));
        self.raw(line)
    }

    /// `G28`, homing all axes when `axes` is empty
    pub fn home(&mut self, axes: &[Axis]) -> &mut Self {
        let mut line = String::from(HOME);
        for axis in axes {
            line.push(' ');
            line.push(axis.letter());
        }
        self.raw(line)
    }

    pub fn hotend_temperature(&mut self, celsius: f64) -> &mut Self {
        self.raw(format!("{SET_HOTEND_TEMP} S{}", format_number(celsius)))
    }

    pub fn bed_temperature(&mut self, celsius: f64) -> &mut Self {
        self.raw(format!("{SET_BED_TEMP} S{}", format_number(celsius)))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Build the script
    pub fn build(&self) -> String {
        self.lines.join("\n")
    }
}

/// Jog relative to the current position, restoring absolute mode afterwards
pub fn jog(axis: Axis, distance: f64, speed: u32) -> String {
    GcodeBuilder::new()
        .relative()
        .move_by(&[(axis, distance)], speed)
        .absolute()
        .build()
}

/// Home the given axes (all when empty)
pub fn home(axes: &[Axis]) -> String {
    GcodeBuilder::new().home(axes).build()
}

// Integers print without a fractional part: 10.0 -> "10", 0.5 -> "0.5"
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
