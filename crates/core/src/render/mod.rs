//! Backend-neutral drawing vocabulary. Themes describe a frame as a
//! [`DisplayList`] in logical units and a [`Surface`] turns it into pixels.

mod raster;

pub use raster::RasterSurface;

use serde::{Deserialize, Serialize};

use crate::{Result, VideoNoiseError};

/// Straight RGBA colour with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba8(r, g, b, 1.0)
    }

    pub fn rgba8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a,
        }
    }

    /// Parses `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(VideoNoiseError::msg(format!("invalid hex colour `{hex}`")));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| VideoNoiseError::msg(format!("invalid hex colour `{hex}`")))
        };
        Ok(Self::rgb8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Builds a colour from hue in degrees and saturation/lightness in
    /// percent. Out-of-range inputs are wrapped or clamped.
    pub fn hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 360.0;
        let s = (saturation / 100.0).clamp(0.0, 1.0);
        let l = (lightness / 100.0).clamp(0.0, 1.0);

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |t: f32| {
            let t = t.rem_euclid(1.0);
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        };

        Self::rgba(
            channel(h + 1.0 / 3.0),
            channel(h),
            channel(h - 1.0 / 3.0),
            alpha.clamp(0.0, 1.0),
        )
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

/// Logical drawing area in density-independent units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathVerb {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { ctrl: Point, to: Point },
}

/// Open polyline or curve built from [`PathVerb`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    verbs: Vec<PathVerb>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            verbs: Vec::with_capacity(capacity),
        }
    }

    pub fn move_to(&mut self, to: Point) {
        self.verbs.push(PathVerb::MoveTo(to));
    }

    pub fn line_to(&mut self, to: Point) {
        self.verbs.push(PathVerb::LineTo(to));
    }

    pub fn quad_to(&mut self, ctrl: Point, to: Point) {
        self.verbs.push(PathVerb::QuadTo { ctrl, to });
    }

    pub fn verbs(&self) -> &[PathVerb] {
        &self.verbs
    }

    pub fn len(&self) -> usize {
        self.verbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    /// Polyline through `points`, or an empty path for fewer than two.
    pub fn polyline(points: &[Point]) -> Self {
        let mut path = Self::with_capacity(points.len());
        if points.len() < 2 {
            return path;
        }
        path.move_to(points[0]);
        for point in &points[1..] {
            path.line_to(*point);
        }
        path
    }
}

/// Soft halo drawn behind a shape, like a canvas shadow with no offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub color: Color,
    pub blur: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Most stops a [`GradientStops`] can hold.
pub const MAX_GRADIENT_STOPS: usize = 4;

/// Inline, fixed-capacity gradient stop list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStops {
    stops: [GradientStop; MAX_GRADIENT_STOPS],
    len: usize,
}

impl GradientStops {
    /// Keeps at most [`MAX_GRADIENT_STOPS`] leading stops.
    pub fn new(stops: &[GradientStop]) -> Self {
        let len = stops.len().min(MAX_GRADIENT_STOPS);
        let mut inline = [GradientStop::new(0.0, Color::TRANSPARENT); MAX_GRADIENT_STOPS];
        inline[..len].copy_from_slice(&stops[..len]);
        Self { stops: inline, len }
    }

    pub fn as_slice(&self) -> &[GradientStop] {
        &self.stops[..self.len]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fills the whole surface.
    Clear(Color),
    FillRect {
        origin: Point,
        size: Size,
        color: Color,
    },
    FillCircle {
        center: Point,
        radius: f32,
        color: Color,
    },
    /// Circle filled with a radial gradient from its centre outwards.
    RadialGradient {
        center: Point,
        radius: f32,
        stops: GradientStops,
        glow: Option<Glow>,
    },
    StrokeCircle {
        center: Point,
        radius: f32,
        width: f32,
        color: Color,
    },
    StrokePath {
        path: Path,
        width: f32,
        color: Color,
        glow: Option<Glow>,
    },
}

/// Ordered draw commands for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn clear(&mut self, color: Color) {
        self.push(DrawCommand::Clear(color));
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }
}

impl<'a> IntoIterator for &'a DisplayList {
    type Item = &'a DrawCommand;
    type IntoIter = std::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// Display dimensions plus pixel density of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
    pub pixel_density: f32,
}

impl SurfaceSize {
    /// Non-positive or non-finite densities fall back to 1.
    pub fn new(width: f32, height: f32, pixel_density: f32) -> Result<Self> {
        if !(width.is_finite() && height.is_finite()) || width < 0.0 || height < 0.0 {
            return Err(VideoNoiseError::InvalidSurface(format!(
                "surface dimensions must be finite and non-negative, got {width}x{height}"
            )));
        }

        let pixel_density = if pixel_density.is_finite() && pixel_density > 0.0 {
            pixel_density
        } else {
            1.0
        };

        Ok(Self {
            width,
            height,
            pixel_density,
        })
    }

    pub fn backing_width(&self) -> u32 {
        (self.width * self.pixel_density).floor() as u32
    }

    pub fn backing_height(&self) -> u32 {
        (self.height * self.pixel_density).floor() as u32
    }

    /// Drawing area seen by themes: the backing raster divided by density.
    pub fn logical(&self) -> Size {
        Size::new(
            self.backing_width() as f32 / self.pixel_density,
            self.backing_height() as f32 / self.pixel_density,
        )
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            pixel_density: 1.0,
        }
    }
}

/// 2D raster target the engine draws into.
pub trait Surface {
    /// Reallocates the backing raster and reapplies the density transform.
    fn resize(&mut self, size: SurfaceSize) -> Result<()>;

    /// Replaces the visible frame with `frame`.
    fn present(&mut self, frame: &DisplayList) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_stops_hold_a_bounded_prefix() {
        let white = GradientStop::new(0.0, Color::WHITE);
        let clear = GradientStop::new(1.0, Color::TRANSPARENT);
        let stops = GradientStops::new(&[white, clear]);
        assert_eq!(stops.as_slice(), &[white, clear]);
        assert_eq!(stops, GradientStops::new(&[white, clear]));
        assert_ne!(stops, GradientStops::new(&[white]));

        let many = [white; MAX_GRADIENT_STOPS + 2];
        assert_eq!(GradientStops::new(&many).as_slice().len(), MAX_GRADIENT_STOPS);
        assert!(GradientStops::new(&[]).as_slice().is_empty());
    }

    #[test]
    fn parses_hex_colours() {
        let color = Color::from_hex("#66E3D5").unwrap();
        assert_eq!(color, Color::rgb8(0x66, 0xE3, 0xD5));
        assert_eq!(Color::from_hex("ff0000").unwrap(), Color::rgb8(255, 0, 0));
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#GG0000").is_err());
    }

    #[test]
    fn hsl_primaries() {
        let red = Color::hsla(0.0, 100.0, 50.0, 1.0);
        assert!((red.r - 1.0).abs() < 1e-5 && red.g.abs() < 1e-5 && red.b.abs() < 1e-5);

        let blue = Color::hsla(240.0, 100.0, 50.0, 0.5);
        assert!(blue.r.abs() < 1e-5 && (blue.b - 1.0).abs() < 1e-5);
        assert_eq!(blue.a, 0.5);

        // Lightness below zero clamps to black rather than going negative.
        let dark = Color::hsla(300.0, 100.0, -17.0, 0.9);
        assert_eq!((dark.r, dark.g, dark.b), (0.0, 0.0, 0.0));
    }

    #[test]
    fn backing_raster_follows_density() {
        let size = SurfaceSize::new(801.0, 600.0, 1.5).unwrap();
        assert_eq!(size.backing_width(), 1201);
        assert_eq!(size.backing_height(), 900);
        let logical = size.logical();
        assert!((logical.width - 1201.0 / 1.5).abs() < 1e-3);
        assert_eq!(logical.height, 600.0);
    }

    #[test]
    fn invalid_density_falls_back_to_one() {
        let size = SurfaceSize::new(100.0, 50.0, 0.0).unwrap();
        assert_eq!(size.pixel_density, 1.0);
        assert!(SurfaceSize::new(f32::NAN, 50.0, 1.0).is_err());
        assert!(SurfaceSize::new(-1.0, 50.0, 1.0).is_err());
    }

    #[test]
    fn polyline_needs_two_points() {
        assert!(Path::polyline(&[Point::new(1.0, 1.0)]).is_empty());
        let path = Path::polyline(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert_eq!(path.len(), 2);
    }
}
