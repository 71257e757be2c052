use std::fmt;

use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, RadialGradient, Rect, SpreadMode,
    Stroke, Transform,
};

use crate::{
    render::{
        Color, DisplayList, DrawCommand, Glow, GradientStop, Path, PathVerb, Point, Surface,
        SurfaceSize,
    },
    Result, VideoNoiseError,
};

/// Layers used to fake a blurred halo; tiny-skia has no shadow blur.
const GLOW_LAYERS: usize = 4;
/// Total opacity spread across the glow layers.
const GLOW_STRENGTH: f32 = 0.45;

/// Software [`Surface`] backed by a tiny-skia pixmap.
pub struct RasterSurface {
    size: SurfaceSize,
    pixmap: Option<Pixmap>,
    transform: Transform,
}

impl RasterSurface {
    /// Creates a surface with no backing raster until the first resize.
    pub fn new() -> Self {
        Self {
            size: SurfaceSize::default(),
            pixmap: None,
            transform: Transform::identity(),
        }
    }

    pub fn with_size(size: SurfaceSize) -> Result<Self> {
        let mut surface = Self::new();
        surface.resize(size)?;
        Ok(surface)
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    /// Straight-alpha RGBA value of a backing pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let pixel = self.pixmap.as_ref()?.pixel(x, y)?.demultiply();
        Some([pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()])
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let pixmap = self
            .pixmap
            .as_ref()
            .ok_or_else(|| VideoNoiseError::Encode("surface has no backing raster".to_string()))?;
        pixmap
            .encode_png()
            .map_err(|err| VideoNoiseError::Encode(err.to_string()))
    }

    fn draw(pixmap: &mut Pixmap, transform: Transform, command: &DrawCommand) {
        match command {
            DrawCommand::Clear(color) => {
                if color.a >= 1.0 {
                    pixmap.fill(skia_color(*color));
                } else if let Some(rect) =
                    Rect::from_xywh(0.0, 0.0, pixmap.width() as f32, pixmap.height() as f32)
                {
                    pixmap.fill_rect(rect, &solid(*color), Transform::identity(), None);
                }
            }
            DrawCommand::FillRect {
                origin,
                size,
                color,
            } => {
                if let Some(rect) = Rect::from_xywh(origin.x, origin.y, size.width, size.height) {
                    pixmap.fill_rect(rect, &solid(*color), transform, None);
                }
            }
            DrawCommand::FillCircle {
                center,
                radius,
                color,
            } => fill_circle(pixmap, transform, *center, *radius, &solid(*color)),
            DrawCommand::RadialGradient {
                center,
                radius,
                stops,
                glow,
            } => {
                if let Some(glow) = glow {
                    for (spread, color) in glow_layers(glow) {
                        fill_circle(pixmap, transform, *center, radius + spread, &solid(color));
                    }
                }
                if let Some(paint) = gradient(*center, *radius, stops.as_slice()) {
                    fill_circle(pixmap, transform, *center, *radius, &paint);
                }
            }
            DrawCommand::StrokeCircle {
                center,
                radius,
                width,
                color,
            } => {
                if let Some(path) = PathBuilder::from_circle(center.x, center.y, *radius) {
                    pixmap.stroke_path(&path, &solid(*color), &stroke(*width), transform, None);
                }
            }
            DrawCommand::StrokePath {
                path,
                width,
                color,
                glow,
            } => {
                let Some(path) = skia_path(path) else {
                    return;
                };
                if let Some(glow) = glow {
                    for (spread, color) in glow_layers(glow) {
                        pixmap.stroke_path(
                            &path,
                            &solid(color),
                            &stroke(width + spread * 2.0),
                            transform,
                            None,
                        );
                    }
                }
                pixmap.stroke_path(&path, &solid(*color), &stroke(*width), transform, None);
            }
        }
    }
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for RasterSurface {
    fn resize(&mut self, size: SurfaceSize) -> Result<()> {
        // A zero-sized pixmap cannot exist; drawing is skipped until it grows.
        self.pixmap = Pixmap::new(size.backing_width(), size.backing_height());
        self.transform = Transform::from_scale(size.pixel_density, size.pixel_density);
        self.size = size;
        Ok(())
    }

    fn present(&mut self, frame: &DisplayList) -> Result<()> {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return Ok(());
        };

        for command in frame {
            Self::draw(pixmap, self.transform, command);
        }
        Ok(())
    }
}

impl fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterSurface")
            .field("size", &self.size)
            .field("allocated", &self.pixmap.is_some())
            .finish()
    }
}

fn skia_color(color: Color) -> tiny_skia::Color {
    let channel = |value: f32| if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
    tiny_skia::Color::from_rgba(
        channel(color.r),
        channel(color.g),
        channel(color.b),
        channel(color.a),
    )
    .unwrap_or(tiny_skia::Color::TRANSPARENT)
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

fn stroke(width: f32) -> Stroke {
    Stroke {
        width: width.max(0.0),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

fn gradient(center: Point, radius: f32, stops: &[GradientStop]) -> Option<Paint<'static>> {
    let stops = stops
        .iter()
        .map(|stop| tiny_skia::GradientStop::new(stop.offset, skia_color(stop.color)))
        .collect();
    let point = tiny_skia::Point::from_xy(center.x, center.y);
    let shader = RadialGradient::new(
        point,
        point,
        radius,
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    )?;

    Some(Paint {
        shader,
        anti_alias: true,
        ..Paint::default()
    })
}

fn fill_circle(
    pixmap: &mut Pixmap,
    transform: Transform,
    center: Point,
    radius: f32,
    paint: &Paint,
) {
    if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
        pixmap.fill_path(&path, paint, FillRule::Winding, transform, None);
    }
}

/// Widest layer first, each spread paired with its translucent colour.
fn glow_layers(glow: &Glow) -> impl Iterator<Item = (f32, Color)> + '_ {
    let blur = if glow.blur.is_finite() { glow.blur.max(0.0) } else { 0.0 };
    let alpha = glow.color.a * GLOW_STRENGTH / GLOW_LAYERS as f32;
    (1..=GLOW_LAYERS)
        .rev()
        .filter(move |_| blur > 0.0)
        .map(move |layer| {
            let spread = blur * layer as f32 / GLOW_LAYERS as f32;
            (spread, glow.color.with_alpha(alpha))
        })
}

fn skia_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::with_capacity(path.len(), path.len() * 2);
    for verb in path.verbs() {
        match *verb {
            PathVerb::MoveTo(to) => builder.move_to(to.x, to.y),
            PathVerb::LineTo(to) => builder.line_to(to.x, to.y),
            PathVerb::QuadTo { ctrl, to } => builder.quad_to(ctrl.x, ctrl.y, to.x, to.y),
        }
    }
    builder.finish()
}
