use cubefield_common::Color;

/// A fixed-size 2D drawing target with canvas-style primitives.
///
/// Coordinates are in pixels from the top-left corner. Implementations clip:
/// anything outside `0..width, 0..height` is silently dropped.
pub trait DrawSurface {
    fn size(&self) -> (u32, u32);
    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color);
}

/// One recorded drawing call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    ClearRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
    },
    FillCircle {
        cx: f32,
        cy: f32,
        radius: f32,
        color: Color,
    },
}

/// A surface that records commands instead of rasterizing them.
///
/// Lets the frame pipeline draw the minimap at tick time and a UI layer
/// replay it later onto the real target.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn replay<S: DrawSurface + ?Sized>(&self, target: &mut S) {
        for cmd in &self.commands {
            match *cmd {
                DrawCommand::ClearRect { x, y, w, h } => target.clear_rect(x, y, w, h),
                DrawCommand::FillRect { x, y, w, h, color } => {
                    target.fill_rect(x, y, w, h, color)
                }
                DrawCommand::FillCircle {
                    cx,
                    cy,
                    radius,
                    color,
                } => target.fill_circle(cx, cy, radius, color),
            }
        }
    }
}

impl DrawSurface for DrawList {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// A full clear drops everything recorded so far; the list would
    /// otherwise grow by one frame of commands per tick.
    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        if x <= 0.0 && y <= 0.0 && x + w >= self.width as f32 && y + h >= self.height as f32 {
            self.commands.clear();
        }
        self.commands.push(DrawCommand::ClearRect { x, y, w, h });
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.commands.push(DrawCommand::FillRect { x, y, w, h, color });
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        self.commands.push(DrawCommand::FillCircle {
            cx,
            cy,
            radius,
            color,
        });
    }
}

/// Software RGBA pixel buffer. A pixel is covered when its centre lies inside
/// the shape.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Number of pixels currently set to `color`.
    pub fn count(&self, color: Color) -> usize {
        self.pixels.iter().filter(|p| **p == color).count()
    }

    /// Pixel columns/rows whose centres fall in `[lo, hi)`, clipped to `max`.
    fn span(lo: f32, hi: f32, max: u32) -> std::ops::Range<u32> {
        let start = (lo - 0.5).ceil().clamp(0.0, max as f32) as u32;
        let end = (hi - 0.5).ceil().clamp(0.0, max as f32) as u32;
        start..end.max(start)
    }

    fn paint_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        for py in Self::span(y, y + h, self.height) {
            for px in Self::span(x, x + w, self.width) {
                self.pixels[(py * self.width + px) as usize] = color;
            }
        }
    }

    /// Render as text, one character per pixel: `legend` picks the glyph for a
    /// color and `.` stands for everything else.
    pub fn to_ascii(&self, legend: &[(Color, char)]) -> String {
        let mut out = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for row in self.pixels.chunks(self.width.max(1) as usize) {
            for p in row {
                let glyph = legend
                    .iter()
                    .find(|(c, _)| c == p)
                    .map(|(_, g)| *g)
                    .unwrap_or('.');
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

impl DrawSurface for PixelCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.paint_rect(x, y, w, h, Color::TRANSPARENT);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.paint_rect(x, y, w, h, color);
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        let r2 = radius * radius;
        for py in Self::span(cy - radius, cy + radius, self.height) {
            for px in Self::span(cx - radius, cx + radius, self.width) {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.pixels[(py * self.width + px) as usize] = color;
                }
            }
        }
    }
}
