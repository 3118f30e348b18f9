//! Colors used by the charts
//!
//! Bar colors are plain RGBA arrays so chart models stay independent of the
//! UI toolkit; the frontend converts them to `egui::Color32` when drawing.

/// RGBA color, straight (not premultiplied) alpha
pub type Rgba = [u8; 4];

/// Color used for samples with no value
pub const MISSING_COLOR: Rgba = [127, 127, 127, 255];

/// The ten-color categorical palette (d3 "category10")
pub const D3_PALETTE: [Rgba; 10] = [
    [0x1F, 0x77, 0xB4, 0xFF],
    [0xFF, 0x7F, 0x0E, 0xFF],
    [0x2C, 0xA0, 0x2C, 0xFF],
    [0xD6, 0x27, 0x28, 0xFF],
    [0x95, 0x75, 0xD2, 0xFF],
    [0x8C, 0x56, 0x4B, 0xFF],
    [0xE3, 0x77, 0xC0, 0xFF],
    [0x7F, 0x7F, 0x7F, 0xFF],
    [0xBC, 0xBD, 0x22, 0xFF],
    [0x17, 0xBE, 0xCF, 0xFF],
];

/// Palette color `index`, wrapping around
pub fn palette(index: usize) -> Rgba {
    D3_PALETTE[index % D3_PALETTE.len()]
}

/// Replace the alpha channel of a color
pub fn with_alpha(color: Rgba, alpha: u8) -> Rgba {
    [color[0], color[1], color[2], alpha]
}

/// A continuous colorscale defined by sorted stops in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colorscale {
    stops: &'static [(f64, [u8; 3])],
}

/// Blue to yellow to red, used for latency, drop rate and SNR
pub const PORTLAND: Colorscale = Colorscale {
    stops: &[
        (0.0, [12, 51, 131]),
        (0.25, [10, 136, 186]),
        (0.5, [242, 211, 56]),
        (0.75, [242, 143, 56]),
        (1.0, [217, 30, 30]),
    ],
};

impl Colorscale {
    /// Color at position `t`, clamped to `[0, 1]`
    pub fn sample(&self, t: f64) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let upper = self
            .stops
            .iter()
            .position(|(pos, _)| *pos >= t)
            .unwrap_or(self.stops.len() - 1);
        if upper == 0 {
            let [r, g, b] = self.stops[0].1;
            return [r, g, b, 255];
        }

        let (p0, c0) = self.stops[upper - 1];
        let (p1, c1) = self.stops[upper];
        let f = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
        [lerp(c0[0], c1[0]), lerp(c0[1], c1[1]), lerp(c0[2], c1[2]), 255]
    }

    /// Color for `value` on a range whose ends may be given in either order
    pub fn map(&self, value: f64, range: ColorRange) -> Rgba {
        if !value.is_finite() {
            return MISSING_COLOR;
        }
        self.sample(range.normalize(value))
    }

    /// Colors for a downsampled series
    pub fn map_all(&self, values: &[Option<f64>], range: ColorRange) -> Vec<Rgba> {
        values
            .iter()
            .map(|v| v.map_or(MISSING_COLOR, |v| self.map(v, range)))
            .collect()
    }
}

/// Value range mapped onto a colorscale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRange {
    pub low: f64,
    pub high: f64,
}

impl ColorRange {
    /// Range between two bounds, ordered so `low <= high`
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    /// Position of `value` within the range, clamped to `[0, 1]`
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.high - self.low;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.low) / span).clamp(0.0, 1.0)
    }
}
