use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb as ImageRgb};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::orbit::color::Rgb;
use crate::orbit::display::OrbitProducts;
use crate::orbit::source::Axis;
use crate::orbit::OrbitError;

#[derive(Clone, Debug)]
pub struct PlotStyle {
    /// Size of one plane's chart; the image stacks X above Y.
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub foreground: RGBColor,
    /// Fixed vertical range. `None` fits the data.
    pub y_range: Option<(f64, f64)>,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            background: RGBColor(255, 255, 255),
            foreground: RGBColor(0, 0, 0),
            y_range: Some((-1.0, 1.0)),
        }
    }
}

/// Largest accepted chart side, in pixels.
pub const MAX_PLOT_SIDE: u32 = 8192;

impl PlotStyle {
    pub fn validate(&self) -> Result<(), OrbitError> {
        for (name, side) in [("width", self.width), ("height", self.height)] {
            if !(1..=MAX_PLOT_SIDE).contains(&side) {
                return Err(OrbitError::config(format!(
                    "plot {name} {side} outside 1..={MAX_PLOT_SIDE}"
                )));
            }
        }
        Ok(())
    }
}

fn to_plotters(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

/// Renders both planes into a single PNG.
pub fn render_orbit_png(products: &OrbitProducts, style: PlotStyle) -> Result<Vec<u8>, OrbitError> {
    if products.x.is_empty() && products.y.is_empty() {
        return Err(OrbitError::Plot("no orbit published yet".into()));
    }
    let in_range = |side: u32| (1..=MAX_PLOT_SIDE).contains(&side);
    if !in_range(style.width) || !in_range(style.height) {
        return Err(OrbitError::Plot(format!(
            "image size {}x{} outside 1..={MAX_PLOT_SIDE}",
            style.width, style.height
        )));
    }
    let total_height = style.height * 2;
    let len = (style.width as usize)
        .checked_mul(total_height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| OrbitError::Plot("image buffer size overflows".into()))?;
    let mut buffer = vec![0u8; len];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, total_height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let areas = root.split_evenly((2, 1));
        for (area, axis) in areas.iter().zip(Axis::ALL) {
            draw_plane(area, products, axis, &style)?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, total_height)
}

fn draw_plane<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    products: &OrbitProducts,
    axis: Axis,
    style: &PlotStyle,
) -> Result<(), OrbitError>
where
    DB::ErrorType: 'static,
{
    let raw = products.raw(axis);
    let reference = products.reference(axis);
    let (y_min, y_max) = style.y_range.unwrap_or_else(|| fit_range(products, axis));
    let (z_min, z_max) = products.z_range;
    let half = products.bar_width / 2.0;

    let label_for = |z: &f64| {
        products
            .labels
            .iter()
            .find(|(at, _)| (at - z).abs() < 1e-9)
            .map(|(_, label)| label.clone())
            .unwrap_or_else(|| format!("{z:.1}"))
    };

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(
            format!("{axis} (mm)"),
            ("sans-serif", 20).into_font().color(&style.foreground),
        )
        .set_label_area_size(LabelAreaPosition::Left, 45)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(z_min..z_max, y_min..y_max)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("z (m)")
        .x_label_formatter(&label_for)
        .axis_style(&style.foreground)
        .draw()?;

    let bars = raw
        .positions
        .iter()
        .zip(&raw.values)
        .zip(&raw.colors)
        .filter(|((_, v), _)| !v.is_nan())
        .map(|((z, v), color)| {
            Rectangle::new(
                [(z - half, 0.0), (z + half, *v)],
                to_plotters(*color).filled(),
            )
        });
    chart.draw_series(bars)?;

    if raw.crosses_zero() {
        chart.draw_series(LineSeries::new(
            vec![(z_min, 0.0), (z_max, 0.0)],
            style.foreground.stroke_width(2),
        ))?;
    }

    if !reference.is_empty() {
        let color = to_plotters(products.reference_color.unwrap_or(Rgb(0x1f, 0x77, 0xb4)));
        chart.draw_series(LineSeries::new(reference.points(), color.stroke_width(2)))?;
    }
    Ok(())
}

fn fit_range(products: &OrbitProducts, axis: Axis) -> (f64, f64) {
    let (lo, hi) = products
        .raw(axis)
        .values
        .iter()
        .chain(&products.reference(axis).values)
        .filter(|v| !v.is_nan())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if (hi - lo).abs() < f64::EPSILON {
        (-1.0, 1.0)
    } else {
        let pad = (hi - lo) * 0.05;
        (lo - pad, hi + pad)
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, OrbitError> {
    let image = ImageBuffer::<ImageRgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| OrbitError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
