/// The layered raster pipeline.
///
/// Three buffers: a static U-Matrix background, a trajectory overlay that
/// changes with playback, and a combined buffer holding the zoom-scaled
/// composite the host actually blits. Splitting the layers means a playback
/// tick only re-renders the overlay, and a zoom change only re-composes.

use glam::DVec2;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};

use crate::hex_geometry::HexGeometry;
use crate::hex_lattice::HexagonLattice;
use crate::palette::{self, ColorMode};
use crate::progress::{ProgressEvent, ProgressListener};
use crate::shading::{HexagonShader, SurfacePoint};
use crate::som_model::SomModel;
use crate::trajectory::Trajectory;

/// Settings consumed by the background pass.
#[derive(Debug, Clone)]
pub struct BackgroundOptions {
    pub color_mode: ColorMode,
    pub contours_active: bool,
    pub contour_levels: Vec<f64>,
    pub contour_thickness: f64,
    pub display_dots: bool,
}

pub struct RenderPipeline {
    background: RgbaImage,
    trajectories: RgbaImage,
    combined: RgbaImage,
    progress_listeners: Vec<Box<dyn ProgressListener>>,
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self {
            background: RgbaImage::new(1, 1),
            trajectories: RgbaImage::new(1, 1),
            combined: RgbaImage::new(1, 1),
            progress_listeners: Vec::new(),
        }
    }

    pub fn add_progress_listener(&mut self, listener: Box<dyn ProgressListener>) {
        self.progress_listeners.push(listener);
    }

    fn notify_progress(&self, event: ProgressEvent) {
        for listener in &self.progress_listeners {
            listener.progress_update(&event);
        }
    }

    /// Reallocates the background and trajectory layers together. Called
    /// when the SOM or the quality changes; both layers always share one
    /// size.
    pub fn allocate_layers(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        self.background = RgbaImage::new(width, height);
        self.trajectories = RgbaImage::new(width, height);
    }

    /// Lazily resizes the combined buffer toward `preferred` pixel size.
    ///
    /// Grows to 1.6 x preferred once preferred exceeds the buffer, shrinks
    /// to exactly preferred only once the buffer is at least twice as wide
    /// as needed. Minor resizes in between reuse the buffer as-is.
    pub fn adjust_combined_size(&mut self, preferred: (u32, u32)) {
        let (pref_w, pref_h) = (preferred.0.max(1), preferred.1.max(1));
        if pref_w > self.combined.width() {
            self.notify_progress(ProgressEvent::start("resizing image buffers"));
            self.combined = RgbaImage::new(
                (pref_w as f64 * 1.6) as u32,
                (pref_h as f64 * 1.6) as u32,
            );
            self.notify_progress(ProgressEvent::finish("resizing image buffers - done"));
        } else if pref_w * 2 <= self.combined.width() {
            self.notify_progress(ProgressEvent::start("resizing image buffers"));
            self.combined = RgbaImage::new(pref_w, pref_h);
            self.notify_progress(ProgressEvent::finish("resizing image buffers - done"));
        }
    }

    /// Renders the static U-Matrix background layer.
    ///
    /// Hexagons with value 0 fill white; everything else maps
    /// `value / max_distance` through the active color mode. With contours
    /// active, value-bearing hexagons run through the interpolation shader
    /// instead of a flat fill. Node hexagons optionally get a black center
    /// dot.
    pub fn render_background(
        &mut self,
        lattice: &HexagonLattice,
        som: &SomModel,
        options: &BackgroundOptions,
    ) {
        self.notify_progress(ProgressEvent::start(
            "re-rendering U-Matrix background - this may take a while",
        ));

        clear(&mut self.background);
        let quality = lattice.quality();

        for row in 0..lattice.rows() {
            for col in 0..lattice.cols() {
                let hexagon = lattice.get(row, col);

                if hexagon.value() == 0.0 {
                    fill_polygon(&mut self.background, hexagon.outline(), palette::WHITE);
                } else if options.contours_active {
                    let shader = build_shader(lattice, som, row, col, quality, options);
                    fill_polygon_shaded(&mut self.background, hexagon.outline(), &shader);
                } else {
                    let color =
                        palette::fill_color(hexagon.value(), som.max_distance(), options.color_mode);
                    fill_polygon(&mut self.background, hexagon.outline(), color);
                }

                if options.display_dots && hexagon.is_node() {
                    let center = hexagon.center();
                    let radius = (quality as f64 / 5.0).round().max(1.0) as i32;
                    draw_filled_circle_mut(
                        &mut self.background,
                        (center.x as i32, center.y as i32),
                        radius,
                        palette::BLACK,
                    );
                }
            }
        }

        self.notify_progress(ProgressEvent::finish("U-Matrix background rendering done"));
    }

    /// Renders the trajectory overlay layer.
    ///
    /// Every visible trajectory draws a hit-count circle at each visited
    /// node center and a line between consecutive distinct nodes. Circle
    /// radius, stroke width and the anti-overlap offset all scale with the
    /// quality so the overlay keeps its proportions across resolutions.
    /// Synchronized trajectories stop at the playback step and size their
    /// circles from the partial hit counts.
    pub fn render_trajectories(
        &mut self,
        trajectories: &mut [Trajectory],
        lattice: &HexagonLattice,
        hit_count_scale: f64,
        sync_time: f64,
    ) {
        clear(&mut self.trajectories);
        let quality = lattice.quality() as f64;

        for trajectory in trajectories.iter_mut().filter(|t| t.display) {
            if trajectory.is_empty() {
                continue;
            }
            let synced = trajectory.display_synced;
            // a clock past 1.0 plays the full path instead of indexing past it
            let current_step =
                ((sync_time * (trajectory.len() - 1) as f64) as usize).min(trajectory.len() - 1);

            let counts = if synced {
                trajectory.incomplete_counts_at(current_step).clone()
            } else {
                trajectory.hit_counts().clone()
            };
            let end = if synced {
                current_step + 1
            } else {
                trajectory.len()
            };

            let offset = trajectory.offset() * quality;
            let stroke = trajectory.stroke().with_width(trajectory.line_width() * quality);
            let color = trajectory.color();

            let mut last: Option<(usize, usize)> = None;
            for i in 0..end {
                let (x, y) = trajectory.bmus()[i];
                let node = lattice.get(y * 2, x * 2);
                let center = node.center() + DVec2::splat(offset);

                let radius = counts[y][x] as f64 * quality / 2.0 * hit_count_scale;
                draw_ring(
                    &mut self.trajectories,
                    center,
                    radius,
                    stroke.width,
                    color,
                );

                if let Some(last_bmu) = last {
                    if last_bmu != (x, y) {
                        let last_center =
                            lattice.get(last_bmu.1 * 2, last_bmu.0 * 2).center() + DVec2::splat(offset);
                        draw_stroked_line(&mut self.trajectories, last_center, center, &stroke, color);
                    }
                }
                last = Some((x, y));
            }
        }
    }

    /// Re-composes the combined buffer: both layers scaled by the
    /// normalized zoom (`zoom / quality`), trajectories on top. Using the
    /// normalized zoom means a quality change alone leaves the apparent
    /// zoom untouched.
    pub fn compose(&mut self, normed_zoom: f64) {
        clear(&mut self.combined);
        let target_w = ((self.background.width() as f64 * normed_zoom) as u32).max(1);
        let target_h = ((self.background.height() as f64 * normed_zoom) as u32).max(1);

        let scaled_bg = imageops::resize(&self.background, target_w, target_h, FilterType::CatmullRom);
        imageops::overlay(&mut self.combined, &scaled_bg, 0, 0);
        let scaled_traj =
            imageops::resize(&self.trajectories, target_w, target_h, FilterType::CatmullRom);
        imageops::overlay(&mut self.combined, &scaled_traj, 0, 0);
    }

    /// The scaled composite for on-screen display.
    pub fn combined(&self) -> &RgbaImage {
        &self.combined
    }

    /// Background plus trajectories at native resolution, for PNG export.
    pub fn export_image(&self) -> RgbaImage {
        let mut result = self.background.clone();
        imageops::overlay(&mut result, &self.trajectories, 0, 0);
        result
    }

    pub fn layer_size(&self) -> (u32, u32) {
        (self.background.width(), self.background.height())
    }
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of a hexagon's surroundings for the interpolation shader. The
/// shader always samples the hue palette, whatever color mode the flat
/// fills use.
fn build_shader(
    lattice: &HexagonLattice,
    som: &SomModel,
    row: usize,
    col: usize,
    quality: u32,
    options: &BackgroundOptions,
) -> HexagonShader {
    let hexagon = lattice.get(row, col);
    let mut neighbors = [None; 6];
    for (slot, neighbor) in neighbors.iter_mut().zip(hexagon.neighbors()) {
        *slot = neighbor.map(|(r, c)| {
            let n = lattice.get(r, c);
            SurfacePoint {
                position: n.center(),
                color: som.hexagon_color(n.value()),
                value: n.value(),
            }
        });
    }
    let center = SurfacePoint {
        position: hexagon.center(),
        color: som.hexagon_color(hexagon.value()),
        value: hexagon.value(),
    };
    HexagonShader::new(
        neighbors,
        center,
        quality as f64 * 1.75,
        options.contour_levels.clone(),
        options.contour_thickness,
    )
}

fn clear(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        *pixel = Rgba([0, 0, 0, 0]);
    }
}

/// Scanline polygon fill with a flat color.
fn fill_polygon(image: &mut RgbaImage, outline: &[DVec2], color: Rgba<u8>) {
    fill_polygon_with(image, outline, |_, _| color);
}

/// Scanline polygon fill shaded per pixel.
fn fill_polygon_shaded(image: &mut RgbaImage, outline: &[DVec2], shader: &HexagonShader) {
    fill_polygon_with(image, outline, |x, y| {
        shader.shade(DVec2::new(x as f64, y as f64)).0
    });
}

fn fill_polygon_with<F>(image: &mut RgbaImage, outline: &[DVec2], mut color_at: F)
where
    F: FnMut(i32, i32) -> Rgba<u8>,
{
    if outline.len() < 3 {
        return;
    }
    let coords: Vec<(i32, i32)> = outline
        .iter()
        .map(|p| (p.x.round() as i32, p.y.round() as i32))
        .collect();

    let min_y = coords.iter().map(|(_, y)| *y).min().unwrap_or(0).max(0);
    let max_y = coords
        .iter()
        .map(|(_, y)| *y)
        .max()
        .unwrap_or(0)
        .min(image.height() as i32 - 1);

    for y in min_y..=max_y {
        let mut intersections = Vec::new();
        for i in 0..coords.len() {
            let p1 = coords[i];
            let p2 = coords[(i + 1) % coords.len()];
            if (p1.1 <= y && p2.1 > y) || (p2.1 <= y && p1.1 > y) {
                let x = if p2.1 == p1.1 {
                    p1.0
                } else {
                    p1.0 + ((y - p1.1) * (p2.0 - p1.0)) / (p2.1 - p1.1)
                };
                intersections.push(x);
            }
        }
        intersections.sort();
        for pair in intersections.chunks(2) {
            if pair.len() == 2 {
                let x1 = pair[0].max(0).min(image.width() as i32 - 1);
                let x2 = pair[1].max(0).min(image.width() as i32 - 1);
                for x in x1..=x2 {
                    image.put_pixel(x as u32, y as u32, color_at(x, y));
                }
            }
        }
    }
}

/// Hollow circle with a stroke width, drawn as stacked 1-pixel rings.
fn draw_ring(image: &mut RgbaImage, center: DVec2, radius: f64, width: f64, color: Rgba<u8>) {
    let half = (width / 2.0).max(0.5);
    let inner = ((radius - half).round() as i32).max(0);
    let outer = ((radius + half).round() as i32).max(inner);
    for r in inner..=outer {
        draw_hollow_circle_mut(image, (center.x as i32, center.y as i32), r, color);
    }
}

/// Line with width and dash pattern, drawn by stamping discs along the
/// segment.
fn draw_stroked_line(
    image: &mut RgbaImage,
    from: DVec2,
    to: DVec2,
    stroke: &crate::stroke::StrokeStyle,
    color: Rgba<u8>,
) {
    let length = from.distance(to);
    if length == 0.0 {
        return;
    }
    let radius = ((stroke.width / 2.0).round() as i32).max(1);
    let step = 0.5;
    let mut t = 0.0;
    while t <= length {
        if stroke.is_drawn_at(t) {
            let p = from.lerp(to, t / length);
            draw_filled_circle_mut(image, (p.x as i32, p.y as i32), radius, color);
        }
        t += step;
    }
}
