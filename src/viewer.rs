/// The collaborator-facing surface of the U-Matrix core.
///
/// A host application (menus, dialogs, option tables) talks to
/// `UMatrixViewer` with parsed paths and configuration values and gets back
/// renderable images. The viewer owns the model, the lattice, the
/// trajectory list and the pipeline; every operation runs to completion
/// before returning.

use std::fs;
use std::path::Path;

use glam::DVec2;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hex_lattice::HexagonLattice;
use crate::palette::ColorMode;
use crate::progress::{ProgressListener, ViewObserver};
use crate::render::{BackgroundOptions, RenderPipeline};
use crate::som_model::SomModel;
use crate::stroke::StrokeStyle;
use crate::trajectory::{self, Trajectory};

/// All user-tunable rendering settings, serializable so hosts can persist
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewOptions {
    /// Hexagon inscribed-circle radius in pixels.
    pub quality: u32,
    pub zoom_scale: f64,
    pub color_mode: ColorMode,
    pub display_dots: bool,
    pub interpolate_node_distances: bool,
    pub contours_active: bool,
    pub contour_levels: Vec<f64>,
    pub contour_thickness: f64,
    pub hit_count_scale: f64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            quality: 15,
            zoom_scale: 1.0,
            color_mode: ColorMode::Greyscale,
            display_dots: false,
            interpolate_node_distances: false,
            contours_active: false,
            contour_levels: Vec::new(),
            contour_thickness: 1.0,
            hit_count_scale: 1.0,
        }
    }
}

impl ViewOptions {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| std::io::Error::other(e).into())
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, text)?;
        Ok(())
    }
}

pub struct UMatrixViewer {
    som: Option<SomModel>,
    lattice: Option<HexagonLattice>,
    trajectories: Vec<Trajectory>,
    options: ViewOptions,
    /// Playback position of the external motion clock, 0..=1.
    sync_time: f64,
    pipeline: RenderPipeline,
    observers: Vec<Box<dyn ViewObserver>>,
}

impl UMatrixViewer {
    pub fn new() -> Self {
        Self {
            som: None,
            lattice: None,
            trajectories: Vec::new(),
            options: ViewOptions::default(),
            sync_time: 0.0,
            pipeline: RenderPipeline::new(),
            observers: Vec::new(),
        }
    }

    // ---- loading ----

    /// Loads a `.cod` SOM file and makes it the active model.
    ///
    /// Contour levels are cleared and the contour thickness reset to a 40th
    /// of the model's distance spread. Previously loaded trajectories were
    /// mapped against the old model's grid and are dropped. On any parse or
    /// I/O failure the previous state stays untouched.
    pub fn load_som<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let som = SomModel::from_file(path)?;

        self.options.contour_levels.clear();
        self.options.contour_thickness = (som.max_distance() - som.min_distance()) / 40.0;
        self.trajectories.clear();
        self.som = Some(som);

        self.rebuild_all();
        self.notify_observers();
        Ok(())
    }

    /// Loads a `.dat` trajectory file against the active model. Does
    /// nothing when no SOM is loaded. On failure the previous trajectory
    /// list stays untouched.
    pub fn load_trajectories<P: AsRef<Path>>(&mut self, path: P, dim: usize) -> Result<()> {
        let Some(som) = &self.som else {
            return Ok(());
        };
        let trajectories = trajectory::trajectories_from_file(path, dim, som)?;
        self.trajectories = trajectories;
        self.refresh_trajectories();
        self.refresh_combined();
        self.notify_observers();
        Ok(())
    }

    // ---- settings ----

    /// Changes the rendering quality. Requesting the current value is a
    /// no-op; otherwise the lattice and every buffer are rebuilt.
    pub fn set_quality(&mut self, quality: u32) {
        if self.options.quality == quality {
            return;
        }
        self.options.quality = quality;
        self.rebuild_all();
    }

    /// Changes the zoom. Only the combined buffer is touched; the rendered
    /// layers stay valid.
    pub fn set_zoom_scale(&mut self, zoom: f64) {
        self.options.zoom_scale = zoom;
        let preferred = self.preferred_size();
        self.pipeline.adjust_combined_size(preferred);
        self.refresh_combined();
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.options.color_mode = mode;
        self.refresh_background();
        self.refresh_combined();
    }

    pub fn set_display_dots(&mut self, display_dots: bool) {
        self.options.display_dots = display_dots;
        self.refresh_background();
        self.refresh_combined();
    }

    /// Toggles interpolated node values; the lattice is rebuilt because
    /// node values are baked in at build time.
    pub fn set_interpolate_node_distances(&mut self, interpolate: bool) {
        self.options.interpolate_node_distances = interpolate;
        self.rebuild_lattice();
        self.refresh_background();
        self.refresh_combined();
    }

    /// Toggles contour lines. Contours need interpolated node values, so
    /// this rebuilds the lattice as well.
    pub fn set_contour_lines_active(&mut self, active: bool) {
        self.options.contours_active = active;
        self.rebuild_lattice();
        self.refresh_background();
        self.refresh_combined();
    }

    pub fn add_contour_line(&mut self, value: f64) {
        self.options.contour_levels.push(value);
        self.refresh_background();
        self.refresh_combined();
    }

    pub fn remove_contour_line_at(&mut self, index: usize) {
        if index < self.options.contour_levels.len() {
            self.options.contour_levels.remove(index);
            self.refresh_background();
            self.refresh_combined();
        }
    }

    pub fn remove_contour_line(&mut self, value: f64) {
        if let Some(index) = self
            .options
            .contour_levels
            .iter()
            .position(|v| *v == value)
        {
            self.options.contour_levels.remove(index);
            self.refresh_background();
            self.refresh_combined();
        }
    }

    pub fn set_contour_thickness(&mut self, thickness: f64) {
        self.options.contour_thickness = thickness;
        self.refresh_background();
        self.refresh_combined();
    }

    /// Hit-count circle scaling, in 20ths: a host slider value of 20 means
    /// factor 1.
    pub fn set_hit_count_scale(&mut self, scale: i32) {
        self.options.hit_count_scale = scale as f64 / 20.0;
        self.refresh_trajectories();
        self.refresh_combined();
    }

    /// Advances the external playback clock (0..=1). Every call re-renders
    /// the trajectory layer; there is no coalescing, callers control the
    /// update rate.
    pub fn set_sync_time(&mut self, time: f64) {
        self.sync_time = time;
        self.refresh_trajectories();
        self.refresh_combined();
    }

    // ---- per-trajectory styling ----

    pub fn set_trajectory_display(&mut self, index: usize, display: bool) {
        if let Some(t) = self.trajectories.get_mut(index) {
            t.display = display;
            self.refresh_trajectories();
            self.refresh_combined();
        }
    }

    pub fn set_trajectory_sync(&mut self, index: usize, sync: bool) {
        if let Some(t) = self.trajectories.get_mut(index) {
            t.display_synced = sync;
            self.refresh_trajectories();
            self.refresh_combined();
        }
    }

    pub fn set_trajectory_color(&mut self, index: usize, color: Rgba<u8>) {
        if let Some(t) = self.trajectories.get_mut(index) {
            t.set_color(color);
            self.refresh_trajectories();
            self.refresh_combined();
        }
    }

    pub fn set_trajectory_stroke(&mut self, index: usize, stroke: &StrokeStyle) {
        if let Some(t) = self.trajectories.get_mut(index) {
            t.set_stroke(stroke);
            self.refresh_trajectories();
            self.refresh_combined();
        }
    }

    pub fn set_trajectory_width(&mut self, index: usize, width: f64) {
        if let Some(t) = self.trajectories.get_mut(index) {
            t.set_line_width(width);
            self.refresh_trajectories();
            self.refresh_combined();
        }
    }

    pub fn set_trajectory_offset(&mut self, index: usize, offset: f64) {
        if let Some(t) = self.trajectories.get_mut(index) {
            t.set_offset(offset);
            self.refresh_trajectories();
            self.refresh_combined();
        }
    }

    // ---- output ----

    /// The zoom-scaled composite for on-screen display.
    pub fn render_to_image(&self) -> &RgbaImage {
        self.pipeline.combined()
    }

    /// Background plus trajectories at native resolution.
    pub fn export_image(&self) -> RgbaImage {
        self.pipeline.export_image()
    }

    /// Writes the native-resolution composite as a lossless image.
    pub fn export_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.pipeline.export_image().save(path)?;
        Ok(())
    }

    /// The hexagon under a point in layer coordinates, if any.
    pub fn hexagon_at(&self, point: DVec2) -> Option<(usize, usize)> {
        self.lattice.as_ref()?.hexagon_at_point(point)
    }

    // ---- introspection ----

    pub fn som(&self) -> Option<&SomModel> {
        self.som.as_ref()
    }

    pub fn lattice(&self) -> Option<&HexagonLattice> {
        self.lattice.as_ref()
    }

    pub fn trajectories(&self) -> &[Trajectory] {
        &self.trajectories
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    /// Replaces the whole option block, rebuilding everything it affects.
    pub fn apply_options(&mut self, options: ViewOptions) {
        self.options = options;
        self.rebuild_all();
    }

    /// The on-screen size of the composite under the current zoom.
    pub fn preferred_size(&self) -> (u32, u32) {
        let (w, h) = self.pipeline.layer_size();
        let z = self.normed_zoom();
        (
            ((w as f64 * z).ceil() as u32).max(1),
            ((h as f64 * z).ceil() as u32).max(1),
        )
    }

    /// Zoom normalized by quality, so a quality change alone never changes
    /// the apparent zoom.
    pub fn normed_zoom(&self) -> f64 {
        self.options.zoom_scale / self.options.quality as f64
    }

    // ---- notifications ----

    pub fn add_progress_listener(&mut self, listener: Box<dyn ProgressListener>) {
        self.pipeline.add_progress_listener(listener);
    }

    /// Registers an observer and immediately delivers a first update.
    pub fn add_observer(&mut self, observer: Box<dyn ViewObserver>) {
        observer.view_updated();
        self.observers.push(observer);
    }

    fn notify_observers(&self) {
        for observer in &self.observers {
            observer.view_updated();
        }
    }

    // ---- internals ----

    fn background_options(&self) -> BackgroundOptions {
        BackgroundOptions {
            color_mode: self.options.color_mode,
            contours_active: self.options.contours_active,
            contour_levels: self.options.contour_levels.clone(),
            contour_thickness: self.options.contour_thickness,
            display_dots: self.options.display_dots,
        }
    }

    fn rebuild_lattice(&mut self) {
        if let Some(som) = &self.som {
            self.lattice = Some(HexagonLattice::build(
                som,
                self.options.quality,
                self.options.interpolate_node_distances,
                self.options.contours_active,
            ));
        }
    }

    /// Full rebuild: new lattice, new layer buffers, both layers
    /// re-rendered, combined buffer re-composed.
    fn rebuild_all(&mut self) {
        self.rebuild_lattice();
        if let Some(lattice) = &self.lattice {
            let (x_dim, y_dim) = match &self.som {
                Some(som) => (som.x_dim(), som.y_dim()),
                None => return,
            };
            let (w, h) = lattice.geometry().buffer_dimensions(x_dim, y_dim);
            self.pipeline.allocate_layers(w, h);
        }
        let preferred = self.preferred_size();
        self.pipeline.adjust_combined_size(preferred);
        self.refresh_background();
        self.refresh_trajectories();
        self.refresh_combined();
    }

    fn refresh_background(&mut self) {
        let options = self.background_options();
        let (Some(som), Some(lattice)) = (&self.som, &self.lattice) else {
            return;
        };
        self.pipeline.render_background(lattice, som, &options);
    }

    fn refresh_trajectories(&mut self) {
        let Some(lattice) = &self.lattice else {
            return;
        };
        self.pipeline.render_trajectories(
            &mut self.trajectories,
            lattice,
            self.options.hit_count_scale,
            self.sync_time,
        );
    }

    fn refresh_combined(&mut self) {
        let z = self.normed_zoom();
        self.pipeline.compose(z);
    }
}

impl Default for UMatrixViewer {
    fn default() -> Self {
        Self::new()
    }
}
