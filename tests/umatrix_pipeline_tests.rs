use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;
use glam::DVec2;
use more_asserts::assert_gt;

use som_umatrix::palette::ColorMode;
use som_umatrix::progress::{ProgressEvent, ProgressListener};
use som_umatrix::som_model::SomModel;
use som_umatrix::trajectory::parse_trajectories;
use som_umatrix::viewer::{UMatrixViewer, ViewOptions};

const SOM_3X2: &str = "\
2 hexa 3 2 bubble
0 0
10 0
20 0
0 10
10 10
20 10
";

const TRAJECTORY_SONG: &str = "\
2
1 0 song 0
9 1 song 1
21 9 song 2
";

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("som_umatrix_it_{}", name))
}

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = temp_path(name);
    fs::write(&path, contents).unwrap();
    path
}

struct EventCounter {
    count: Arc<Mutex<usize>>,
}

impl ProgressListener for EventCounter {
    fn progress_update(&self, _event: &ProgressEvent) {
        *self.count.lock().unwrap() += 1;
    }
}

#[test]
fn test_load_som_builds_lattice_and_buffers() {
    let cod = write_temp("load.cod", SOM_3X2);
    let mut viewer = UMatrixViewer::new();
    viewer.load_som(&cod).unwrap();
    fs::remove_file(&cod).unwrap();

    let som = viewer.som().unwrap();
    assert_eq!(som.x_dim(), 3);
    assert_eq!(som.y_dim(), 2);
    assert_eq!(som.dim(), 2);

    // doubled lattice
    let lattice = viewer.lattice().unwrap();
    assert_eq!(lattice.rows(), 3);
    assert_eq!(lattice.cols(), 5);

    let image = viewer.export_image();
    assert_gt!(image.width(), 0);
    assert_gt!(image.height(), 0);

    // contour thickness resets to a 40th of the distance spread
    let spread = som.max_distance() - som.min_distance();
    assert_abs_diff_eq!(
        viewer.options().contour_thickness,
        spread / 40.0,
        epsilon = 1e-12
    );
}

#[test]
fn test_failed_load_keeps_previous_model() {
    let good = write_temp("good.cod", SOM_3X2);
    let bad = write_temp("bad.cod", "2 hexa\n1 2\n");
    let empty = write_temp("empty.cod", "1 hexa 0 0\n");

    let mut viewer = UMatrixViewer::new();
    viewer.load_som(&good).unwrap();
    assert!(viewer.load_som(&bad).is_err());
    assert!(viewer.load_som(&empty).is_err());

    fs::remove_file(&good).unwrap();
    fs::remove_file(&bad).unwrap();
    fs::remove_file(&empty).unwrap();

    let som = viewer.som().unwrap();
    assert_eq!(som.x_dim(), 3);
    assert_eq!(som.y_dim(), 2);
}

#[test]
fn test_set_quality_same_value_is_noop() {
    let cod = write_temp("noop.cod", SOM_3X2);
    let mut viewer = UMatrixViewer::new();
    viewer.load_som(&cod).unwrap();
    fs::remove_file(&cod).unwrap();

    let count = Arc::new(Mutex::new(0usize));
    viewer.add_progress_listener(Box::new(EventCounter {
        count: Arc::clone(&count),
    }));

    let quality = viewer.options().quality;
    viewer.set_quality(quality);
    assert_eq!(*count.lock().unwrap(), 0);

    viewer.set_quality(quality + 5);
    assert_gt!(*count.lock().unwrap(), 0);
    assert_eq!(viewer.options().quality, quality + 5);
}

#[test]
fn test_zoom_only_touches_combined_buffer() {
    let cod = write_temp("zoom.cod", SOM_3X2);
    let mut viewer = UMatrixViewer::new();
    viewer.load_som(&cod).unwrap();
    fs::remove_file(&cod).unwrap();

    let native = viewer.export_image();
    viewer.set_zoom_scale(30.0);
    // the export resolution never depends on zoom
    let after = viewer.export_image();
    assert_eq!(native.dimensions(), after.dimensions());

    let (pw, ph) = viewer.preferred_size();
    let combined = viewer.render_to_image();
    assert!(combined.width() >= pw);
    assert!(combined.height() >= ph);
}

#[test]
fn test_trajectory_parse_groups_by_label() {
    let cod = write_temp("traj.cod", SOM_3X2);
    let mut viewer = UMatrixViewer::new();
    viewer.load_som(&cod).unwrap();
    fs::remove_file(&cod).unwrap();

    let dat = write_temp("traj.dat", TRAJECTORY_SONG);
    viewer.load_trajectories(&dat, 2).unwrap();
    fs::remove_file(&dat).unwrap();

    assert_eq!(viewer.trajectories().len(), 1);
    let t = &viewer.trajectories()[0];
    assert_eq!(t.label(), "song");
    assert_eq!(t.len(), 3);
    assert_eq!(t.bmus(), &[(0, 0), (1, 0), (2, 1)]);

    // hit counts are per node, indexed [y][x]
    assert_eq!(t.hit_counts()[0][0], 1);
    assert_eq!(t.hit_counts()[0][1], 1);
    assert_eq!(t.hit_counts()[1][2], 1);
    assert_eq!(t.hit_counts()[1][0], 0);
}

#[test]
fn test_trajectory_render_and_sync_clock() {
    let cod = write_temp("sync.cod", SOM_3X2);
    let mut viewer = UMatrixViewer::new();
    viewer.load_som(&cod).unwrap();
    fs::remove_file(&cod).unwrap();

    let dat = write_temp("sync.dat", TRAJECTORY_SONG);
    viewer.load_trajectories(&dat, 2).unwrap();
    fs::remove_file(&dat).unwrap();

    viewer.set_trajectory_sync(0, true);
    viewer.set_sync_time(0.0);
    viewer.set_sync_time(0.5);
    viewer.set_sync_time(1.0);
    // a clock past the end clamps instead of panicking
    viewer.set_sync_time(2.0);

    let image = viewer.export_image();
    assert_gt!(image.width(), 0);
}

#[test]
fn test_hexagon_lookup_under_point() {
    let cod = write_temp("lookup.cod", SOM_3X2);
    let mut viewer = UMatrixViewer::new();
    viewer.load_som(&cod).unwrap();
    fs::remove_file(&cod).unwrap();

    let lattice = viewer.lattice().unwrap();
    let center = lattice.get(1, 2).center();
    assert_eq!(viewer.hexagon_at(center), Some((1, 2)));

    // far outside the lattice
    assert_eq!(viewer.hexagon_at(DVec2::new(-500.0, -500.0)), None);
}

#[test]
fn test_contour_lines_round_trip() {
    let cod = write_temp("contour.cod", SOM_3X2);
    let mut viewer = UMatrixViewer::new();
    viewer.load_som(&cod).unwrap();
    fs::remove_file(&cod).unwrap();

    viewer.set_contour_lines_active(true);
    viewer.set_color_mode(ColorMode::Colored);
    viewer.add_contour_line(5.0);
    viewer.add_contour_line(8.0);
    assert_eq!(viewer.options().contour_levels, vec![5.0, 8.0]);

    viewer.remove_contour_line(5.0);
    assert_eq!(viewer.options().contour_levels, vec![8.0]);
    viewer.remove_contour_line_at(0);
    assert!(viewer.options().contour_levels.is_empty());

    // removing a level that is not present changes nothing
    viewer.remove_contour_line(42.0);
    assert!(viewer.options().contour_levels.is_empty());
}

#[test]
fn test_export_png_writes_file() {
    let cod = write_temp("export.cod", SOM_3X2);
    let mut viewer = UMatrixViewer::new();
    viewer.load_som(&cod).unwrap();
    fs::remove_file(&cod).unwrap();

    let png = temp_path("export.png");
    viewer.export_png(&png).unwrap();
    let metadata = fs::metadata(&png).unwrap();
    assert_gt!(metadata.len(), 0);
    fs::remove_file(&png).unwrap();
}

#[test]
fn test_options_persist_and_apply() {
    let cod = write_temp("options.cod", SOM_3X2);
    let mut viewer = UMatrixViewer::new();
    viewer.load_som(&cod).unwrap();
    fs::remove_file(&cod).unwrap();

    let mut options = viewer.options().clone();
    options.quality = 10;
    options.color_mode = ColorMode::Colored;
    options.display_dots = true;

    let json = temp_path("options.json");
    options.to_json_file(&json).unwrap();
    let loaded = ViewOptions::from_json_file(&json).unwrap();
    fs::remove_file(&json).unwrap();

    viewer.apply_options(loaded);
    assert_eq!(viewer.options().quality, 10);
    assert_eq!(viewer.options().color_mode, ColorMode::Colored);
    assert!(viewer.options().display_dots);
}

#[test]
fn test_parse_trajectories_against_model_directly() {
    let som = SomModel::parse(SOM_3X2).unwrap();
    let trajectories = parse_trajectories(TRAJECTORY_SONG, 2, &som).unwrap();
    assert_eq!(trajectories.len(), 1);
    assert!(trajectories[0].display);
    assert!(!trajectories[0].display_synced);
}
