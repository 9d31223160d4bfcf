/// Renders a U-Matrix PNG from the command line.
///
/// Usage: render_umatrix <som.cod> [out.png] [trajectories.dat]

use std::env;
use std::process;

use colored::Colorize;

use som_umatrix::palette::ColorMode;
use som_umatrix::progress::ConsoleProgress;
use som_umatrix::viewer::UMatrixViewer;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: render_umatrix <som.cod> [out.png] [trajectories.dat]");
        process::exit(2);
    }
    let som_path = &args[1];
    let out_path = args.get(2).map(String::as_str).unwrap_or("umatrix.png");

    let mut viewer = UMatrixViewer::new();
    viewer.add_progress_listener(Box::new(ConsoleProgress));

    if let Err(e) = viewer.load_som(som_path) {
        eprintln!("{} {}", "failed to load SOM:".red(), e);
        process::exit(1);
    }
    let som = match viewer.som() {
        Some(som) => som,
        None => return,
    };
    println!(
        "loaded {}x{} map, dim {}, distances {:.3}..{:.3}",
        som.x_dim(),
        som.y_dim(),
        som.dim(),
        som.min_distance(),
        som.max_distance()
    );
    let dim = som.dim();

    if let Some(dat_path) = args.get(3) {
        if let Err(e) = viewer.load_trajectories(dat_path, dim) {
            eprintln!("{} {}", "failed to load trajectories:".red(), e);
            process::exit(1);
        }
        for t in viewer.trajectories() {
            println!("trajectory '{}' with {} steps", t.label(), t.len());
        }
    }

    viewer.set_color_mode(ColorMode::Colored);
    viewer.set_display_dots(true);

    if let Err(e) = viewer.export_png(out_path) {
        eprintln!("{} {}", "failed to write image:".red(), e);
        process::exit(1);
    }
    println!("{} {}", "wrote".green(), out_path);
}
