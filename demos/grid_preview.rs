//! Start the LiDAR 2D grid preview and report dirty-rect growth to stdout.
//!
//! Usage: cargo run --bin grid_preview -- <device-ip-or-connection-string>
//! Press Ctrl+C to stop.

use std::time::Duration;

use aurora_sdk::types::GridMapGenerationOptions;
use aurora_sdk::Session;

fn main() {
    env_logger::init();

    let addr = match std::env::args().nth(1) {
        Some(a) => a,
        None => {
            eprintln!("usage: grid_preview <device-ip-or-connection-string>");
            std::process::exit(1);
        }
    };

    let session = Session::new();
    let controller = session.controller();

    if let Err(e) = controller.connect(addr.as_str()) {
        eprintln!("failed to connect: {e}");
        std::process::exit(1);
    }

    if let Err(e) = controller.enable_map_data_syncing(true) {
        eprintln!("failed to enable map data syncing: {e}");
        std::process::exit(1);
    }

    let builder = session.lidar_map_builder();
    let options = GridMapGenerationOptions {
        resolution_m: 0.05,
        canvas_w_m: 150.0,
        canvas_h_m: 150.0,
        active_map_only: true,
        ..Default::default()
    };

    if let Err(e) = builder.start_preview_background_update(options) {
        eprintln!("failed to start preview: {e}");
        std::process::exit(1);
    }

    println!("Preview started; polling dirty rects (Ctrl+C to stop)...");

    loop {
        std::thread::sleep(Duration::from_secs(2));
        match builder.get_and_reset_preview_dirty_rect() {
            Ok((rect, big_change)) => {
                println!(
                    "dirty rect: x={:+.2} y={:+.2} w={:.2} h={:.2} big_change={}",
                    rect.x, rect.y, rect.w, rect.h, big_change
                );
            }
            Err(e) => {
                eprintln!("get_and_reset_preview_dirty_rect failed: {e}");
                break;
            }
        }
    }

    let _ = builder.stop_preview_background_update();
    controller.disconnect();
}
