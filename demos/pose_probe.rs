//! Connect to a device and print its identity and pose stream to stdout.
//!
//! Usage: cargo run --bin pose_probe -- <device-ip-or-connection-string>
//! Press Ctrl+C to stop.

use std::time::{Duration, Instant};

use aurora_sdk::Session;

fn main() {
    env_logger::init();

    let addr = match std::env::args().nth(1) {
        Some(a) => a,
        None => {
            eprintln!("usage: pose_probe <device-ip-or-connection-string>");
            std::process::exit(1);
        }
    };

    let session = Session::new();
    let controller = session.controller();

    if let Err(e) = controller.connect(addr.as_str()) {
        eprintln!("failed to connect: {e}");
        std::process::exit(1);
    }

    match session.data_provider().device_basic_info() {
        Ok(info) => {
            println!("model:    {}", info.device_model_string());
            println!("serial:   {}", info.serial_number_hex());
            println!("firmware: {}", info.firmware_version_string);
        }
        Err(e) => eprintln!("device_basic_info failed: {e}"),
    }

    println!("Streaming pose (Ctrl+C to stop)...");

    let provider = session.data_provider();
    let start = Instant::now();
    let mut count: u64 = 0;
    let mut last_report = Instant::now();

    loop {
        match provider.current_pose(true) {
            Ok((pose, _euler, ts)) => {
                count += 1;
                if count % 50 == 1 {
                    println!(
                        "ts={:<16} pos=[{:+.4}, {:+.4}, {:+.4}] quat=[{:+.3}, {:+.3}, {:+.3}, {:+.3}]",
                        ts,
                        pose.translation[0], pose.translation[1], pose.translation[2],
                        pose.quaternion[0], pose.quaternion[1], pose.quaternion[2], pose.quaternion[3],
                    );
                }
            }
            Err(aurora_sdk::Error::NotReady) => {}
            Err(e) => {
                eprintln!("current_pose failed: {e}");
                break;
            }
        }

        let now = Instant::now();
        if now.duration_since(last_report) >= Duration::from_secs(3) {
            let elapsed = start.elapsed().as_secs_f64();
            println!("--- {} samples in {:.1}s ({:.1} Hz) ---", count, elapsed, count as f64 / elapsed);
            last_report = now;
        }

        if !controller.is_device_connection_alive() {
            eprintln!("device connection lost");
            break;
        }

        std::thread::sleep(Duration::from_millis(20));
    }

    controller.disconnect();
}
