//! Example: Open a USDA layer and print its outline.
//!
//! Run with: cargo run --example print_stage -- path/to/scene.usda
//! Without a path the built-in default scene is printed.

use std::env;
use std::sync::Arc;

use usdview_core::{Stage, Tokens};

fn main() {
    env_logger::init();

    let tokens = Arc::new(Tokens::new());
    let args: Vec<String> = env::args().collect();

    let result = match args.get(1) {
        Some(path) => {
            println!("Loading USDA file: {}", path);
            Stage::open(path, tokens)
        }
        None => {
            println!("No file given, using the default scene");
            Stage::default_scene(tokens)
        }
    };

    let stage = match result {
        Ok(stage) => stage,
        Err(e) => {
            eprintln!("Error opening stage: {}", e);
            return;
        }
    };

    println!("\n=== Stage ===");
    if stage.has_authored_time_code_range() {
        println!(
            "Time codes: {} to {} at {} fps",
            stage.start_time_code(),
            stage.end_time_code(),
            stage.frames_per_second()
        );
    } else {
        println!("Time codes: not authored");
    }
    println!("Up axis: {:?}", stage.up_axis());
    if let Some(doc) = &stage.metadata().doc {
        println!("Doc: {}", doc);
    }

    println!("\n--- Prims ---");
    for line in stage.outline() {
        println!("  {}", line);
    }

    let bounds = stage.world_bounds_or_default();
    println!("\n--- World Bounds ---");
    println!(
        "  Min: ({:.2}, {:.2}, {:.2})",
        bounds.min.x, bounds.min.y, bounds.min.z
    );
    println!(
        "  Max: ({:.2}, {:.2}, {:.2})",
        bounds.max.x, bounds.max.y, bounds.max.z
    );
}
