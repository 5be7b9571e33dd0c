//! Headless demo: drives an asynchronous canvas over the tile-map renderer,
//! the way a UI toolkit would, and prints what ends up on screen.
//!
//! Run with `RUST_LOG=debug cargo run --example headless_pan`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use native_canvas::canvas::NativeCanvas;
use native_canvas::config::CanvasConfig;
use native_canvas::event::{InputEvent, ScrollEvent};
use native_canvas::render::backends::tiles::{TileMapLayout, TileMapPort};
use native_canvas::render::MemorySurface;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = CanvasConfig::builder().asynchronous(true).build()?;
    let port = TileMapPort::new(TileMapLayout::default());
    let mut canvas = NativeCanvas::new(config, Box::new(port), MemorySurface::new())?;
    log::info!("canvas {} created", canvas.id());

    let wakeups = Arc::new(AtomicUsize::new(0));
    let counter = wakeups.clone();
    canvas.set_wakeup(move || {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    // The window appears, then the user grows it.
    canvas.resize(800, 600)?;
    canvas.resize(1000, 700)?;

    // A drag from right to left, faster than frames can be rendered.
    canvas.handle_input(&InputEvent::press(900.0, 300.0))?;
    for step in 1..=40 {
        canvas.handle_input(&InputEvent::drag(900.0 - step as f64 * 10.0, 300.0))?;
        // Poll like a UI loop would.
        if let Some(frame) = canvas.tick()? {
            log::info!("committed {:?} from slot {}", frame.viewport, frame.slot);
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    canvas.handle_input(&InputEvent::release(500.0, 300.0))?;

    // One wheel notch.
    canvas.handle_input(&InputEvent::Scroll(ScrollEvent::single(0.0, 40.0)))?;
    canvas.flush()?;

    let frame = canvas
        .committed()
        .ok_or_else(|| anyhow::anyhow!("nothing was committed"))?;
    log::info!(
        "final frame: {:?}, window {:?}, slot {}, generation {}",
        frame.viewport,
        frame.window,
        frame.slot,
        frame.generation
    );
    log::info!("worker woke the host {} time(s)", wakeups.load(Ordering::Relaxed));

    if let Some(pixel) = canvas.surface().visible_pixel(0, 0) {
        println!("top-left pixel: {pixel:#010x}");
    }

    canvas.dispose()?;
    Ok(())
}
