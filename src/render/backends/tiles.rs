//! Tile-map reference renderer.
//!
//! Draws a map of square tiles in alternating colors on a background color,
//! seen through the current origin. It stands in for a real native renderer
//! (OpenGL, a map engine, ...) and is what the demo uses.

use crate::render::port::{ColorModel, NativeRenderPort, PortError, RenderBuffer};

pub const BACKGROUND_COLOR: u32 = 0xFF00_00FF;
pub const EVEN_TILE_COLOR: u32 = 0xFFFF_0000;
pub const ODD_TILE_COLOR: u32 = 0xFF00_FF00;

#[derive(Debug, Clone, Copy)]
pub struct TileMapLayout {
    /// Tiles per row; odd so the corners share a color.
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub tile_size: u32,
}

impl Default for TileMapLayout {
    fn default() -> Self {
        Self {
            tiles_x: 11,
            tiles_y: 11,
            tile_size: 256,
        }
    }
}

#[derive(Debug, Default)]
pub struct TileMapPort {
    layout: TileMapLayout,
    buffer: Option<RenderBuffer>,
    next_slot: usize,
    origin: (i32, i32),
}

impl TileMapPort {
    pub fn new(layout: TileMapLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Color of the map at world position `(x, y)`.
    pub fn color_at(&self, x: i64, y: i64) -> u32 {
        let size = i64::from(self.layout.tile_size);
        if x < 0 || y < 0 {
            return BACKGROUND_COLOR;
        }
        let (col, row) = (x / size, y / size);
        if col >= i64::from(self.layout.tiles_x) || row >= i64::from(self.layout.tiles_y) {
            return BACKGROUND_COLOR;
        }
        if (row * i64::from(self.layout.tiles_x) + col) % 2 == 0 {
            EVEN_TILE_COLOR
        } else {
            ODD_TILE_COLOR
        }
    }

    fn draw(&self, pixels: &mut [u32], width: u32, height: u32) {
        pixels.fill(BACKGROUND_COLOR);

        let size = i64::from(self.layout.tile_size);
        let (ox, oy) = (i64::from(self.origin.0), i64::from(self.origin.1));
        let (w, h) = (i64::from(width), i64::from(height));

        for row in 0..i64::from(self.layout.tiles_y) {
            let top = (row * size - oy).max(0);
            let bottom = ((row + 1) * size - oy).min(h);
            if top >= bottom {
                continue;
            }
            for col in 0..i64::from(self.layout.tiles_x) {
                let left = (col * size - ox).max(0);
                let right = ((col + 1) * size - ox).min(w);
                if left >= right {
                    continue;
                }
                let color = self.color_at(col * size, row * size);
                for y in top..bottom {
                    let start = (y * w + left) as usize;
                    let end = (y * w + right) as usize;
                    pixels[start..end].fill(color);
                }
            }
        }
    }
}

impl NativeRenderPort for TileMapPort {
    fn name(&self) -> &str {
        "TileMapPort"
    }

    fn allocate(
        &mut self,
        width: u32,
        height: u32,
        num_buffers: u32,
        color_model: ColorModel,
    ) -> Result<RenderBuffer, PortError> {
        if num_buffers > 2 {
            return Err(PortError::UnsupportedLayout {
                width,
                height,
                num_buffers,
                color_model,
            });
        }
        if num_buffers == 1 {
            log::warn!("TileMapPort: clearing a single buffer before drawing may flicker");
        }

        let buffer = RenderBuffer::allocate(width, height, num_buffers, color_model)?;
        self.buffer = Some(buffer.clone());
        self.next_slot = 0;
        self.origin = (0, 0);
        Ok(buffer)
    }

    fn move_to(&mut self, x: i32, y: i32) {
        self.origin = (x, y);
    }

    fn render_frame(&mut self) -> Result<usize, PortError> {
        let buffer = self.buffer.as_ref().ok_or(PortError::NotAllocated)?;
        let slot = self.next_slot;
        self.next_slot = (slot + 1) % buffer.num_buffers() as usize;

        buffer
            .write_slot(slot, |pixels| self.draw(pixels, buffer.width(), buffer.height()))
            .ok_or(PortError::NotAllocated)?;
        Ok(slot)
    }

    fn dispose(&mut self) {
        self.buffer = None;
        self.next_slot = 0;
    }
}
