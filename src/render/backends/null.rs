use crate::render::port::{ColorModel, NativeRenderPort, PortError, RenderBuffer};

/// Null renderer that does not draw anything meaningful.
///
/// It allocates real buffers, cycles through the slots and stamps every slot it
/// renders with the frame counter, so hosts can tell frames apart. Failures can
/// be injected for the next allocation or render.
#[derive(Debug, Default)]
pub struct NullPort {
    buffer: Option<RenderBuffer>,
    next_slot: usize,
    origin: (i32, i32),
    frame_id: u32,
    allocations: usize,
    fail_allocation: Option<String>,
    fail_render: Option<String>,
}

impl NullPort {
    /// Creates a new instance of the null port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful allocations so far.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u32 {
        self.frame_id
    }

    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    pub fn fail_next_allocation(&mut self, reason: impl Into<String>) {
        self.fail_allocation = Some(reason.into());
    }

    pub fn fail_next_render(&mut self, reason: impl Into<String>) {
        self.fail_render = Some(reason.into());
    }
}

impl NativeRenderPort for NullPort {
    fn name(&self) -> &str {
        "NullPort"
    }

    fn allocate(
        &mut self,
        width: u32,
        height: u32,
        num_buffers: u32,
        color_model: ColorModel,
    ) -> Result<RenderBuffer, PortError> {
        if let Some(reason) = self.fail_allocation.take() {
            return Err(PortError::Native(reason));
        }

        let buffer = RenderBuffer::allocate(width, height, num_buffers, color_model)?;
        self.buffer = Some(buffer.clone());
        self.next_slot = 0;
        self.allocations += 1;
        Ok(buffer)
    }

    fn move_to(&mut self, x: i32, y: i32) {
        self.origin = (x, y);
    }

    fn render_frame(&mut self) -> Result<usize, PortError> {
        let buffer = self.buffer.as_ref().ok_or(PortError::NotAllocated)?;
        if let Some(reason) = self.fail_render.take() {
            return Err(PortError::Native(reason));
        }

        let slot = self.next_slot;
        self.next_slot = (slot + 1) % buffer.num_buffers() as usize;
        self.frame_id = self.frame_id.wrapping_add(1);

        let stamp = 0xFF00_0000 | (self.frame_id & 0x00FF_FFFF);
        buffer.write_slot(slot, |pixels| pixels.fill(stamp));
        Ok(slot)
    }

    fn dispose(&mut self) {
        self.buffer = None;
        self.next_slot = 0;
    }
}
