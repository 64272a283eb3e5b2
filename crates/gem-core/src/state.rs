//! Per-frame render state handed to each plugin in the chain.

use crate::image::PixBlock;

/// Render state for one pass through the chain.
///
/// Upstream objects place a [`PixBlock`] here; a plugin may read it and
/// replace it with its own output for downstream objects.
#[derive(Debug)]
pub struct GemState {
    pix: Option<PixBlock>,
}

impl Default for GemState {
    fn default() -> Self {
        Self::new()
    }
}

impl GemState {
    pub fn new() -> Self {
        Self { pix: None }
    }

    pub fn with_pix(pix: PixBlock) -> Self {
        Self { pix: Some(pix) }
    }

    pub fn pix(&self) -> Option<&PixBlock> {
        self.pix.as_ref()
    }

    pub fn set_pix(&mut self, pix: PixBlock) {
        self.pix = Some(pix);
    }
}
