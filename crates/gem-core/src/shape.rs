//! State shared by every shape-like plugin: construction size and line width.

use anyhow::Result;

use crate::atom::{single_float, Atom};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeBase {
    size: f32,
    line_width: f32,
}

impl ShapeBase {
    /// A size of `0` (the host's default float argument) means `1`.
    pub fn new(size: f32) -> Self {
        Self {
            size: if size == 0.0 { 1.0 } else { size },
            line_width: 1.0,
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Handle the shape messages. Returns `Ok(false)` if `selector` is not one of them.
    pub fn message(&mut self, selector: &str, args: &[Atom]) -> Result<bool> {
        match selector {
            "width" => {
                let width = single_float(selector, args)?;
                if width <= 0.0 {
                    anyhow::bail!("width: must be positive, got {width}");
                }
                self.line_width = width;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
