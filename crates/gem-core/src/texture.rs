//! Texture targets and the `extTexture` message.

use anyhow::{bail, Result};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::atom::Atom;

/// GL texture targets an external texture may be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u32)]
pub enum TextureTarget {
    /// `GL_TEXTURE_2D`
    Texture2D = 0x0DE1,
    /// `GL_TEXTURE_RECTANGLE` (the host's default for pix textures).
    Rectangle = 0x84F5,
}

impl TextureTarget {
    pub fn from_gl(value: u32) -> Option<Self> {
        Self::from_u32(value)
    }
}

pub const EXT_TEXTURE_USAGE: &str = "arguments: <texId> [<width> <height> [<type> [<upsidedown>]]]";

/// Parsed `extTexture <texId> [<width> <height> [<type> [<upsidedown>]]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtTexture {
    pub texture: u32,
    pub size: Option<(i32, i32)>,
    /// Raw GL target enum as sent by the host.
    pub target: Option<u32>,
    pub upsidedown: Option<bool>,
}

impl ExtTexture {
    /// Parse the message arguments. Accepts 1, 3, 4 or 5 floats.
    ///
    /// Arguments are checked from last to first and the first bad one is
    /// reported by its 1-based position. Nothing is returned on error.
    pub fn parse(args: &[Atom]) -> Result<Self> {
        if !matches!(args.len(), 1 | 3 | 4 | 5) {
            bail!(EXT_TEXTURE_USAGE);
        }

        let float_at = |index: usize| -> Result<f32> {
            match args[index].as_float() {
                Some(v) => Ok(v),
                None => bail!("invalid type of argument #{}", index + 1),
            }
        };

        let upsidedown = match args.len() {
            5 => Some(float_at(4)? as i32 != 0),
            _ => None,
        };
        let target = match args.len() {
            4 | 5 => Some(float_at(3)? as i32 as u32),
            _ => None,
        };
        let size = match args.len() {
            3..=5 => {
                let height = float_at(2)?;
                let width = float_at(1)?;
                Some((width as i32, height as i32))
            }
            _ => None,
        };
        let texture = float_at(0)? as i32 as u32;

        Ok(Self {
            texture,
            size,
            target,
            upsidedown,
        })
    }

    /// The texture target, if the host sent one we understand.
    pub fn texture_target(&self) -> Option<TextureTarget> {
        self.target.and_then(TextureTarget::from_gl)
    }
}
