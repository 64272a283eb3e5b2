//! Host-side images and the pix blocks that carry them through the render chain.
//!
//! GL enum values are hardcoded so this crate does not need GL bindings.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Pixel formats understood by the host image pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u32)]
pub enum ColorFormat {
    /// `GL_LUMINANCE`, one byte per pixel.
    Luminance = 0x1909,
    /// `GL_RGBA`, four bytes per pixel.
    Rgba = 0x1908,
    /// `GL_YCBCR_422_APPLE`, two bytes per pixel.
    Yuv422 = 0x85B9,
}

impl ColorFormat {
    pub fn from_gl(value: u32) -> Option<Self> {
        Self::from_u32(value)
    }

    /// Bytes per pixel.
    pub fn csize(self) -> usize {
        match self {
            ColorFormat::Luminance => 1,
            ColorFormat::Yuv422 => 2,
            ColorFormat::Rgba => 4,
        }
    }
}

/// A CPU-side image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStruct {
    pub xsize: usize,
    pub ysize: usize,
    pub csize: usize,
    pub format: ColorFormat,
    pub upsidedown: bool,
    pub data: Vec<u8>,
}

impl Default for ImageStruct {
    fn default() -> Self {
        Self {
            xsize: 0,
            ysize: 0,
            csize: ColorFormat::Rgba.csize(),
            format: ColorFormat::Rgba,
            upsidedown: false,
            data: Vec::new(),
        }
    }
}

impl ImageStruct {
    pub fn new(xsize: usize, ysize: usize, format: ColorFormat) -> Self {
        let mut image = Self {
            xsize,
            ysize,
            ..Self::default()
        };
        image.set_csize_by_format(format);
        image.allocate();
        image
    }

    pub fn set_csize_by_format(&mut self, format: ColorFormat) {
        self.format = format;
        self.csize = format.csize();
    }

    /// (Re)allocate zeroed storage for `xsize * ysize * csize` bytes.
    pub fn allocate(&mut self) {
        self.data = vec![0; self.byte_len()];
    }

    pub fn pixel_count(&self) -> usize {
        self.xsize * self.ysize
    }

    pub fn byte_len(&self) -> usize {
        self.pixel_count() * self.csize
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.xsize, self.ysize)
    }
}

/// An image travelling down the render chain. `newimage` tells downstream
/// objects that the data changed this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixBlock {
    pub image: ImageStruct,
    pub newimage: bool,
}

impl PixBlock {
    pub fn new(image: ImageStruct) -> Self {
        Self {
            image,
            newimage: true,
        }
    }
}
