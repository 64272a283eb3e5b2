//! Byte-level conversions for images read back from the device.

/// Expand a 0/1 mask to 0/255 luminance.
pub fn mask_to_luminance(mask: &[u8], out: &mut [u8]) {
    for (dst, &bit) in out.iter_mut().zip(mask) {
        *dst = if bit != 0 { 255 } else { 0 };
    }
}
