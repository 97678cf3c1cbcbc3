use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::PipelineError;

/// Produce the bounded preview for `src` at `dst`.
///
/// The output fits inside `max_width x max_height` with the aspect
/// ratio preserved and is never upscaled: an original already inside
/// the box is only re-encoded. Output is always JPEG at the given
/// quality. Returns the preview dimensions.
pub fn derive_preview(
    src: &Path,
    dst: &Path,
    max_width: u32,
    max_height: u32,
    quality: u8,
) -> Result<(u32, u32), PipelineError> {
    let img = image::open(src)?;

    let preview = if img.width() > max_width || img.height() > max_height {
        img.resize(max_width, max_height, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG carries no alpha channel.
    let rgb = preview.to_rgb8();
    let mut out = BufWriter::new(std::fs::File::create(dst)?);
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    rgb.write_with_encoder(encoder)?;
    out.flush()?;

    Ok(rgb.dimensions())
}
