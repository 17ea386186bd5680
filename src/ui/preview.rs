use image::{
    imageops::{resize, FilterType},
    ImageResult,
};

/// Characters from dark to light, used to shade the preview
const SHADES: [char; 4] = ['#', '*', '+', ' '];

/// Picks the character for a grayscale value
fn shade(luma: u8) -> char {
    match luma {
        0..=95 => SHADES[0],
        96..=175 => SHADES[1],
        176..=240 => SHADES[2],
        _ => SHADES[3],
    }
}

/// Turns an encoded raster image into text that is `width` characters wide.
/// Terminal cells are roughly twice as tall as wide, so every character
/// covers two rows worth of pixels.
pub fn ascii_preview(bytes: &[u8], width: u32) -> ImageResult<String> {
    let image = image::load_from_memory(bytes)?.to_luma8();
    let (w, h) = image.dimensions();
    let height = ((h as f64 / w.max(1) as f64) * width as f64 / 2.0)
        .round()
        .max(1.0) as u32;
    let small = resize(&image, width, height, FilterType::Triangle);
    let mut res = String::with_capacity(((width + 1) * height) as usize);
    for row in small.rows() {
        let line: String = row.map(|p| shade(p[0])).collect();
        res.push_str(line.trim_end());
        res.push('\n');
    }
    Ok(res)
}
