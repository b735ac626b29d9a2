use clahe_core::exif_orientation::apply_exif_orientation_from_bytes;
use clahe_core::pipeline::process_image;
use image::ImageFormat;
use std::io::Cursor;
use wasm_bindgen::prelude::*;

use crate::params::ClaheParams;
use crate::utils::console_log;

/// Main image processor.
#[wasm_bindgen]
pub struct ClaheProcessor;

#[wasm_bindgen]
impl ClaheProcessor {
    /// Equalize an encoded image.
    ///
    /// # Arguments
    /// * `image_bytes` - Input image as byte array (PNG, JPEG, WebP, etc.)
    /// * `params` - Equalization parameters
    ///
    /// # Returns
    /// PNG-encoded image bytes
    #[wasm_bindgen(js_name = processImage)]
    pub fn process_image(image_bytes: &[u8], params: &ClaheParams) -> Result<Vec<u8>, JsValue> {
        let img = image::load_from_memory(image_bytes)
            .map_err(|e| JsValue::from_str(&format!("Failed to load image: {}", e)))?;
        let img = apply_exif_orientation_from_bytes(img, image_bytes);
        console_log!(
            "equalizing {}x{} image, tile {}",
            img.width(),
            img.height(),
            params.inner.tile_length
        );

        let result = process_image(&img, &params.inner)
            .map_err(|e| JsValue::from_str(&format!("Failed to process image: {}", e)))?;

        let mut output = Vec::new();
        result
            .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
            .map_err(|e| JsValue::from_str(&format!("Failed to encode PNG: {}", e)))?;

        Ok(output)
    }
}
