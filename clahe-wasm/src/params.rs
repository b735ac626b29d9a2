use clahe_core::ClaheParams as CoreClaheParams;
use wasm_bindgen::prelude::*;

/// Equalization parameters exposed to JavaScript.
#[wasm_bindgen]
pub struct ClaheParams {
    pub(crate) inner: CoreClaheParams,
}

#[wasm_bindgen]
impl ClaheParams {
    /// Create parameters with custom values.
    #[wasm_bindgen(constructor)]
    pub fn new(tile_length: u32, clip_factor: f64, blend_factor: f64, smoothing: f64) -> Self {
        Self {
            inner: CoreClaheParams::new(tile_length, clip_factor, blend_factor)
                .with_smoothing(smoothing),
        }
    }

    /// Look up a named preset.
    #[wasm_bindgen(js_name = fromPreset)]
    pub fn from_preset(name: &str) -> Result<ClaheParams, JsValue> {
        CoreClaheParams::from_preset(name)
            .map(|inner| Self { inner })
            .ok_or_else(|| JsValue::from_str(&format!("Unknown preset '{}'", name)))
    }

    /// Names accepted by `fromPreset`.
    #[wasm_bindgen(js_name = presetNames)]
    pub fn preset_names() -> js_sys::Array {
        CoreClaheParams::preset_names()
            .into_iter()
            .map(JsValue::from_str)
            .collect()
    }

    /// Balanced local contrast with a partial blend.
    pub fn standard() -> Self {
        Self {
            inner: CoreClaheParams::standard(),
        }
    }

    /// Full equalization with a high clip limit.
    pub fn strong() -> Self {
        Self {
            inner: CoreClaheParams::strong(),
        }
    }

    /// Large tiles, tight clip limit, mostly identity.
    pub fn gentle() -> Self {
        Self {
            inner: CoreClaheParams::gentle(),
        }
    }

    /// Full equalization with no smoothing.
    pub fn classic() -> Self {
        Self {
            inner: CoreClaheParams::classic(),
        }
    }

    #[wasm_bindgen(getter, js_name = tileLength)]
    pub fn tile_length(&self) -> u32 {
        self.inner.tile_length
    }

    #[wasm_bindgen(getter, js_name = clipFactor)]
    pub fn clip_factor(&self) -> f64 {
        self.inner.clip_factor
    }

    #[wasm_bindgen(getter, js_name = blendFactor)]
    pub fn blend_factor(&self) -> f64 {
        self.inner.blend_factor
    }

    #[wasm_bindgen(getter)]
    pub fn smoothing(&self) -> f64 {
        self.inner.smoothing
    }
}
