//! QR rendering of session token payloads.

use qrcode::{render::svg, QrCode};

use crate::RpcError;

/// Render `payload` as a standalone SVG document.
pub fn render_svg(payload: &str) -> Result<String, RpcError> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| RpcError::Internal(format!("QR encoding failed: {e}")))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(256, 256)
        .build())
}
