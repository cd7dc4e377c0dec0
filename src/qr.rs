//! QR codes pointing at a menu page.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use thiserror::Error;

/// Minimum edge length of the generated image, in pixels.
pub const QR_SIZE: u32 = 360;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("failed to encode QR payload: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("failed to write PNG: {0}")]
    Png(#[from] image::ImageError),
}

pub fn encode_png(payload: &str) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(payload.as_bytes())?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(QR_SIZE, QR_SIZE)
        .quiet_zone(true)
        .build();

    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

pub fn data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// Like [`encode_png`] + [`data_url`], but a failure just means "no QR".
pub fn try_data_url(payload: &str) -> Option<String> {
    match encode_png(payload) {
        Ok(png) => Some(data_url(&png)),
        Err(err) => {
            tracing::warn!(error = %err, "QR generation failed");
            None
        }
    }
}
