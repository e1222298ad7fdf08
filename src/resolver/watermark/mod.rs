// Watermark detection - frame sampling + text recognition

mod signature;
mod validator;

pub use signature::{normalize_text, WatermarkSignature};
pub use validator::WatermarkValidator;
