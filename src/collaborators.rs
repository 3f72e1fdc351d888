use crate::error::AppResult;

/// Extracts text from a receipt image on disk.
///
/// Implementations fail with the OCR error variant when the image cannot
/// be read or no text can be extracted.
pub trait OcrEngine {
    fn extract_text(&self, image_path: &str) -> AppResult<String>;
}

/// Captures one utterance from an input device and returns its transcript.
///
/// Implementations fail with the speech error variant when nothing is
/// recognized or no device is available, and must give up after a bounded
/// wait rather than block forever.
pub trait SpeechRecognizer {
    fn capture_and_transcribe(&self) -> AppResult<String>;
}
