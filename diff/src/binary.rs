//! Text/binary classification.

/// Number of leading bytes inspected.
pub const BINARY_SAMPLE_SIZE: usize = 8192;

/// Share of non-printable bytes above which content counts as binary.
pub const NON_PRINTABLE_THRESHOLD: f64 = 0.30;

/// Guess whether `content` is binary.
///
/// This is an approximation, not a format sniffer. Only the first
/// [`BINARY_SAMPLE_SIZE`] bytes are looked at: any NUL byte means binary;
/// otherwise the content is binary when more than 30% of the sample is
/// non-printable. Control bytes other than tab, LF and CR count as
/// non-printable, as does DEL. Bytes with the high bit set count too,
/// unless the sample is valid UTF-8 (allowing a sequence cut off by the
/// sample boundary).
pub fn is_binary_content(content: &[u8]) -> bool {
    if content.is_empty() {
        return false;
    }

    let sample = &content[..content.len().min(BINARY_SAMPLE_SIZE)];
    if sample.contains(&0) {
        return true;
    }

    let high_bytes_are_text = match std::str::from_utf8(sample) {
        Ok(_) => true,
        // Only a truncated trailing sequence.
        Err(e) => e.error_len().is_none(),
    };

    let non_printable = sample
        .iter()
        .filter(|&&b| match b {
            b'\t' | b'\n' | b'\r' => false,
            0x00..=0x1f | 0x7f => true,
            0x80..=0xff => !high_bytes_are_text,
            _ => false,
        })
        .count();

    non_printable as f64 / sample.len() as f64 > NON_PRINTABLE_THRESHOLD
}
