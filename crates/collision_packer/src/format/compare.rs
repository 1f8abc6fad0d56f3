//! Byte comparison against a reference container

use crate::format::unpack;
use crate::PackError;

/// Compare a repacked container with a reference, byte for byte.
///
/// The first differing byte is reported with the name of the reference
/// section that holds it. When one buffer is a prefix of the other the
/// lengths are reported instead.
pub fn compare_containers(expected: &[u8], actual: &[u8]) -> Result<(), PackError> {
    if let Some(offset) = expected.iter().zip(actual).position(|(a, b)| a != b) {
        let section = unpack(expected).map_or("unknown", |container| container.section_at(offset));
        log::debug!("First mismatch at {offset:#x} in {section}");
        return Err(PackError::FormatMismatch {
            section,
            offset,
            expected: expected[offset],
            actual: actual[offset],
        });
    }
    if expected.len() != actual.len() {
        return Err(PackError::LengthMismatch { expected: expected.len(), actual: actual.len() });
    }
    Ok(())
}
