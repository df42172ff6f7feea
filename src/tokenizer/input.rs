/*!
 * Encode Inputs
 * Text sources the marshalling layer can stage as UTF-8
 */

use crate::core::limits::max_utf8_byte_count;

/// Text that can be written into a UTF-8 staging buffer
///
/// `max_utf8_len` is an upper bound used to route the input: within the
/// pool buffer size it is staged in a pool buffer, otherwise in a one-off
/// allocation of exactly that size.
pub trait EncodeInput {
    /// Upper bound on the encoded byte length
    fn max_utf8_len(&self) -> usize;

    /// Write UTF-8 into `dst`, returning the number of bytes written
    ///
    /// `dst` holds at least [`EncodeInput::max_utf8_len`] bytes.
    fn encode_utf8(&self, dst: &mut [u8]) -> usize;
}

impl EncodeInput for str {
    #[inline]
    fn max_utf8_len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn encode_utf8(&self, dst: &mut [u8]) -> usize {
        let bytes = self.as_bytes();
        dst[..bytes.len()].copy_from_slice(bytes);
        bytes.len()
    }
}

impl EncodeInput for String {
    #[inline]
    fn max_utf8_len(&self) -> usize {
        self.as_str().max_utf8_len()
    }

    #[inline]
    fn encode_utf8(&self, dst: &mut [u8]) -> usize {
        self.as_str().encode_utf8(dst)
    }
}

/// UTF-16 code units; unpaired surrogates become U+FFFD
impl EncodeInput for [u16] {
    #[inline]
    fn max_utf8_len(&self) -> usize {
        max_utf8_byte_count(self.len()).unwrap_or(usize::MAX)
    }

    fn encode_utf8(&self, dst: &mut [u8]) -> usize {
        let mut written = 0;
        for ch in char::decode_utf16(self.iter().copied()) {
            let ch = ch.unwrap_or(char::REPLACEMENT_CHARACTER);
            written += ch.encode_utf8(&mut dst[written..]).len();
        }
        written
    }
}

impl EncodeInput for Vec<u16> {
    #[inline]
    fn max_utf8_len(&self) -> usize {
        self.as_slice().max_utf8_len()
    }

    #[inline]
    fn encode_utf8(&self, dst: &mut [u8]) -> usize {
        self.as_slice().encode_utf8(dst)
    }
}

impl<T: EncodeInput + ?Sized> EncodeInput for &T {
    #[inline]
    fn max_utf8_len(&self) -> usize {
        (**self).max_utf8_len()
    }

    #[inline]
    fn encode_utf8(&self, dst: &mut [u8]) -> usize {
        (**self).encode_utf8(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_is_copied_verbatim() {
        let mut dst = [0u8; 16];
        let written = "héllo".encode_utf8(&mut dst);
        assert_eq!(&dst[..written], "héllo".as_bytes());
        assert_eq!("héllo".max_utf8_len(), 6);
    }

    #[test]
    fn test_utf16_transcodes() {
        let text = "a€😀";
        let units: Vec<u16> = text.encode_utf16().collect();
        let mut dst = vec![0u8; units.max_utf8_len()];

        let written = units.encode_utf8(&mut dst);
        assert_eq!(&dst[..written], text.as_bytes());
    }

    #[test]
    fn test_utf16_bound_covers_worst_case() {
        // Every BMP unit outside ASCII takes 3 bytes
        let units = vec![0x20ACu16; 10];
        assert!(units.max_utf8_len() >= 30);

        let mut dst = vec![0u8; units.max_utf8_len()];
        assert_eq!(units.encode_utf8(&mut dst), 30);
    }

    #[test]
    fn test_lone_surrogate_replaced() {
        let units = [0x61u16, 0xD800, 0x62];
        let mut dst = vec![0u8; units.max_utf8_len()];
        let written = units[..].encode_utf8(&mut dst);
        assert_eq!(std::str::from_utf8(&dst[..written]).unwrap(), "a\u{FFFD}b");
    }
}
