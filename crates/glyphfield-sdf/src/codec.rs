//! Packing of 2D offset vectors into four 8-bit channels.
//!
//! Each working texel stores the vector from its pixel to the nearest seed,
//! in normalized texture units, as two 16-bit words:
//!
//! ```text
//! channel:  r      g      b      a
//! holds:    x_hi   y_hi   x_lo   y_lo
//! ```
//!
//! A word decodes to `word / 32768 - 1`, covering `[-1, 1)` in steps of
//! 1/32768. The x word `0` is reserved as the "no seed known" sentinel, so
//! encoded x components are clamped to `[1, 65535]`.
//!
//! `codec.wgsl` mirrors these functions exactly; encoding rounds with
//! `floor(v + 0.5)` on both sides so CPU and GPU agree to the bit.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Scale between a 16-bit word and a normalized component.
pub const WORD_SCALE: f32 = 32768.0;

/// Smallest representable step of a decoded component.
pub const QUANTUM: f32 = 1.0 / WORD_SCALE;

/// Reserved x word marking an indeterminate texel.
pub const SENTINEL_WORD: u16 = 0;

/// Decoded x components at or below this are treated as indeterminate by
/// [`decode_legacy_threshold`].
pub const LEGACY_SENTINEL_THRESHOLD: f32 = -0.99999;

/// One encoded working texel, laid out exactly as an `Rgba8Unorm` texel.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct EncodedTexel(pub [u8; 4]);

impl EncodedTexel {
    /// "No seed known".
    pub const INDETERMINATE: Self = Self([0, 0, 0, 0]);

    /// The zero vector, written for every seed pixel.
    pub const ZERO: Self = Self([128, 128, 0, 0]);

    /// Pack two 16-bit words.
    #[inline]
    pub const fn from_words(x: u16, y: u16) -> Self {
        Self([(x >> 8) as u8, (y >> 8) as u8, x as u8, y as u8])
    }

    /// Unpack into `(x_word, y_word)`.
    #[inline]
    pub const fn words(self) -> (u16, u16) {
        let [x_hi, y_hi, x_lo, y_lo] = self.0;
        (
            ((x_hi as u16) << 8) | x_lo as u16,
            ((y_hi as u16) << 8) | y_lo as u16,
        )
    }

    #[inline]
    pub const fn is_indeterminate(self) -> bool {
        self.words().0 == SENTINEL_WORD
    }

    /// Channels as normalized floats, the way a shader samples them.
    pub fn to_unorm(self) -> [f32; 4] {
        self.0.map(|c| c as f32 / 255.0)
    }
}

impl Default for EncodedTexel {
    fn default() -> Self {
        Self::INDETERMINATE
    }
}

#[inline]
fn quantize(value: f32, min_word: u16) -> u16 {
    let scaled = ((value + 1.0) * WORD_SCALE + 0.5).floor();
    // f32::max discards NaN, so a NaN component lands on `min_word`
    scaled.max(min_word as f32).min(u16::MAX as f32) as u16
}

#[inline]
fn word_to_component(word: u16) -> f32 {
    word as f32 / WORD_SCALE - 1.0
}

/// Encode an offset vector, or the sentinel for `None`.
///
/// Components outside the representable range saturate.
pub fn encode(vector: Option<Vec2>) -> EncodedTexel {
    match vector {
        Some(v) => EncodedTexel::from_words(quantize(v.x, 1), quantize(v.y, 0)),
        None => EncodedTexel::INDETERMINATE,
    }
}

/// Decode a texel; `None` when it holds the sentinel.
pub fn decode(texel: EncodedTexel) -> Option<Vec2> {
    if texel.is_indeterminate() {
        return None;
    }
    let (x, y) = texel.words();
    Some(Vec2::new(word_to_component(x), word_to_component(y)))
}

/// Decode with the threshold test used by older field consumers.
///
/// Rather than comparing the x word against the sentinel, this rejects any
/// texel whose decoded x is at or below [`LEGACY_SENTINEL_THRESHOLD`]. With
/// the current quantization only the sentinel word decodes that low, so both
/// decoders agree on every texel [`encode`] produces.
pub fn decode_legacy_threshold(texel: EncodedTexel) -> Option<Vec2> {
    let (x, y) = texel.words();
    let v = Vec2::new(word_to_component(x), word_to_component(y));
    (v.x > LEGACY_SENTINEL_THRESHOLD).then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_vector_encoding() {
        assert_eq!(encode(Some(Vec2::ZERO)), EncodedTexel::ZERO);
        assert_eq!(decode(EncodedTexel::ZERO), Some(Vec2::ZERO));
        assert_eq!(EncodedTexel::ZERO.words(), (32768, 32768));
    }

    #[test]
    fn test_sentinel_is_indeterminate() {
        assert_eq!(encode(None), EncodedTexel::INDETERMINATE);
        assert_eq!(decode(EncodedTexel::INDETERMINATE), None);
        // only the x word matters
        assert_eq!(decode(EncodedTexel([0, 200, 0, 17])), None);
        assert_eq!(EncodedTexel::default(), EncodedTexel::INDETERMINATE);
    }

    #[test]
    fn test_word_layout() {
        let texel = EncodedTexel::from_words(0xABCD, 0x1234);
        assert_eq!(texel.0, [0xAB, 0x12, 0xCD, 0x34]);
        assert_eq!(texel.words(), (0xABCD, 0x1234));
    }

    #[test]
    fn test_round_trip_within_quantum() {
        let mut v = -1.0f32;
        while v <= 1.0 {
            let w = -v * 0.5;
            let decoded = decode(encode(Some(Vec2::new(v, w)))).unwrap();
            assert!(
                (decoded.x - v).abs() <= QUANTUM * 1.001,
                "x: {} -> {}",
                v,
                decoded.x
            );
            assert!((decoded.y - w).abs() <= QUANTUM * 1.001);
            v += 0.0137;
        }
    }

    #[test]
    fn test_range_extremes() {
        // +1 saturates to the top word
        let decoded = decode(encode(Some(Vec2::new(1.0, 1.0)))).unwrap();
        assert_eq!(decoded, Vec2::splat(1.0 - QUANTUM));

        // -1 on x stays distinguishable from the sentinel
        let texel = encode(Some(Vec2::new(-1.0, -1.0)));
        assert!(!texel.is_indeterminate());
        let decoded = decode(texel).unwrap();
        assert_eq!(decoded.x, -1.0 + QUANTUM);
        assert_eq!(decoded.y, -1.0);
    }

    #[test]
    fn test_out_of_range_saturates() {
        let decoded = decode(encode(Some(Vec2::new(5.0, -5.0)))).unwrap();
        assert_eq!(decoded, Vec2::new(1.0 - QUANTUM, -1.0));

        let texel = encode(Some(Vec2::new(f32::NAN, 0.0)));
        assert!(!texel.is_indeterminate());
    }

    #[test]
    fn test_legacy_threshold_near_cutoff() {
        // -0.99999 itself is encodable and must survive both decoders
        let texel = encode(Some(Vec2::new(LEGACY_SENTINEL_THRESHOLD, 0.0)));
        assert!(decode(texel).is_some());
        assert!(decode_legacy_threshold(texel).is_some());

        // the raw sentinel word decodes to -1 and is rejected
        assert_eq!(decode_legacy_threshold(EncodedTexel::from_words(0, 0)), None);
    }

    #[test]
    fn test_legacy_threshold_agrees_on_every_x_word() {
        for x in 0..=u16::MAX {
            let texel = EncodedTexel::from_words(x, 0x8000);
            assert_eq!(decode(texel), decode_legacy_threshold(texel), "word {}", x);
        }
    }

    #[test]
    fn test_unorm_channels() {
        let unorm = EncodedTexel::ZERO.to_unorm();
        assert!((unorm[0] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(unorm[2], 0.0);
    }
}
