// Fixed-width hex encoding for numeric key components
//
// Every number embedded in a store key is encoded as the lowercase hex of
// its big-endian byte representation, so byte-lexicographic key order
// equals numeric order. Range scans over value-ordered UTXO indices and
// timestamp-ordered history keys depend on this; the encoding is a
// compatibility contract and must not change.

use crate::storage::store::StoreError;

/// Encode a u8 as 2 hex characters
pub(crate) fn u8_hex(v: u8) -> String {
    hex::encode([v])
}

/// Encode a u32 as 8 hex characters
pub(crate) fn u32_hex(v: u32) -> String {
    hex::encode(v.to_be_bytes())
}

/// Encode a u64 as 16 hex characters
pub(crate) fn u64_hex(v: u64) -> String {
    hex::encode(v.to_be_bytes())
}

/// Encode an i64 as the 16-hex-character form of its two's-complement
/// bit pattern. Used for wallet scalars carrying a -1 sentinel; those
/// keys are never range-scanned, so ordering of negatives is irrelevant.
pub(crate) fn i64_hex(v: i64) -> String {
    u64_hex(v as u64)
}

fn parse_hex<const N: usize>(bytes: &[u8]) -> Result<[u8; N], StoreError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
    let decoded =
        hex::decode(text).map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
    decoded.try_into().map_err(|_| {
        StoreError::DeserializationFailed(format!("expected {} hex bytes", N * 2))
    })
}

/// Decode a u32 from its 8-hex-character form
pub(crate) fn parse_u32_hex(bytes: &[u8]) -> Result<u32, StoreError> {
    Ok(u32::from_be_bytes(parse_hex::<4>(bytes)?))
}

/// Decode a u64 from its 16-hex-character form
pub(crate) fn parse_u64_hex(bytes: &[u8]) -> Result<u64, StoreError> {
    Ok(u64::from_be_bytes(parse_hex::<8>(bytes)?))
}

/// Decode an i64 from its 16-hex-character two's-complement form
pub(crate) fn parse_i64_hex(bytes: &[u8]) -> Result<i64, StoreError> {
    Ok(parse_u64_hex(bytes)? as i64)
}

/// Smallest byte string strictly greater than every key starting with
/// `prefix`. Our prefixes always end in `:`, never 0xff, so bumping the
/// final byte is enough.
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    if let Some(last) = end.last_mut() {
        debug_assert!(*last < 0xff);
        *last += 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_fixed_widths() {
        assert_eq!(u8_hex(0), "00");
        assert_eq!(u8_hex(255), "ff");
        assert_eq!(u32_hex(0), "00000000");
        assert_eq!(u64_hex(0), "0000000000000000");
        assert_eq!(u64_hex(u64::MAX), "ffffffffffffffff");
    }

    #[test]
    fn test_round_trips() {
        for v in [0u64, 1, 20, u64::MAX - 1, u64::MAX] {
            assert_eq!(parse_u64_hex(u64_hex(v).as_bytes()).unwrap(), v);
        }
        for v in [0u32, 7, u32::MAX] {
            assert_eq!(parse_u32_hex(u32_hex(v).as_bytes()).unwrap(), v);
        }
        for v in [-1i64, 0, 42, i64::MAX, i64::MIN] {
            assert_eq!(parse_i64_hex(i64_hex(v).as_bytes()).unwrap(), v);
        }
    }

    #[test]
    fn test_lexicographic_order_matches_numeric_order() {
        let mut rng = rand::thread_rng();
        let mut pairs: Vec<(u64, u64)> = (0..1000)
            .map(|_| (rng.gen::<u64>(), rng.gen::<u64>()))
            .collect();
        pairs.push((0, u64::MAX));
        pairs.push((0, 1));
        pairs.push((u64::MAX - 1, u64::MAX));

        for (a, b) in pairs {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            if lo == hi {
                continue;
            }
            assert!(
                u64_hex(lo) < u64_hex(hi),
                "encoding of {lo} must sort before encoding of {hi}"
            );
        }
    }

    #[test]
    fn test_prefix_upper_bound_covers_prefix() {
        let prefix = b"utxo:";
        let end = prefix_upper_bound(prefix);
        assert!(end.as_slice() > prefix.as_slice());
        assert!(end.as_slice() > b"utxo:zzzz".as_slice());
    }
}
