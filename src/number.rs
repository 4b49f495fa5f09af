use num_bigint::BigInt;
use num_traits::Zero;

/// Arbitrary precision integer, as read from and written to atoms.
pub type Number = BigInt;

/// Interpret atom bytes as a big-endian two's complement integer. Any
/// encoding is accepted here; minimality is enforced separately where an
/// operator (or flag) requires it.
pub fn number_from_u8(v: &[u8]) -> Number {
    if v.is_empty() {
        Number::zero()
    } else {
        Number::from_signed_bytes_be(v)
    }
}

/// The canonical atom encoding of an integer. Zero is the empty atom,
/// everything else is the shortest big-endian two's complement form.
pub fn number_to_signed_bytes(v: &Number) -> Vec<u8> {
    if v.is_zero() {
        Vec::new()
    } else {
        v.to_signed_bytes_be()
    }
}

/// true if the byte string is the canonical encoding of the integer it
/// denotes. A leading 0x00 is redundant unless the next byte has its high
/// bit set; a leading 0xff is redundant unless the next byte has its high
/// bit clear. A lone 0x00 denotes zero, whose canonical form is empty.
pub fn is_canonical_integer(v: &[u8]) -> bool {
    match v {
        [] => true,
        [0] => false,
        [0, rest, ..] => rest & 0x80 != 0,
        [0xff, rest, ..] => rest & 0x80 == 0,
        [0xff] => true,
        _ => true,
    }
}
