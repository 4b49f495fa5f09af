use super::parse_atom::decode_size;
use crate::error::EvalErr;

/// Measure the length of the serialized node at the start of the buffer
/// without building a tree. Validates structure and size prefixes the
/// same way the real parser does; trailing bytes are ignored.
pub fn serialized_length_from_bytes(b: &[u8]) -> Result<u64, EvalErr> {
    let mut items_remaining: u64 = 1;
    let mut cursor: usize = 0;

    while items_remaining > 0 {
        items_remaining -= 1;
        let byte = *b.get(cursor).ok_or(EvalErr::BadEncoding)?;
        if byte == 0xff {
            cursor += 1;
            items_remaining += 2;
        } else {
            let (prefix_len, size) = decode_size(b, cursor)?;
            let end = cursor
                .checked_add(prefix_len)
                .and_then(|c| c.checked_add(size as usize))
                .ok_or(EvalErr::BadEncoding)?;
            if end > b.len() {
                return Err(EvalErr::BadEncoding);
            }
            cursor = end;
        }
    }
    Ok(cursor as u64)
}
