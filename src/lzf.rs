//! LZF decompression (§4.D). Only decompression is needed; RDB files are
//! never produced by this crate.

use crate::error::{ErrorKind, ParseError, Result};

/// Decompress an LZF-compressed byte slice into exactly `expected_len` bytes.
pub fn decompress(input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected_len);
    let mut i = 0;
    while i < input.len() {
        let ctrl = input[i] as usize;
        i += 1;
        if ctrl < 32 {
            let run_len = ctrl + 1;
            if i + run_len > input.len() {
                return Err(ParseError::new(ErrorKind::CorruptLzf, "literal run overruns input"));
            }
            output.extend_from_slice(&input[i..i + run_len]);
            i += run_len;
        } else {
            let mut len = ctrl >> 5;
            if len == 7 {
                if i >= input.len() {
                    return Err(ParseError::new(
                        ErrorKind::CorruptLzf,
                        "missing extended back-reference length byte",
                    ));
                }
                len += input[i] as usize;
                i += 1;
            }
            if i >= input.len() {
                return Err(ParseError::new(
                    ErrorKind::CorruptLzf,
                    "missing back-reference offset byte",
                ));
            }
            let next_byte = input[i] as usize;
            i += 1;
            let run_len = len + 2;
            let offset = output
                .len()
                .checked_sub(((ctrl & 0x1F) << 8) + next_byte + 1)
                .ok_or_else(|| {
                    ParseError::new(ErrorKind::CorruptLzf, "back-reference precedes output start")
                })?;
            for j in 0..run_len {
                let byte = output[offset + j];
                output.push(byte);
            }
        }
    }
    if output.len() != expected_len {
        return Err(ParseError::new(
            ErrorKind::CorruptLzf,
            format!("expected {} decompressed bytes, got {}", expected_len, output.len()),
        ));
    }
    Ok(output)
}
