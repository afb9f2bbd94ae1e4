//! RunLengthDecode filter (ISO 32000-1 Section 7.4.5)

use crate::parser::{ParseError, ParseResult};

const EOD: u8 = 128;
const MAX_RUN: usize = 128;

/// Decode run-length data; a missing EOD marker is tolerated
pub fn decode_run_length(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while let Some(&length) = data.get(i) {
        i += 1;
        match length {
            EOD => break,
            0..=127 => {
                let count = usize::from(length) + 1;
                let literal = data.get(i..i + count).ok_or_else(truncated)?;
                result.extend_from_slice(literal);
                i += count;
            }
            _ => {
                let byte = *data.get(i).ok_or_else(truncated)?;
                let count = 257 - usize::from(length);
                result.resize(result.len() + count, byte);
                i += 1;
            }
        }
    }

    Ok(result)
}

fn truncated() -> ParseError {
    ParseError::StreamDecodeError("RunLength data ends inside a run".to_string())
}

/// Encode with repeat runs for two or more equal bytes, then the EOD marker
pub fn encode_run_length(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() + data.len() / MAX_RUN + 2);
    let mut literal_start = 0;
    let mut i = 0;

    while i < data.len() {
        let run = data[i..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&b| b == data[i])
            .count();

        if run >= 2 {
            flush_literal(&mut result, &data[literal_start..i]);
            result.push((257 - run) as u8);
            result.push(data[i]);
            i += run;
            literal_start = i;
        } else {
            i += 1;
            if i - literal_start == MAX_RUN {
                flush_literal(&mut result, &data[literal_start..i]);
                literal_start = i;
            }
        }
    }

    flush_literal(&mut result, &data[literal_start..]);
    result.push(EOD);
    result
}

fn flush_literal(out: &mut Vec<u8>, literal: &[u8]) {
    if !literal.is_empty() {
        out.push((literal.len() - 1) as u8);
        out.extend_from_slice(literal);
    }
}
