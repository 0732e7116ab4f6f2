use rand::Rng;
use sha2::{Digest, Sha256};

const SHORT_ID_ALPHABET: &[u8] = b"23456789abcdefghijkmnpqrstuvwxyz";
const PAYLOAD_TOKEN_LEN: usize = 8;
const RANDOM_TOKEN_LEN: usize = 4;

fn encode_base32_u64_prefix(value: u64, len: usize) -> String {
    let mut out = String::with_capacity(len);
    for i in 0..len {
        let shift = 64 - (i + 1) * 5;
        let idx = ((value >> shift) & 31) as usize;
        out.push(SHORT_ID_ALPHABET[idx] as char);
    }
    out
}

/// Short content token for an uploaded payload. Identical uploads share a
/// prefix, which makes re-submissions easy to spot in logs.
pub fn hash_payload(payload: &[u8]) -> String {
    let digest: [u8; 32] = Sha256::digest(payload).into();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    encode_base32_u64_prefix(u64::from_be_bytes(bytes), PAYLOAD_TOKEN_LEN)
}

pub fn make_short_random_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let idx = rng.gen_range(0..SHORT_ID_ALPHABET.len());
        out.push(SHORT_ID_ALPHABET[idx] as char);
    }
    out
}

/// Run identifier: `run-<content token>-<random token>`.
pub fn run_id(payload: &[u8]) -> String {
    format!(
        "run-{}-{}",
        hash_payload(payload),
        make_short_random_id(RANDOM_TOKEN_LEN)
    )
}

/// 1-based column number to spreadsheet letters (1 -> A, 27 -> AA).
pub fn column_letter(column: usize) -> String {
    let mut column = column;
    let mut name = String::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        name.insert(0, (b'A' + rem) as char);
        column = (column - 1) / 26;
    }
    name
}

pub fn cell_address(column: usize, row: usize) -> String {
    format!("{}{}", column_letter(column), row)
}
