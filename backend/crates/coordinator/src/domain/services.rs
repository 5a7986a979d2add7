//! Domain Services
//!
//! Pure validation and file-format logic. Nothing here touches storage.

use crate::domain::value_objects::{ID0_LEN, Id0, LFCS_LEN, Lfcs};
use platform::crypto::{from_hex, sha1, sha256, to_hex};

/// Largest representable friend code (40 bits)
pub const FRIEND_CODE_MAX: u64 = 0x7F_FFFF_FFFF;

/// Friend code of the bot account itself
pub const BOT_FRIEND_CODE: u64 = 27_599_290_078;

/// Size of an exported movable_part1.sed
pub const PART1_FILE_LEN: usize = 0x1000;

/// Size of a stored movable.sed
pub const MOVABLE_LEN: usize = 0x140;

/// Size of a movable.sed without its trailing MAC
pub const MOVABLE_SHORT_LEN: usize = 0x120;

/// Key region hashed to derive the id0
const MOVABLE_KEY_RANGE: std::ops::Range<usize> = 0x110..0x11F;

/// Exactly 32 hexadecimal characters
pub fn is_valid_id0(raw: &str) -> bool {
    raw.len() == ID0_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Verify the checksum embedded in a friend code
///
/// The low 32 bits are the principal id; bits 32..40 must equal the first
/// byte of `SHA1(LE32(principal))` shifted right by one.
///
/// ```rust
/// use coordinator::domain::services::verify_friend_code;
///
/// assert!(verify_friend_code(309_237_645_312));
/// assert!(!verify_friend_code(309_237_645_313));
/// ```
pub fn verify_friend_code(code: u64) -> bool {
    if code > FRIEND_CODE_MAX || code == BOT_FRIEND_CODE {
        return false;
    }

    let principal = (code & 0xFFFF_FFFF) as u32;
    let checksum = ((code >> 32) & 0xFF) as u8;

    sha1(&principal.to_le_bytes())[0] >> 1 == checksum
}

/// Guess whether a submitted identifier is really an id1 (SD card CID)
///
/// The 16 bytes are read as eight 2-byte chunks, the chunk order is
/// reversed, each chunk is byte-swapped and the chunks are permuted into CID
/// order. The result looks like a CID when its last byte is zero and its
/// second byte is 0 or 1.
///
/// Undecodable input reports `true`.
pub fn detect_id1_heuristic(id: &str) -> bool {
    let bytes = match from_hex(id) {
        Ok(bytes) if bytes.len() == ID0_LEN / 2 => bytes,
        _ => return true,
    };

    let mut chunks = [[0u8; 2]; 8];
    for (i, chunk) in bytes.chunks_exact(2).enumerate() {
        // reverse order, swap bytes
        chunks[7 - i] = [chunk[1], chunk[0]];
    }

    const CID_ORDER: [usize; 8] = [6, 7, 4, 5, 2, 3, 0, 1];
    let cid: Vec<u8> = CID_ORDER.iter().flat_map(|&i| chunks[i]).collect();

    cid[15] == 0x00 && (cid[1] == 0x00 || cid[1] == 0x01)
}

/// id0 implied by a movable.sed: lowercase hex of the first 16 bytes of
/// `SHA256(movable[0x110..0x11F])`
pub fn expected_id0(movable: &[u8]) -> Option<String> {
    let key = movable.get(MOVABLE_KEY_RANGE)?;
    Some(to_hex(&sha256(key)[..16]))
}

/// Accepted upload sizes for movable.sed
pub fn is_valid_movable_len(len: usize) -> bool {
    len == MOVABLE_SHORT_LEN || len == MOVABLE_LEN
}

/// Zero-pad a movable.sed to the stored size
pub fn pad_movable(movable: &[u8]) -> Vec<u8> {
    let mut padded = vec![0u8; MOVABLE_LEN];
    let len = movable.len().min(MOVABLE_LEN);
    padded[..len].copy_from_slice(&movable[..len]);
    padded
}

/// Build movable_part1.sed: the LFCS byte-reversed, 8 zero bytes, the ASCII
/// id0, zero padding up to 0x1000 bytes
pub fn part1_file(lfcs: &Lfcs, id0: &Id0) -> Vec<u8> {
    let mut file = vec![0u8; PART1_FILE_LEN];

    let mut seed = *lfcs.as_bytes();
    seed.reverse();
    file[..LFCS_LEN].copy_from_slice(&seed);

    let id_start = LFCS_LEN * 2;
    file[id_start..id_start + ID0_LEN].copy_from_slice(id0.as_str().as_bytes());

    file
}
