use rand::Rng;

/// Length of a generated team code.
pub const TEAM_CODE_LEN: usize = 6;

// Uppercase alphanumerics minus the lookalikes (I/O/0/1) — codes get read
// aloud between players.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generates a short team code identifying one waiting room.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..TEAM_CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
