use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use rand::Rng;
use sha2::{Digest, Sha256};

const SCHEME: &str = "sha256";
const ROUNDS: u32 = 10_000;
const SALT_LEN: usize = 16;
/// Stored hashes claiming more rounds than this are treated as corrupt.
const MAX_ROUNDS: u32 = ROUNDS * 10;

/// Hash a secret with a fresh random salt.
///
/// Output format: `sha256$<rounds>$<salt b64>$<digest b64>`.
pub fn hash_password(secret: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill(&mut salt);
    let digest = stretch(&salt, secret, ROUNDS);
    format!(
        "{SCHEME}${ROUNDS}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(digest)
    )
}

/// Check a secret against a stored hash. Malformed hashes never verify.
pub fn verify_password(secret: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    if rounds == 0 || rounds > MAX_ROUNDS {
        return false;
    }
    let (Ok(salt), Ok(expected)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(expected))
    else {
        return false;
    };
    constant_time_eq(&stretch(&salt, secret, rounds), &expected)
}

fn stretch(salt: &[u8], secret: &str, rounds: u32) -> Vec<u8> {
    let mut digest = Sha256::new()
        .chain_update(salt)
        .chain_update(secret.as_bytes())
        .finalize();
    for _ in 1..rounds {
        digest = Sha256::new()
            .chain_update(salt)
            .chain_update(digest)
            .finalize();
    }
    digest.to_vec()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
