use rand::RngCore;

/// A new access key: 16 random bytes, hex encoded.
pub fn random_access_key() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
