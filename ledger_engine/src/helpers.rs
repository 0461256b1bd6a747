//! Small helpers shared by the backends and the API.
use rand::RngCore;

/// The exchange cabinets that share balances. Admin key holders (e.g. `ADMIN 1`) are not cabinets.
pub const KNOWN_CABINETS: [&str; 6] =
    ["Кабінет 1 UA", "Кабінет 2 UA", "Кабінет 3 UA", "Кабінет 4 UA", "Кабінет 1 ARS", "Кабінет 2 ARS"];

pub fn known_cabinets() -> Vec<String> {
    KNOWN_CABINETS.iter().map(|s| s.to_string()).collect()
}

/// A fresh session token: 32 random bytes, hex encoded.
pub fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Maps the optional cabinet filter of the history queries. Missing, empty and `all` mean no filter.
pub fn cabinet_filter(cabinet: Option<&str>) -> Option<&str> {
    cabinet.map(str::trim).filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
}
