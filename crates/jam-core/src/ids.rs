//! ID prefix constants and generation.
//!
//! Every entity carries a prefixed random hex ID, e.g. `jam-a3f8b2c1`
//! (prefix + dash + 8 hex chars). Randomness comes from the OS RNG so ID
//! generation needs no round-trip to the remote store.

/// Jam (event instance).
pub const PREFIX_JAM: &str = "jam";
/// Project (submission or general record).
pub const PREFIX_PROJECT: &str = "prj";
/// Team linkage row.
pub const PREFIX_TEAM: &str = "team";
/// Audit log entry.
pub const PREFIX_AUDIT: &str = "aud";

/// All known prefixes, for exhaustive format tests.
pub const ALL_PREFIXES: &[&str] = &[PREFIX_JAM, PREFIX_PROJECT, PREFIX_TEAM, PREFIX_AUDIT];

/// Generate a prefixed ID, e.g. `"prj-4be91c02"`.
///
/// # Panics
///
/// Panics if the OS RNG is unavailable.
#[must_use]
pub fn new_id(prefix: &str) -> String {
    let mut bytes = [0u8; 4];
    getrandom::fill(&mut bytes).expect("OS RNG should be available");
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{prefix}-{hex}")
}
