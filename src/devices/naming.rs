//! Port name normalization
//!
//! Controllers usually expose "<name> IN" / "<name> OUT" port pairs; the
//! stripped name is what pairs them and what profiles are keyed by.

/// Strip every standalone `IN` / `OUT` token (any case) from a port name.
///
/// Tokens are split on whitespace and on `-`, `_`, `(`, `)`, so
/// "Launchpad X LPX MIDI In" and "Launchpad X (LPX MIDI Out)" both reduce
/// to "Launchpad X LPX MIDI" style names, while words that merely contain
/// the letters ("Pinball", "Outboard") are kept intact.
pub fn raw_name(port_name: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();

    for token in port_name.split(|c: char| c.is_whitespace() || matches!(c, '-' | '_' | '(' | ')')) {
        if token.is_empty() {
            continue;
        }
        if token.eq_ignore_ascii_case("in") || token.eq_ignore_ascii_case("out") {
            continue;
        }
        kept.push(token);
    }

    kept.join(" ")
}
