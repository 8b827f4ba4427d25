// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversions between phone numbers and protocol addresses.

const USER_SERVER: &str = "s.whatsapp.net";

/// Normalizes a destination into a protocol address.
///
/// Values that already carry a server part are returned unchanged; anything
/// else is reduced to its digits.
pub fn to_jid(destination: &str) -> String {
    let destination = destination.trim();
    if destination.contains('@') {
        return destination.to_string();
    }
    let digits: String = destination.chars().filter(char::is_ascii_digit).collect();
    format!("{digits}@{USER_SERVER}")
}

/// Extracts the phone number of an address, dropping any device suffix.
pub fn phone_from_jid(jid: &str) -> String {
    let user = jid.split('@').next().unwrap_or(jid);
    user.split(':').next().unwrap_or(user).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_numbers_become_user_addresses() {
        assert_eq!(to_jid("+55 (11) 99999-0000"), "5511999990000@s.whatsapp.net");
        assert_eq!(to_jid("5511999990000"), "5511999990000@s.whatsapp.net");
    }

    #[test]
    fn addresses_pass_through() {
        assert_eq!(to_jid("5511999990000@s.whatsapp.net"), "5511999990000@s.whatsapp.net");
        assert_eq!(to_jid("120363025@g.us"), "120363025@g.us");
    }

    #[test]
    fn device_suffix_is_dropped() {
        assert_eq!(phone_from_jid("5511999990000:12@s.whatsapp.net"), "5511999990000");
        assert_eq!(phone_from_jid("5511999990000@s.whatsapp.net"), "5511999990000");
        assert_eq!(phone_from_jid("5511999990000"), "5511999990000");
    }
}
