// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Common string patterns.

use regex::Regex;
use std::sync::LazyLock;

static UUID_V4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-f0-9]{8}-[a-f0-9]{4}-4[a-f0-9]{3}-[89aAbB][a-f0-9]{3}-[a-f0-9]{12}").unwrap()
});

/// Pattern matching lowercase UUID version 4 anywhere in text.
pub fn uuid_v4_regex() -> &'static Regex {
    &UUID_V4
}

/// Every UUID version 4 found in text, in order of appearance.
pub fn scan_uuid_v4(text: &str) -> Vec<&str> {
    UUID_V4.find_iter(text).map(|found| found.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("id=3f2b8c1e-9a4d-4e6f-8b2a-1c3d5e7f9a0b;", vec!["3f2b8c1e-9a4d-4e6f-8b2a-1c3d5e7f9a0b"]; "embedded")]
    #[test_case("3f2b8c1e-9a4d-1e6f-8b2a-1c3d5e7f9a0b", vec![]; "wrong version")]
    #[test_case("3f2b8c1e-9a4d-4e6f-7b2a-1c3d5e7f9a0b", vec![]; "wrong variant")]
    #[test_case(
        "00000000-0000-4000-a000-000000000000 11111111-1111-4111-B111-111111111111",
        vec!["00000000-0000-4000-a000-000000000000", "11111111-1111-4111-B111-111111111111"];
        "several"
    )]
    #[test]
    fn scan_for_uuid_v4(text: &str, expect: Vec<&str>) {
        pretty_assertions::assert_eq!(scan_uuid_v4(text), expect);
    }
}
