//! Phone number canonicalization.
//!
//! Orders arrive with phones typed free-form on the site and confirmed via
//! chat contact sharing; both sides are reduced to one `+<digits>` form so
//! they can be matched.

/// Normalize a raw phone number to `+<digits>` international form.
///
/// Strips every character that is not a digit, replaces a leading legacy
/// domestic trunk `8` with the country code `7`, and prefixes `+`.
///
/// This is a pure string rewrite: malformed input produces a syntactically
/// plausible but semantically invalid number rather than an error.
/// Idempotent - normalizing an already-normalized number is a no-op.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.starts_with('8') {
        digits.replace_range(..1, "7");
    }

    format!("+{digits}")
}

/// Whether two raw phone numbers refer to the same canonical number.
///
/// Never panics; purely a comparison of normalized forms.
#[must_use]
pub fn phones_match(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}
