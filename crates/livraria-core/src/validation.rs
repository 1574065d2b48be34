//! ISBN check-digit validation.
//!
//! Single canonical implementation for both ISBN-10 and ISBN-13. Hyphens and
//! spaces are stripped before checking.

/// Strip separators commonly present in printed ISBNs.
fn normalize(isbn: &str) -> String {
    isbn.chars().filter(|c| *c != '-' && *c != ' ').collect()
}

/// Validate an ISBN-10. The final position may be the check character `X`
/// (value 10); every other position must be a digit.
pub fn is_valid_isbn10(isbn: &str) -> bool {
    let isbn = normalize(isbn);
    if isbn.len() != 10 {
        return false;
    }

    let mut sum: u32 = 0;
    for (i, c) in isbn.chars().enumerate() {
        let value = match c.to_digit(10) {
            Some(d) => d,
            None if i == 9 && (c == 'X' || c == 'x') => 10,
            None => return false,
        };
        sum += value * (10 - i as u32);
    }

    sum % 11 == 0
}

/// Validate an ISBN-13 (EAN-13 checksum, alternating weights 1 and 3).
pub fn is_valid_isbn13(isbn: &str) -> bool {
    let isbn = normalize(isbn);
    if isbn.len() != 13 {
        return false;
    }

    let mut sum: u32 = 0;
    for (i, c) in isbn.chars().enumerate() {
        let Some(d) = c.to_digit(10) else {
            return false;
        };
        sum += d * if i % 2 == 0 { 1 } else { 3 };
    }

    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn10_valid() {
        assert!(is_valid_isbn10("0306406152"));
        assert!(is_valid_isbn10("0-306-40615-2"));
        // Check character X
        assert!(is_valid_isbn10("097522980X"));
        assert!(is_valid_isbn10("097522980x"));
    }

    #[test]
    fn test_isbn10_invalid() {
        assert!(!is_valid_isbn10("0306406153"));
        assert!(!is_valid_isbn10("030640615"));
        assert!(!is_valid_isbn10("03064061521"));
        // X anywhere but the last position is invalid
        assert!(!is_valid_isbn10("0X06406152"));
        assert!(!is_valid_isbn10("abcdefghij"));
    }

    #[test]
    fn test_isbn13_valid() {
        assert!(is_valid_isbn13("9780306406157"));
        assert!(is_valid_isbn13("978-0-306-40615-7"));
        assert!(is_valid_isbn13("9780131103627"));
    }

    #[test]
    fn test_isbn13_invalid() {
        assert!(!is_valid_isbn13("9780306406158"));
        assert!(!is_valid_isbn13("978030640615"));
        assert!(!is_valid_isbn13("97803064061577"));
        assert!(!is_valid_isbn13("978030640615X"));
    }
}
