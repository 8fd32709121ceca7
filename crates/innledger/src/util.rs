//! Identifier and timestamp helpers shared by every page-level consumer.

use rand::Rng;

/// A short unique record token: 8 lowercase hex characters.
#[must_use]
pub fn generate_id() -> String {
    format!("{:08x}", rand::thread_rng().r#gen::<u32>())
}

/// Today as `YYYY-MM-DD`.
#[must_use]
pub fn current_date() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Now as `YYYY-MM-DD HH:MM:SS`, the canonical record timestamp format.
#[must_use]
pub fn current_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_short_lowercase_hex() {
        for _ in 0..64 {
            let id = generate_id();
            assert_eq!(id.len(), 8);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_generated_ids_vary() {
        let a = generate_id();
        let b = generate_id();
        let c = generate_id();
        assert!(a != b || b != c);
    }

    #[test]
    fn test_date_and_timestamp_shapes() {
        let date = current_date();
        assert_eq!(date.len(), 10);
        assert_eq!(&date[4..5], "-");
        assert_eq!(&date[7..8], "-");

        let stamp = current_timestamp();
        assert_eq!(stamp.len(), 19);
        assert!(stamp.starts_with(&date));
        assert_eq!(&stamp[10..11], " ");
        assert_eq!(&stamp[13..14], ":");
    }
}
