//! Form rules applied before a mutation is sent.

use crate::entity::{AuthorId, BookId};
use crate::error::{BooksResult, ValidationError};

/// Shown when the first name is empty or has a space.
pub const FIRST_NAME_MESSAGE: &str = "Provided first name must not have spaces";
/// Shown when the last name is empty or has a space.
pub const LAST_NAME_MESSAGE: &str = "Provided last name must not have spaces";
/// Shown when a book title is empty.
pub const TITLE_MESSAGE: &str = "Provided title must not be empty";

fn is_single_word(name: &str) -> bool {
    !name.is_empty() && !name.contains(' ')
}

/// Check an author's names.
///
/// Each name must be non-empty and free of spaces. Every violated rule is
/// reported, in form order.
///
/// # Errors
/// `ValidationError::Form` listing each failing rule.
pub fn validate_author_names(first_name: &str, last_name: &str) -> Result<(), ValidationError> {
    let mut messages = Vec::new();
    if !is_single_word(first_name) {
        messages.push(FIRST_NAME_MESSAGE.to_string());
    }
    if !is_single_word(last_name) {
        messages.push(LAST_NAME_MESSAGE.to_string());
    }
    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Form { messages })
    }
}

/// Check a book title.
///
/// # Errors
/// `ValidationError::Form` when the title is empty.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(ValidationError::Form {
            messages: vec![TITLE_MESSAGE.to_string()],
        });
    }
    Ok(())
}

/// Parse an author id (`a:<n>`).
///
/// # Errors
/// `ValidationError::InvalidId` for anything else.
pub fn parse_author_id(raw: &str) -> BooksResult<AuthorId> {
    Ok(raw.parse()?)
}

/// Parse a book id (`b:<n>`).
///
/// # Errors
/// `ValidationError::InvalidId` for anything else.
pub fn parse_book_id(raw: &str) -> BooksResult<BookId> {
    Ok(raw.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn both_rules_are_reported() {
        let err = validate_author_names("Mary Ann", "").unwrap_err();
        assert_eq!(
            err,
            ValidationError::Form {
                messages: vec![FIRST_NAME_MESSAGE.to_string(), LAST_NAME_MESSAGE.to_string()],
            }
        );
        assert!(validate_author_names("Mary", "Shelley").is_ok());
    }

    #[test]
    fn title_must_not_be_empty() {
        assert!(validate_title("").is_err());
        assert!(validate_title("Frankenstein").is_ok());
    }

    #[test]
    fn ids_follow_their_prefix() {
        assert_eq!(parse_author_id("a:12").unwrap(), AuthorId::from_sequence(12));
        assert!(parse_author_id("b:12").unwrap_err().is_validation());
        assert!(parse_book_id("b:").is_err());
        assert!(parse_book_id(" b:1").is_err());
    }

    proptest! {
        #[test]
        fn names_with_a_space_are_always_rejected(a in "[A-Za-z]{0,8}", b in "[A-Za-z]{0,8}") {
            let name = format!("{a} {b}");
            prop_assert!(validate_author_names(&name, "Valid").is_err());
        }

        #[test]
        fn single_words_are_accepted(first in "[A-Za-z]{1,12}", last in "[A-Za-z'-]{1,12}") {
            prop_assert!(validate_author_names(&first, &last).is_ok());
        }

        #[test]
        fn author_ids_roundtrip(n in any::<u64>()) {
            let id = AuthorId::from_sequence(n);
            prop_assert_eq!(parse_author_id(&id.to_string()).unwrap(), id);
        }
    }
}
