use std::fmt::Display;

use crate::{DomainError, DomainResult};

/// Fails unless `value` has between `min` and `max` characters, inclusive.
pub fn check_length(subject: &str, value: &str, min: usize, max: usize) -> DomainResult<()> {
    let length = value.chars().count();

    if length < min || length > max {
        return Err(DomainError::Validation(format!(
            "{subject} length must be between {min} and {max}"
        )));
    }

    Ok(())
}

/// Fails if `value` has more than `max` characters.
pub fn check_max_length(subject: &str, value: &str, max: usize) -> DomainResult<()> {
    if value.chars().count() > max {
        return Err(DomainError::Validation(format!(
            "{subject} length must be at most {max}"
        )));
    }

    Ok(())
}

/// Fails unless `min <= value <= max`.
pub fn check_range<T>(subject: &str, value: T, min: T, max: T) -> DomainResult<()>
where
    T: PartialOrd + Display,
{
    if value < min || value > max {
        return Err(DomainError::Validation(format!(
            "{subject} must be between {min} and {max}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::{check_length, check_max_length, check_range};

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(check_length("name", "로드맵", 1, 3).is_ok());
        assert!(check_length("name", "", 1, 3).is_err());
        assert!(check_max_length("body", "abcd", 3).is_err());
    }

    #[test]
    fn range_is_inclusive() {
        assert!(check_range("period", 0, 0, 1000).is_ok());
        assert!(check_range("period", 1000, 0, 1000).is_ok());

        let error = check_range("period", -1, 0, 1000).unwrap_err();
        assert_eq!(error.to_string(), "period must be between 0 and 1000");
    }
}
