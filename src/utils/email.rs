use crate::error::{AppError, AppResult};
use regex::Regex;

/// 验证邮箱格式
pub fn validate_email(email: &str) -> AppResult<()> {
    let email_regex = Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();

    if email.len() > 255 || !email_regex.is_match(email) {
        return Err(AppError::ValidationError("邮箱格式无效".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("fan@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.io").is_ok());
        assert!(validate_email("no-at-sign.example.com").is_err());
        assert!(validate_email("spaces in@example.com").is_err());
        assert!(validate_email("missing@tld").is_err());
    }
}
