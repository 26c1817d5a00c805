use crate::utils::error::{Result, SigepError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(SigepError::configuration(field_name, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(SigepError::configuration(
                field_name,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(SigepError::configuration(
            field_name,
            format!("Invalid URL format: {}", e),
        )),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SigepError::validation(
            field_name,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(SigepError::validation(
            field_name,
            format!("Value {} must be between {} and {}", value, min, max),
        ));
    }
    Ok(())
}

pub fn validate_measure(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SigepError::validation(
            field_name,
            format!("Value {} must be a finite, non-negative number", value),
        ));
    }
    Ok(())
}

/// Strips everything but ASCII digits and checks the remaining length.
pub fn digits_only(field_name: &str, value: &str, min_len: usize, max_len: usize) -> Result<String> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    let stray = value
        .chars()
        .any(|c| !(c.is_ascii_digit() || " ()-.+/".contains(c)));
    if stray || digits.len() < min_len || digits.len() > max_len {
        return Err(SigepError::validation(
            field_name,
            format!(
                "'{}' must contain between {} and {} digits",
                value, min_len, max_len
            ),
        ));
    }
    Ok(digits)
}
