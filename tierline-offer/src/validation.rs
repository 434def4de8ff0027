pub const MAX_NAME_LENGTH: usize = 40;
pub const MAX_CODE_LENGTH: usize = 191;
pub const MAX_DISPLAY_LENGTH: usize = 191;
pub const MAX_DURATION_MONTHS: u32 = 120;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Offer-related errors
#[derive(Debug, thiserror::Error)]
pub enum OfferError {
    #[error("Invalid offer name: {0}")]
    InvalidName(String),

    #[error("Invalid offer code: {0}")]
    InvalidCode(String),

    #[error("Invalid display title: {0}")]
    InvalidDisplayTitle(String),

    #[error("Invalid display description: {0}")]
    InvalidDisplayDescription(String),

    #[error("Invalid offer amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Unknown {kind} value: {value}")]
    UnknownValue { kind: &'static str, value: String },

    #[error("Offer name already in use: {0}")]
    NameNotUnique(String),

    #[error("Offer code already in use: {0}")]
    CodeNotUnique(String),

    #[error("Offer already has Stripe coupon {0}")]
    CouponAlreadyAttached(String),

    #[error("Uniqueness check failed: {0}")]
    UniquenessCheck(#[source] BoxError),
}

pub fn validate_name(name: &str) -> Result<String, OfferError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OfferError::InvalidName("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(OfferError::InvalidName(format!(
            "must be at most {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

pub fn validate_code(code: &str) -> Result<String, OfferError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(OfferError::InvalidCode("code is required".to_string()));
    }
    if code.chars().count() > MAX_CODE_LENGTH {
        return Err(OfferError::InvalidCode(format!(
            "must be at most {} characters",
            MAX_CODE_LENGTH
        )));
    }
    if code.chars().any(char::is_whitespace) {
        return Err(OfferError::InvalidCode(format!("'{}' contains whitespace", code)));
    }
    Ok(code.to_string())
}

pub fn validate_display_title(title: &str) -> Result<String, OfferError> {
    if title.chars().count() > MAX_DISPLAY_LENGTH {
        return Err(OfferError::InvalidDisplayTitle(format!(
            "must be at most {} characters",
            MAX_DISPLAY_LENGTH
        )));
    }
    Ok(title.to_string())
}

pub fn validate_display_description(description: &str) -> Result<String, OfferError> {
    if description.chars().count() > MAX_DISPLAY_LENGTH {
        return Err(OfferError::InvalidDisplayDescription(format!(
            "must be at most {} characters",
            MAX_DISPLAY_LENGTH
        )));
    }
    Ok(description.to_string())
}

/// Three-letter ISO 4217 code. Case is preserved as given.
pub fn validate_currency(currency: &str) -> Result<String, OfferError> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(OfferError::InvalidCurrency(currency.to_string()));
    }
    Ok(currency.to_string())
}
