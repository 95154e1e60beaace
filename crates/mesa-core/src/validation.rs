//! # Validation Module
//!
//! Input validation utilities for Mesa POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Back-office UI (TypeScript)                                  │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (serde deserialization)                           │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (one open register, one open shift)            │
//! │  └── Foreign keys (products ──► categories ON DELETE CASCADE)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mesa_core::validation::{slugify, validate_restaurant_id, validate_quantity};
//!
//! let id = slugify("La Parrilla de Don José");
//! assert_eq!(id, "la-parrilla-de-don-jose");
//! validate_restaurant_id(&id).unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted restaurant slug.
pub const MAX_RESTAURANT_ID_LEN: usize = 64;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// Text Folding
// =============================================================================

/// Maps accented Latin letters to their ASCII base letter.
pub fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'Á' | 'À' | 'Ä' | 'Â' | 'Ã' => 'A',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}

/// Lowercases and folds accents. Used for every name comparison.
pub fn fold_lowercase(input: &str) -> String {
    input
        .chars()
        .map(fold_accent)
        .flat_map(char::to_lowercase)
        .collect()
}

/// Builds a restaurant id from its display name.
///
/// Runs of anything that is not an ASCII letter or digit collapse into a
/// single hyphen; leading and trailing hyphens are dropped.
///
/// ## Example
/// ```rust
/// use mesa_core::validation::slugify;
///
/// assert_eq!(slugify("  Café  Ñandú!! "), "cafe-nandu");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in fold_lowercase(name).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug.truncate(MAX_RESTAURANT_ID_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a tenant id.
///
/// ## Rules
/// - 1 to 64 characters
/// - Only lowercase ASCII letters, digits and hyphens
///
/// ## Example
/// ```rust
/// use mesa_core::validation::validate_restaurant_id;
///
/// assert!(validate_restaurant_id("la-parrilla").is_ok());
/// assert!(validate_restaurant_id("").is_err());
/// assert!(validate_restaurant_id("La Parrilla").is_err());
/// ```
pub fn validate_restaurant_id(id: &str) -> ValidationResult<()> {
    if id.is_empty() {
        return Err(ValidationError::required("restauranteId"));
    }

    if id.len() > MAX_RESTAURANT_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "restauranteId".to_string(),
            max: MAX_RESTAURANT_ID_LEN,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "restauranteId".to_string(),
            reason: "must contain only lowercase letters, numbers and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a required display name (restaurant, product, category, etc.).
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates the product name frozen on an order line.
#[inline]
pub fn validate_line_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name)
}

/// Validates a free-text reason on incomes, expenses and withdrawals.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    if reason.chars().count() > 500 {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: 500,
        });
    }
    Ok(())
}

/// Validates an email address.
///
/// Syntactic check only: one `@`, a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a new password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in centavos. Zero is allowed, up to [`MAX_PRICE_CENTS`].
///
/// ## Example
/// ```rust
/// use mesa_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(150_000).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a money amount for incomes, expenses, withdrawals and tenders.
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level. Stock is never negative.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
