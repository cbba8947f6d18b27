use rust_decimal::Decimal;
use thiserror::Error;

/// Total number of digits a record value may carry.
pub const VALUE_MAX_DIGITS: u32 = 16;
/// Number of fractional digits a record value is stored with.
pub const VALUE_DECIMAL_PLACES: u32 = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error(
        "Ensure that there are no more than {} decimal places.",
        VALUE_DECIMAL_PLACES
    )]
    TooManyDecimalPlaces,

    #[error(
        "Ensure that there are no more than {} digits before the decimal point.",
        VALUE_MAX_DIGITS - VALUE_DECIMAL_PLACES
    )]
    TooManyWholeDigits,
}

/// Checks the precision of a record value and returns it with its storage scale.
///
/// Trailing zeros are not counted, so `1.50000` is accepted as `1.5000`.
pub fn normalize_record_value(value: Decimal) -> Result<Decimal, ValueError> {
    let mut value = value.normalize();
    if value.scale() > VALUE_DECIMAL_PLACES {
        return Err(ValueError::TooManyDecimalPlaces);
    }

    let whole_digits_limit = Decimal::from(10i64.pow(VALUE_MAX_DIGITS - VALUE_DECIMAL_PLACES));
    if value.abs().trunc() >= whole_digits_limit {
        return Err(ValueError::TooManyWholeDigits);
    }

    value.rescale(VALUE_DECIMAL_PLACES);
    Ok(value)
}
