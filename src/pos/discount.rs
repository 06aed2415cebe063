use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountMode {
    #[default]
    Amount,
    Percent,
}

impl DiscountMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountMode::Amount => "amount",
            DiscountMode::Percent => "percent",
        }
    }
}

impl FromStr for DiscountMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "amount" => Ok(DiscountMode::Amount),
            "percent" => Ok(DiscountMode::Percent),
            other => Err(format!("unknown discount mode: {}", other)),
        }
    }
}

/// The discount as entered at the till.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Discount {
    pub mode: DiscountMode,
    pub value: Decimal,
}

impl Discount {
    /// Parses the till's discount inputs. A blank value clears the discount.
    pub fn parse(mode: DiscountMode, raw: &str) -> AppResult<Self> {
        let value = match raw.trim() {
            "" => Decimal::ZERO,
            raw => Decimal::from_str(raw).map_err(|_| AppError::validation("Discount must be a number"))?,
        };

        if value.is_sign_negative() && !value.is_zero() {
            return Err(AppError::validation("Discount cannot be negative"));
        }
        if mode == DiscountMode::Percent && value > Decimal::ONE_HUNDRED {
            return Err(AppError::validation("Percentage discount cannot exceed 100"));
        }

        Ok(Discount { mode, value })
    }

    pub fn apply_to(&self, subtotal: Decimal) -> Decimal {
        compute_discount(subtotal, self.mode, self.value)
    }
}

/// Discount in currency for a sale, always within `[0, subtotal]`.
///
/// Percentages above 100 count as 100 and are rounded to the paisa before
/// the cap is applied; a zero or negative value means no discount.
pub fn compute_discount(subtotal: Decimal, mode: DiscountMode, value: Decimal) -> Decimal {
    if value <= Decimal::ZERO || subtotal <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let raw = match mode {
        DiscountMode::Amount => value,
        DiscountMode::Percent => subtotal
            .checked_mul(value.min(Decimal::ONE_HUNDRED))
            .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
            .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
            .unwrap_or(subtotal),
    };

    raw.min(subtotal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percent_discount() {
        let d = compute_discount(Decimal::new(25, 0), DiscountMode::Percent, Decimal::new(10, 0));
        assert_eq!(d, Decimal::new(250, 2));
    }

    #[test]
    fn test_amount_discount_capped_at_subtotal() {
        let d = compute_discount(Decimal::new(25, 0), DiscountMode::Amount, Decimal::new(40, 0));
        assert_eq!(d, Decimal::new(25, 0));

        let d = compute_discount(Decimal::new(25, 0), DiscountMode::Percent, Decimal::new(150, 0));
        assert_eq!(d, Decimal::new(25, 0));
    }

    #[test]
    fn test_negative_value_is_no_discount() {
        let d = compute_discount(Decimal::new(25, 0), DiscountMode::Amount, Decimal::new(-5, 0));
        assert_eq!(d, Decimal::ZERO);
    }

    #[test]
    fn test_huge_percent_is_whole_subtotal() {
        let d = compute_discount(Decimal::new(25, 0), DiscountMode::Percent, Decimal::MAX);
        assert_eq!(d, Decimal::new(25, 0));

        let d = compute_discount(Decimal::MAX, DiscountMode::Percent, Decimal::new(50, 0));
        assert!(d <= Decimal::MAX);
    }

    #[test]
    fn test_parse_till_input() {
        assert_eq!(Discount::parse(DiscountMode::Amount, "  ").unwrap(), Discount::default());
        assert_eq!(
            Discount::parse(DiscountMode::Percent, "12.5").unwrap(),
            Discount {
                mode: DiscountMode::Percent,
                value: Decimal::new(125, 1),
            }
        );
        assert!(matches!(Discount::parse(DiscountMode::Amount, "ten"), Err(AppError::Validation(_))));
        assert!(matches!(Discount::parse(DiscountMode::Amount, "-5"), Err(AppError::Validation(_))));
        assert!(matches!(
            Discount::parse(DiscountMode::Percent, "79228162514264337593543950335"),
            Err(AppError::Validation(_))
        ));
        assert!(Discount::parse(DiscountMode::Amount, "79228162514264337593543950335").is_ok());
    }

    proptest! {
        #[test]
        fn discount_stays_within_subtotal_for_any_value(
            subtotal_paise in 0i64..10_000_000,
            lo in any::<u32>(),
            mid in any::<u32>(),
            hi in any::<u32>(),
            negative in any::<bool>(),
            scale in 0u32..=28,
            percent in any::<bool>(),
        ) {
            let subtotal = Decimal::new(subtotal_paise, 2);
            let value = Decimal::from_parts(lo, mid, hi, negative, scale);
            let mode = if percent { DiscountMode::Percent } else { DiscountMode::Amount };

            let discount = compute_discount(subtotal, mode, value);

            prop_assert!(discount >= Decimal::ZERO);
            prop_assert!(discount <= subtotal);
            if value <= Decimal::ZERO {
                prop_assert_eq!(discount, Decimal::ZERO);
            }
        }

        #[test]
        fn discount_stays_within_subtotal(
            subtotal_paise in 0i64..10_000_000,
            value_hundredths in -100_000i64..1_000_000,
            percent in any::<bool>(),
        ) {
            let subtotal = Decimal::new(subtotal_paise, 2);
            let value = Decimal::new(value_hundredths, 2);
            let mode = if percent { DiscountMode::Percent } else { DiscountMode::Amount };

            let discount = compute_discount(subtotal, mode, value);

            prop_assert!(discount >= Decimal::ZERO);
            prop_assert!(discount <= subtotal);
            if value < Decimal::ZERO {
                prop_assert_eq!(discount, Decimal::ZERO);
            }
        }
    }
}
