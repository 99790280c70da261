//! Order-total arithmetic for the checkout draft.
//!
//! These totals are only shown to the shopper while they check out. The
//! backend recomputes the authoritative amounts when the order is placed.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::price::{CurrencyCode, Price};

/// Shipping and tax rules applied to a cart subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRules {
    /// Flat shipping fee charged below the free-shipping threshold.
    pub shipping_flat_fee: Decimal,
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Decimal,
    /// Tax as a percentage of the subtotal (e.g. `18` for 18%).
    pub tax_rate_percent: Decimal,
    /// Currency all amounts are expressed in.
    pub currency_code: CurrencyCode,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            shipping_flat_fee: Decimal::from(49),
            free_shipping_threshold: Decimal::from(499),
            tax_rate_percent: Decimal::from(18),
            currency_code: CurrencyCode::INR,
        }
    }
}

/// Subtotal, shipping, tax and grand total of a draft order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Price,
    pub shipping: Price,
    pub tax: Price,
    pub total: Price,
}

impl OrderTotals {
    /// Compute totals for a subtotal.
    ///
    /// An empty cart (zero subtotal) costs nothing, including shipping.
    #[must_use]
    pub fn compute(subtotal: Decimal, rules: &PricingRules) -> Self {
        let currency = rules.currency_code;
        let subtotal = subtotal.max(Decimal::ZERO);

        let shipping = if subtotal.is_zero() || subtotal >= rules.free_shipping_threshold {
            Decimal::ZERO
        } else {
            rules.shipping_flat_fee
        };

        let tax = (subtotal * rules.tax_rate_percent / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        Self {
            subtotal: Price::new(subtotal, currency).rounded(),
            shipping: Price::new(shipping, currency).rounded(),
            tax: Price::new(tax, currency),
            total: Price::new(subtotal + shipping + tax, currency).rounded(),
        }
    }

    /// Whether shipping was waived.
    #[must_use]
    pub fn free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_charges_shipping() {
        let totals = OrderTotals::compute(Decimal::from(300), &PricingRules::default());
        assert_eq!(totals.shipping.amount, Decimal::from(49));
        assert_eq!(totals.tax.amount, Decimal::from(54));
        assert_eq!(totals.total.amount, Decimal::from(403));
        assert!(!totals.free_shipping());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let totals = OrderTotals::compute(Decimal::from(499), &PricingRules::default());
        assert!(totals.free_shipping());
        assert_eq!(totals.total.amount, Decimal::new(58_882, 2));
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 18% of 0.25 = 0.045 → 0.05
        let totals = OrderTotals::compute(Decimal::new(25, 2), &PricingRules::default());
        assert_eq!(totals.tax.amount, Decimal::new(5, 2));
    }

    #[test]
    fn test_empty_cart_costs_nothing() {
        let totals = OrderTotals::compute(Decimal::ZERO, &PricingRules::default());
        assert!(totals.total.is_zero());
        assert!(totals.shipping.is_zero());
    }
}
