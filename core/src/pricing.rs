// larder/src/pricing.rs

//! Money arithmetic. All amounts are `Decimal`s rounded to cents with
//! midpoint-away-from-zero rounding.

use rust_decimal::{Decimal, RoundingStrategy};

const CENTS: u32 = 2;
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

pub fn round_money(amount: Decimal) -> Decimal {
  amount.round_dp_with_strategy(CENTS, RoundingStrategy::MidpointAwayFromZero)
}

/// `quantity × unit_price`, rounded.
pub fn line_total(quantity: u32, unit_price: Decimal) -> Decimal {
  round_money(Decimal::from(quantity) * unit_price)
}

/// `percent`% of `amount`, rounded. `percent` is expected in 0..=100.
pub fn percentage_of(amount: Decimal, percent: Decimal) -> Decimal {
  round_money(amount * percent / HUNDRED)
}

/// Price after a standing promotional discount of `discount_percent`%.
pub fn discounted_price(price: Decimal, discount_percent: Decimal) -> Decimal {
  round_money(price - price * discount_percent / HUNDRED)
}

/// Sums already-rounded line totals and rounds the result.
pub fn sum_lines<I: IntoIterator<Item = Decimal>>(totals: I) -> Decimal {
  round_money(totals.into_iter().sum())
}

pub fn is_valid_percentage(percent: Decimal) -> bool {
  percent >= Decimal::ZERO && percent <= HUNDRED
}
