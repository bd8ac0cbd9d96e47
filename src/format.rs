use rust_decimal::{Decimal, RoundingStrategy};

/// Round a money amount for report output.
///
/// Report tables print whole currency units, rounded half away from zero.
/// NAVs and unit counts keep their full precision; only the rendered
/// aggregates are rounded.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a percentage for report output (two decimal places, half away
/// from zero).
pub fn round_percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(1234.5)), dec!(1235));
        assert_eq!(round_money(dec!(1234.49)), dec!(1234));
        assert_eq!(round_money(dec!(-1234.5)), dec!(-1235));
    }

    #[test]
    fn test_round_percent_keeps_two_places() {
        assert_eq!(round_percent(dec!(33.333333)), dec!(33.33));
        assert_eq!(round_percent(dec!(33.335)), dec!(33.34));
        assert_eq!(round_percent(dec!(-0.005)), dec!(-0.01));
    }
}
