//! Delivery fee pricing.
//!
//! The fee is a pure function of distance and surge so the same inputs always
//! price the same. All amounts are integer cents (INR paise).

use serde::Serialize;

/// Flat charge applied to every delivery.
pub const BASE_FEE_CENTS: i64 = 2000;

/// Charge per kilometer of haversine distance.
pub const PER_KM_CENTS: i64 = 500;

/// Platform service charge added on top of the subtotal, paid by the receiver.
pub const PLATFORM_FEE_RATE: f64 = 0.10;

/// Volunteer's share of the subtotal.
pub const VOLUNTEER_SHARE: f64 = 0.90;

/// Surge applied when no demand signal says otherwise.
pub const DEFAULT_SURGE: f64 = 1.0;

/// Full price breakdown for one delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeBreakdown {
    pub base_fee_cents: i64,
    pub distance_fee_cents: i64,
    pub surge_multiplier: f64,
    pub subtotal_cents: i64,
    pub platform_fee_cents: i64,
    pub total_fee_cents: i64,
    pub volunteer_earning_cents: i64,
    pub platform_commission_cents: i64,
}

/// Price a delivery.
///
/// ```text
/// subtotal = round((base + distance_km * 500) * surge)
/// total    = subtotal + round(subtotal * 0.10)
/// ```
///
/// The subtotal is split 90/10 with the volunteer; the commission is computed
/// as `subtotal - earning`, so the two shares always sum to the subtotal no
/// matter how the rounding falls.
pub fn calculate_fee(distance_km: f64, surge_multiplier: f64) -> FeeBreakdown {
    let base_fee_cents = BASE_FEE_CENTS;
    let distance_fee_cents = (distance_km * PER_KM_CENTS as f64).round() as i64;

    let subtotal_cents =
        ((base_fee_cents + distance_fee_cents) as f64 * surge_multiplier).round() as i64;
    let platform_fee_cents = (subtotal_cents as f64 * PLATFORM_FEE_RATE).round() as i64;
    let total_fee_cents = subtotal_cents + platform_fee_cents;

    let volunteer_earning_cents = (subtotal_cents as f64 * VOLUNTEER_SHARE).round() as i64;
    let platform_commission_cents = subtotal_cents - volunteer_earning_cents;

    FeeBreakdown {
        base_fee_cents,
        distance_fee_cents,
        surge_multiplier,
        subtotal_cents,
        platform_fee_cents,
        total_fee_cents,
        volunteer_earning_cents,
        platform_commission_cents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_is_deterministic() {
        assert_eq!(calculate_fee(7.35, 1.0), calculate_fee(7.35, 1.0));
    }

    #[test]
    fn zero_distance_still_charges_the_base_fee() {
        let fee = calculate_fee(0.0, 1.0);
        assert_eq!(fee.distance_fee_cents, 0);
        assert_eq!(fee.subtotal_cents, BASE_FEE_CENTS);
        assert_eq!(fee.total_fee_cents, 2200);
    }

    #[test]
    fn surge_one_is_identity() {
        let fee = calculate_fee(4.0, 1.0);
        assert_eq!(
            fee.subtotal_cents,
            fee.base_fee_cents + fee.distance_fee_cents
        );
    }

    #[test]
    fn five_km_at_double_surge() {
        let fee = calculate_fee(5.0, 2.0);
        assert_eq!(fee.base_fee_cents, 2000);
        assert_eq!(fee.distance_fee_cents, 2500);
        assert_eq!(fee.subtotal_cents, 9000);
        assert_eq!(fee.platform_fee_cents, 900);
        assert_eq!(fee.total_fee_cents, 9900);
        assert_eq!(fee.volunteer_earning_cents, 8100);
        assert_eq!(fee.platform_commission_cents, 900);
    }

    #[test]
    fn shares_always_sum_to_subtotal() {
        for tenths in 0..500 {
            let distance = f64::from(tenths) / 10.0;
            for surge in [1.0, 1.15, 1.5, 2.0] {
                let fee = calculate_fee(distance, surge);
                assert_eq!(
                    fee.volunteer_earning_cents + fee.platform_commission_cents,
                    fee.subtotal_cents,
                    "split broke at {distance} km, surge {surge}"
                );
            }
        }
    }

    #[test]
    fn fee_grows_with_distance() {
        let mut last = calculate_fee(0.0, 1.0).total_fee_cents;
        for km in 1..30 {
            let fee = calculate_fee(f64::from(km), 1.0).total_fee_cents;
            assert!(fee > last);
            last = fee;
        }
    }

    #[test]
    fn fee_grows_with_surge() {
        let base = calculate_fee(3.0, 1.0).total_fee_cents;
        let surged = calculate_fee(3.0, 1.5).total_fee_cents;
        assert!(surged > base);
    }
}
