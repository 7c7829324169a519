//! Price and duration bucketing, and the composite price/industry/duration key.

use adpod_core::{AdPodSlot, PriceGranularity};

struct PriceRange {
    max: f64,
    increment: f64,
}

const LOW: &[PriceRange] = &[PriceRange { max: 5.0, increment: 0.5 }];
const MEDIUM: &[PriceRange] = &[PriceRange { max: 20.0, increment: 0.1 }];
const HIGH: &[PriceRange] = &[PriceRange { max: 20.0, increment: 0.01 }];
const AUTO: &[PriceRange] = &[
    PriceRange { max: 5.0, increment: 0.05 },
    PriceRange { max: 10.0, increment: 0.1 },
    PriceRange { max: 20.0, increment: 0.5 },
];
const DENSE: &[PriceRange] = &[
    PriceRange { max: 3.0, increment: 0.01 },
    PriceRange { max: 8.0, increment: 0.05 },
    PriceRange { max: 20.0, increment: 0.5 },
];

fn ranges(granularity: PriceGranularity) -> &'static [PriceRange] {
    match granularity {
        PriceGranularity::Low => LOW,
        PriceGranularity::Medium => MEDIUM,
        PriceGranularity::High => HIGH,
        PriceGranularity::Auto => AUTO,
        PriceGranularity::Dense => DENSE,
    }
}

/// Round a cpm down to its granularity bucket, formatted with two decimals.
/// Prices above the top range are capped at its max.
pub fn price_bucket(cpm: f64, granularity: PriceGranularity) -> String {
    if !cpm.is_finite() || cpm <= 0.0 {
        return "0.00".to_string();
    }
    let table = ranges(granularity);
    let Some(range) = table.iter().find(|r| cpm <= r.max) else {
        let cap = table.last().map(|r| r.max).unwrap_or(0.0);
        return format!("{cap:.2}");
    };
    // Epsilon keeps 15.0 / 0.1 from flooring to 149.
    let steps = (cpm / range.increment + 1e-9).floor();
    format!("{:.2}", steps * range.increment)
}

/// Duration bucket of a candidate that already fits `slot`.
///
/// Exact slots bucket to the duration itself. Otherwise the smallest declared
/// range value that covers the duration without exceeding capacity, falling
/// back to the duration itself.
pub fn duration_bucket(duration_seconds: i64, slot: &AdPodSlot) -> u32 {
    let duration = u32::try_from(duration_seconds.max(0)).unwrap_or(u32::MAX);
    if slot.require_exact_duration {
        return duration;
    }
    slot.duration_range_seconds
        .iter()
        .copied()
        .filter(|&r| r >= duration && r <= slot.total_duration_seconds)
        .min()
        .unwrap_or(duration)
}

/// `"<token>_<category>_<duration>s"`, or `"<token>_<duration>s"` without a category.
pub fn price_industry_duration_key(token: &str, category: Option<&str>, duration_bucket: u32) -> String {
    match category {
        Some(cat) if !cat.is_empty() => format!("{token}_{cat}_{duration_bucket}s"),
        _ => format!("{token}_{duration_bucket}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(range: Vec<u32>, exact: bool) -> AdPodSlot {
        AdPodSlot {
            ad_unit_code: "midroll_1".to_string(),
            total_duration_seconds: 60,
            duration_range_seconds: range,
            require_exact_duration: exact,
        }
    }

    #[test]
    fn test_medium_granularity() {
        assert_eq!(price_bucket(15.0, PriceGranularity::Medium), "15.00");
        assert_eq!(price_bucket(10.0, PriceGranularity::Medium), "10.00");
        assert_eq!(price_bucket(5.37, PriceGranularity::Medium), "5.30");
        assert_eq!(price_bucket(0.3, PriceGranularity::Medium), "0.30");
        assert_eq!(price_bucket(25.0, PriceGranularity::Medium), "20.00");
    }

    #[test]
    fn test_tiered_granularities() {
        assert_eq!(price_bucket(1.87, PriceGranularity::Low), "1.50");
        assert_eq!(price_bucket(1.87, PriceGranularity::High), "1.87");
        assert_eq!(price_bucket(4.12, PriceGranularity::Auto), "4.10");
        assert_eq!(price_bucket(7.77, PriceGranularity::Auto), "7.70");
        assert_eq!(price_bucket(12.3, PriceGranularity::Auto), "12.00");
        assert_eq!(price_bucket(2.57, PriceGranularity::Dense), "2.57");
        assert_eq!(price_bucket(6.33, PriceGranularity::Dense), "6.30");
        assert_eq!(price_bucket(8.0, PriceGranularity::Dense), "8.00");
    }

    #[test]
    fn test_non_positive_cpm() {
        assert_eq!(price_bucket(0.0, PriceGranularity::Medium), "0.00");
        assert_eq!(price_bucket(-3.0, PriceGranularity::Medium), "0.00");
        assert_eq!(price_bucket(f64::NAN, PriceGranularity::Medium), "0.00");
    }

    #[test]
    fn test_duration_rounds_up_into_range() {
        let s = slot(vec![15, 30], false);
        assert_eq!(duration_bucket(12, &s), 15);
        assert_eq!(duration_bucket(15, &s), 15);
        assert_eq!(duration_bucket(16, &s), 30);
        // Beyond the declared range but within capacity.
        assert_eq!(duration_bucket(45, &s), 45);
    }

    #[test]
    fn test_duration_exact_and_empty_range() {
        assert_eq!(duration_bucket(30, &slot(vec![15, 30], true)), 30);
        assert_eq!(duration_bucket(5, &slot(Vec::new(), false)), 5);
    }

    #[test]
    fn test_range_value_above_capacity_is_ignored() {
        let s = slot(vec![15, 90], false);
        assert_eq!(duration_bucket(40, &s), 40);
    }

    #[test]
    fn test_key_format() {
        assert_eq!(price_industry_duration_key("15.00", Some("395"), 30), "15.00_395_30s");
        assert_eq!(price_industry_duration_key("15.00", None, 30), "15.00_30s");
        assert_eq!(price_industry_duration_key("tier7", Some(""), 15), "tier7_15s");
    }
}
