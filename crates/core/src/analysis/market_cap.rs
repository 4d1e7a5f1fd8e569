/// Tier ladder, largest first. Values below the last threshold pass through unscaled.
const TIERS: [(f64, &str); 3] = [
    (1e13, "Lakh Crore"),
    (1e11, "Thousand Crore"),
    (1e9, "Crore"),
];

pub fn format_market_cap(value: u64, currency: &str) -> String {
    let v = value as f64;
    for (threshold, label) in TIERS {
        if v >= threshold {
            let scaled = super::round_to(v / threshold, 2);
            return format!("{currency} {scaled:.2} {label}");
        }
    }
    format!("{currency} {value}")
}
