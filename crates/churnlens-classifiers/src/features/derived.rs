/// Estimate cumulative charges from tenure and the current monthly charge.
///
/// This stands in for the billed history, so it is recomputed on every
/// request rather than read from stored data.
pub fn total_charges(tenure: u32, monthly_charges: f32) -> f32 {
    tenure as f32 * monthly_charges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_tenure_gives_zero() {
        assert_eq!(total_charges(0, 118.75), 0.0);
    }

    #[test]
    fn product_is_exact() {
        assert_eq!(total_charges(12, 70.0), 840.0);
        assert_eq!(total_charges(72, 19.85), 72.0 * 19.85f32);
    }
}
