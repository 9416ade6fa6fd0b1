use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_micros(1), SimTime(1_000));
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(1), SimTime(1_000_000_000));
}

#[test]
fn sim_time_unit_conversions_saturate_on_overflow() {
    assert_eq!(SimTime::from_micros(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
}

#[test]
fn sim_time_reads_back_in_coarser_units() {
    let t = SimTime::from_micros(1_500);
    assert_eq!(t.as_micros(), 1_500);
    assert!((SimTime::from_millis(1_500).as_secs_f64() - 1.5).abs() < 1e-12);
    assert_eq!(t.saturating_sub(SimTime::from_millis(2)), SimTime::ZERO);
}
