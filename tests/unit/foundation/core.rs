use super::*;

#[test]
fn duration_rejects_out_of_range() {
    assert!(TransitionDuration::new(49).is_err());
    assert!(TransitionDuration::new(20_001).is_err());
    assert_eq!(TransitionDuration::new(50).unwrap().as_millis(), 50);
    assert_eq!(TransitionDuration::new(20_000).unwrap().as_millis(), 20_000);
}

#[test]
fn duration_clamps_loaded_values() {
    assert_eq!(TransitionDuration::clamped(0).as_millis(), 50);
    assert_eq!(TransitionDuration::clamped(-7).as_millis(), 50);
    assert_eq!(TransitionDuration::clamped(999_999).as_millis(), 20_000);
    assert_eq!(TransitionDuration::clamped(1234).as_millis(), 1234);
    assert_eq!(TransitionDuration::default().as_millis(), 300);
}

#[test]
fn override_duration_is_not_bounded() {
    let d = TransitionDuration::unbounded(10);
    assert_eq!(d.as_duration(), std::time::Duration::from_millis(10));
}

#[test]
fn role_parsing() {
    assert_eq!("Show".parse::<TransitionRole>().unwrap(), TransitionRole::Show);
    assert_eq!(" hide ".parse::<TransitionRole>().unwrap(), TransitionRole::Hide);
    assert!("fade".parse::<TransitionRole>().is_err());

    assert_eq!(TransitionRole::from_request("Hide"), TransitionRole::Hide);
    assert_eq!(TransitionRole::from_request("whatever"), TransitionRole::Match);
    assert_eq!(TransitionRole::from_request(""), TransitionRole::Match);
}
