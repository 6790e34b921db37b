use chrono::Utc;

// Time is behind a trait so that tests can run cycles against a fixed clock.
pub trait ISys: Send + Sync {
    /// Current UTC timestamp in millis
    fn get_timestamp_millis(&self) -> i64;
}

/// The real wall clock, used everywhere outside of tests
pub struct RealSys {}
impl ISys for RealSys {
    fn get_timestamp_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
