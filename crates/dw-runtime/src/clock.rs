use chrono::{Local, NaiveDate};

/// Wall-clock source. The engine never reads the clock any other way.
pub trait Clock: Send + Sync {
    /// Today's date in the local timezone.
    fn today(&self) -> NaiveDate;
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
