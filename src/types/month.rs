use chrono::Datelike;
use std::fmt;
use std::fmt::{Display, Formatter};

/// A calendar month, 1 (January) through 12 (December).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct CalendarMonth(u32);

impl CalendarMonth {
    pub const COUNT: usize = 12;

    pub fn new(month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self(month))
    }

    /// The calendar month of a chrono date or datetime.
    pub fn of(date: &impl Datelike) -> Self {
        Self(date.month())
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Zero-based position of the month, 0 for January.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// All twelve months in calendar order.
    pub fn all() -> impl Iterator<Item = CalendarMonth> {
        (1..=12).map(CalendarMonth)
    }
}

impl Display for CalendarMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}
