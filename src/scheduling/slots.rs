use super::ScheduleError;

/// Hour-of-day slots for each supported calls-per-day count.
static SLOT_TABLE: [&[u32]; 4] = [
    &[9],
    &[9, 20],
    &[8, 14, 20],
    &[8, 12, 16, 20],
];

/// Map a calls-per-day count to its ordered call hours.
///
/// Counts outside 1..=4 are rejected rather than clamped, so a classifier
/// change that starts emitting new counts fails loudly here.
pub fn slots_for_count(calls_per_day: u32) -> Result<&'static [u32], ScheduleError> {
    match calls_per_day {
        1..=4 => Ok(SLOT_TABLE[(calls_per_day - 1) as usize]),
        other => Err(ScheduleError::InvalidArgument(format!(
            "unsupported calls per day: {other}"
        ))),
    }
}
