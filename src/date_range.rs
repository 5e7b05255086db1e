// =============================================================================
// Date-Range Preset Resolver
// =============================================================================
//
// Maps a quick-range button to a concrete calendar window ending at the
// "as of" date. All offsets are calendar days; a start date landing on a
// weekend or holiday is fine, the price source simply returns the bars that
// exist inside the window.
// =============================================================================

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::LookupError;
use crate::types::{DateRange, RangePreset};

/// Earliest start date used by the MAX preset unless configured otherwise.
pub fn default_epoch_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

/// Resolve `preset` against `as_of` using the default MAX floor.
pub fn resolve_range(
    preset: RangePreset,
    as_of: NaiveDate,
    explicit: Option<DateRange>,
) -> DateRange {
    resolve_range_with_floor(preset, as_of, explicit, default_epoch_floor())
}

/// Resolve `preset` against `as_of`.
///
/// `Explicit` returns `explicit` untouched; no ordering check happens here
/// (see [`validate_range`]). `Explicit` without a range falls back to the
/// dashboard default, January 1st through `as_of`.
pub fn resolve_range_with_floor(
    preset: RangePreset,
    as_of: NaiveDate,
    explicit: Option<DateRange>,
    epoch_floor: NaiveDate,
) -> DateRange {
    let days_back = |days: i64| DateRange::new(as_of - Duration::days(days), as_of);

    match preset {
        RangePreset::Explicit => match explicit {
            Some(range) => range,
            None => year_to_date(as_of),
        },
        RangePreset::OneMonth => days_back(31),
        RangePreset::ThreeMonths => days_back(92),
        RangePreset::SixMonths => days_back(183),
        RangePreset::YearToDate => year_to_date(as_of),
        RangePreset::OneYear => days_back(365),
        RangePreset::ThreeYears => days_back(1095),
        RangePreset::Max => DateRange::new(epoch_floor, as_of),
    }
}

/// Caller-side check for explicit ranges.
pub fn validate_range(range: DateRange) -> Result<(), LookupError> {
    if range.start > range.end {
        return Err(LookupError::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }
    Ok(())
}

fn year_to_date(as_of: NaiveDate) -> DateRange {
    let jan_1 = NaiveDate::from_ymd_opt(as_of.year(), 1, 1).unwrap_or(as_of);
    DateRange::new(jan_1, as_of)
}
