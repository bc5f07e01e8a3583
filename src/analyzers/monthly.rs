use crate::error::{ProcessingError, Result};
use crate::models::series::month_offset;
use crate::models::{DailySeries, MonthlyReduction, MonthlyValue};
use crate::utils::constants::{PERIOD_END_YEAR, PERIOD_MONTHS, PERIOD_START_YEAR};

/// Mean of the valid samples of every month, January 1978 to December 2016
pub fn monthly_means(series: &DailySeries) -> Vec<MonthlyValue> {
    monthly_aggregates(series, MonthlyReduction::Mean)
}

/// One value per calendar month of the period, always `PERIOD_MONTHS` long
///
/// A month without any valid daily sample is `None` rather than being
/// dropped, so the output stays aligned with the calendar.
pub fn monthly_aggregates(series: &DailySeries, reduction: MonthlyReduction) -> Vec<MonthlyValue> {
    let mut sums = vec![0.0f64; PERIOD_MONTHS];
    let mut counts = vec![0usize; PERIOD_MONTHS];

    for (date, value) in series.iter_dated() {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            let slot = month_offset(date);
            sums[slot] += v;
            counts[slot] += 1;
        }
    }

    (0..PERIOD_MONTHS)
        .map(|slot| {
            let value = match (counts[slot], reduction) {
                (0, _) => None,
                (n, MonthlyReduction::Mean) => Some(sums[slot] / n as f64),
                (_, MonthlyReduction::Sum) => Some(sums[slot]),
            };
            MonthlyValue {
                year: PERIOD_START_YEAR + (slot / 12) as i32,
                month: (slot % 12) as u32 + 1,
                value,
            }
        })
        .collect()
}

/// Twelve calendar-month normals averaged over `start_year..=end_year`
///
/// Months that are missing in some years are averaged over the years that
/// have them; a calendar month missing in every year is `None`.
pub fn monthly_climatology(
    monthly: &[MonthlyValue],
    start_year: i32,
    end_year: i32,
) -> Result<[Option<f64>; 12]> {
    check_year_window(start_year, end_year)?;

    let mut sums = [0.0f64; 12];
    let mut counts = [0usize; 12];

    for entry in monthly.iter().filter(|m| m.is_in_years(start_year, end_year)) {
        if let Some(v) = entry.value {
            let index = entry.month as usize - 1;
            sums[index] += v;
            counts[index] += 1;
        }
    }

    let mut normals = [None; 12];
    for (index, normal) in normals.iter_mut().enumerate() {
        if counts[index] > 0 {
            *normal = Some(sums[index] / counts[index] as f64);
        }
    }
    Ok(normals)
}

pub fn check_year_window(start_year: i32, end_year: i32) -> Result<()> {
    if start_year > end_year
        || start_year < PERIOD_START_YEAR
        || end_year > PERIOD_END_YEAR
    {
        return Err(ProcessingError::Config(format!(
            "Climatology years {}-{} must lie within {}-{}",
            start_year, end_year, PERIOD_START_YEAR, PERIOD_END_YEAR
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailySeries;
    use crate::utils::constants::{PERIOD_DAYS, PERIOD_START};
    use chrono::{Datelike, NaiveDate};

    fn series_from(f: impl Fn(NaiveDate) -> Option<f64>) -> DailySeries {
        let values = PERIOD_START.iter_days().take(PERIOD_DAYS).map(f).collect();
        DailySeries::from_values(values).unwrap()
    }

    #[test]
    fn test_always_468_chronological_entries() {
        for series in [DailySeries::empty(), series_from(|d| Some(d.day() as f64))] {
            let months = monthly_means(&series);
            assert_eq!(months.len(), 468);
            assert_eq!((months[0].year, months[0].month), (1978, 1));
            assert_eq!((months[467].year, months[467].month), (2016, 12));
            assert!(months
                .windows(2)
                .all(|w| (w[0].year, w[0].month) < (w[1].year, w[1].month)));
        }
    }

    #[test]
    fn test_single_first_day_sample() {
        let series = series_from(|d| (d == PERIOD_START).then_some(5.0));
        let months = monthly_means(&series);

        assert_eq!(months[0].value, Some(5.0));
        assert!(months[1..].iter().all(|m| m.value.is_none()));
        assert_eq!(months[1..].len(), 467);
    }

    #[test]
    fn test_mean_ignores_missing_days() {
        // Feb 1980 is a leap month: 29 days, only the 1st and 29th valid
        let series = series_from(|d| match (d.year(), d.month(), d.day()) {
            (1980, 2, 1) => Some(2.0),
            (1980, 2, 29) => Some(4.0),
            _ => None,
        });
        let months = monthly_means(&series);
        let feb_1980 = months
            .iter()
            .find(|m| m.year == 1980 && m.month == 2)
            .unwrap();

        assert_eq!(feb_1980.value, Some(3.0));
    }

    #[test]
    fn test_sum_reduction() {
        let series = series_from(|_| Some(1.0));
        let months = monthly_aggregates(&series, MonthlyReduction::Sum);

        assert_eq!(months[0].value, Some(31.0)); // January 1978
        assert_eq!(months[1].value, Some(28.0)); // February 1978
        assert_eq!(months[12 * 2 + 1].value, Some(29.0)); // February 1980
    }

    #[test]
    fn test_climatology_over_window() {
        let series = series_from(|d| Some(d.year() as f64 - 1900.0));
        let months = monthly_means(&series);
        let normals = monthly_climatology(&months, 1986, 2015).unwrap();

        // Mean of 86..=115
        assert!(normals.iter().all(|n| *n == Some(100.5)));
    }

    #[test]
    fn test_climatology_skips_missing_years() {
        let series = series_from(|d| (d.year() == 1990 && d.month() == 7).then_some(25.0));
        let normals = monthly_climatology(&monthly_means(&series), 1986, 2015).unwrap();

        assert_eq!(normals[6], Some(25.0));
        assert_eq!(normals[0], None);
    }

    #[test]
    fn test_climatology_rejects_years_outside_period() {
        let months = monthly_means(&DailySeries::empty());
        assert!(monthly_climatology(&months, 1970, 2000).is_err());
        assert!(monthly_climatology(&months, 2000, 2020).is_err());
        assert!(monthly_climatology(&months, 2000, 1990).is_err());
    }
}
