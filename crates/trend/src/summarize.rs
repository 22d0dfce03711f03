use common::{PricePoint, TrendSummary};

/// Find the extrema of a close series in one pass.
///
/// Returns `None` for an empty series. On equal prices the earlier date
/// wins — comparisons are strict, so the first occurrence is kept.
pub fn summarize(series: &[PricePoint]) -> Option<TrendSummary> {
    let first = series.first()?;
    let mut summary = TrendSummary {
        max_price: first.close,
        max_date: first.date,
        min_price: first.close,
        min_date: first.date,
    };

    for point in &series[1..] {
        if point.close > summary.max_price {
            summary.max_price = point.close;
            summary.max_date = point.date;
        }
        if point.close < summary.min_price {
            summary.min_price = point.close;
            summary.min_date = point.date;
        }
    }

    Some(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(day: u32, close: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2025, 4, day).unwrap(),
            close,
        }
    }

    #[test]
    fn empty_series_yields_none() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn single_point_is_both_extrema() {
        let summary = summarize(&[point(1, 100.0)]).unwrap();
        assert_eq!(summary.max_price, 100.0);
        assert_eq!(summary.min_price, 100.0);
        assert_eq!(summary.max_date, summary.min_date);
    }

    #[test]
    fn picks_extrema_by_price() {
        let series = [point(1, 90.0), point(2, 110.0), point(3, 85.0), point(4, 100.0)];
        let summary = summarize(&series).unwrap();
        assert_eq!(summary.max_price, 110.0);
        assert_eq!(summary.max_date, series[1].date);
        assert_eq!(summary.min_price, 85.0);
        assert_eq!(summary.min_date, series[2].date);
    }

    #[test]
    fn equal_maxima_report_the_earlier_date() {
        let series = [point(1, 100.0), point(2, 120.0), point(3, 120.0)];
        let summary = summarize(&series).unwrap();
        assert_eq!(summary.max_date, series[1].date);
    }

    #[test]
    fn equal_minima_report_the_earlier_date() {
        let series = [point(1, 80.0), point(2, 95.0), point(3, 80.0)];
        let summary = summarize(&series).unwrap();
        assert_eq!(summary.min_date, series[0].date);
    }
}
