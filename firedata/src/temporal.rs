//! Découpage temporel: jours civils et semaines ISO
//!
//! Les comparaisons "aujourd'hui / hier" se font dans un fuseau de
//! référence fixe (celui de la juridiction source). Le début de semaine,
//! lui, est calculé sur la date calendaire UTC: un instant peut donc tomber
//! un dimanche dans le fuseau de référence et compter pour la semaine UTC
//! suivante. Ce décalage est conservé tel quel pour ne pas modifier les
//! séries historiques.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FireError;

/// Millisecondes dans un jour UTC
pub const DAY_MS: i64 = 86_400_000;

/// Millisecondes dans une semaine
pub const WEEK_MS: i64 = 7 * DAY_MS;

/// Semaines retenues de part et d'autre de la semaine courante (~50 ans)
pub const MAX_SERIES_WEEKS: i64 = 2_600;

/// Date civile dans un fuseau donné
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DayKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DayKey {
    fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }

    fn to_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// Résout un identifiant IANA (ex: `America/Moncton`)
pub fn parse_time_zone(name: &str) -> Result<Tz, FireError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| FireError::UnknownTimeZone(name.to_string()))
}

fn civil_date(epoch_ms: i64, tz: Tz) -> Option<NaiveDate> {
    let utc = DateTime::<Utc>::from_timestamp_millis(epoch_ms)?;
    Some(utc.with_timezone(&tz).date_naive())
}

/// Date civile de l'instant dans le fuseau `tz`
pub fn day_key(epoch_ms: i64, tz: Tz) -> Option<DayKey> {
    civil_date(epoch_ms, tz).map(DayKey::from_date)
}

pub fn is_same_civil_day(a_ms: i64, b_ms: i64, tz: Tz) -> bool {
    match (day_key(a_ms, tz), day_key(b_ms, tz)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Vrai si `epoch_ms` tombe le même jour civil que `now_ms` dans `tz`
pub fn is_today(epoch_ms: i64, now_ms: i64, tz: Tz) -> bool {
    is_same_civil_day(epoch_ms, now_ms, tz)
}

/// Vrai si `epoch_ms` tombe exactement un jour civil avant `now_ms` dans `tz`
pub fn is_yesterday(epoch_ms: i64, now_ms: i64, tz: Tz) -> bool {
    let yesterday = day_key(now_ms, tz)
        .and_then(DayKey::to_date)
        .and_then(|today| today.pred_opt());
    match (yesterday, civil_date(epoch_ms, tz)) {
        (Some(y), Some(d)) => y == d,
        _ => false,
    }
}

/// Minuit UTC du lundi de la semaine contenant la date calendaire UTC de l'instant
pub fn iso_week_start_utc(epoch_ms: i64) -> i64 {
    let days = epoch_ms.div_euclid(DAY_MS);
    // 1970-01-01 était un jeudi
    let since_monday = (days + 3).rem_euclid(7);
    (days - since_monday).saturating_mul(DAY_MS)
}

/// Série hebdomadaire sans trou (nouveaux / éteints / actifs)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySeries {
    pub week_starts: Vec<i64>,
    pub new_counts: Vec<u32>,
    pub out_counts: Vec<u32>,
    pub active_counts: Vec<u32>,
}

impl WeeklySeries {
    pub fn len(&self) -> usize {
        self.week_starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.week_starts.is_empty()
    }
}

fn bucket_by_week(timestamps: &[i64], first_week: i64, last_week: i64) -> BTreeMap<i64, u32> {
    let mut buckets = BTreeMap::new();
    for &ts in timestamps {
        let week = iso_week_start_utc(ts);
        if week < first_week || week > last_week {
            debug!(timestamp = ts, "Timestamp outside the trend window, ignored");
            continue;
        }
        *buckets.entry(week).or_insert(0) += 1;
    }
    buckets
}

/// Construit la série hebdomadaire
///
/// Parcourt chaque semaine de la plus ancienne semaine observée jusqu'à la
/// plus tardive entre la dernière semaine observée et la semaine de
/// `now_ms`, y compris les semaines sans événement. Le nombre d'actifs part
/// de 0 et ne descend jamais sous 0.
///
/// Les instants à plus de `MAX_SERIES_WEEKS` semaines de la semaine de
/// `now_ms` sont ignorés: la série compte au plus `2 * MAX_SERIES_WEEKS + 1`
/// semaines.
pub fn build_weekly_series(detections: &[i64], extinguishes: &[i64], now_ms: i64) -> WeeklySeries {
    let current_week = iso_week_start_utc(now_ms);
    let span = MAX_SERIES_WEEKS * WEEK_MS;
    let first_week = current_week.saturating_sub(span);
    let last_week = current_week.saturating_add(span);

    let new_buckets = bucket_by_week(detections, first_week, last_week);
    let out_buckets = bucket_by_week(extinguishes, first_week, last_week);

    let first = new_buckets.keys().chain(out_buckets.keys()).min().copied();
    let last = new_buckets.keys().chain(out_buckets.keys()).max().copied();
    let (Some(first), Some(last)) = (first, last) else {
        return WeeklySeries::default();
    };
    let end = last.max(current_week);

    let mut series = WeeklySeries::default();
    let mut active: i64 = 0;
    let mut week = first;
    while week <= end {
        let new = new_buckets.get(&week).copied().unwrap_or(0);
        let out = out_buckets.get(&week).copied().unwrap_or(0);
        active = (active + i64::from(new) - i64::from(out)).max(0);

        series.week_starts.push(week);
        series.new_counts.push(new);
        series.out_counts.push(out);
        series.active_counts.push(active as u32);
        week = match week.checked_add(WEEK_MS) {
            Some(next) => next,
            None => break,
        };
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MONCTON: Tz = chrono_tz::America::Moncton;

    fn utc_ms(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_parse_time_zone() {
        assert_eq!(parse_time_zone("America/Moncton").unwrap(), MONCTON);
        assert!(matches!(
            parse_time_zone("Atlantic/Nowhere"),
            Err(FireError::UnknownTimeZone(_))
        ));
    }

    #[test]
    fn test_day_key_in_zone() {
        // 02:30 UTC le 15 juillet = 23:30 ADT le 14 juillet
        let ms = utc_ms(2024, 7, 15, 2, 30);
        assert_eq!(
            day_key(ms, MONCTON),
            Some(DayKey { year: 2024, month: 7, day: 14 })
        );
        assert_eq!(
            day_key(ms, chrono_tz::UTC),
            Some(DayKey { year: 2024, month: 7, day: 15 })
        );
    }

    #[test]
    fn test_today_and_yesterday() {
        let now = utc_ms(2024, 7, 15, 15, 0);
        assert!(is_today(utc_ms(2024, 7, 15, 4, 0), now, MONCTON));
        // 03:00 UTC = 00:00 ADT le 15: encore aujourd'hui
        assert!(is_today(utc_ms(2024, 7, 15, 3, 0), now, MONCTON));
        // 02:59 UTC = 23:59 ADT le 14: hier
        assert!(is_yesterday(utc_ms(2024, 7, 15, 2, 59), now, MONCTON));
        assert!(!is_today(utc_ms(2024, 7, 15, 2, 59), now, MONCTON));
        assert!(!is_yesterday(utc_ms(2024, 7, 13, 12, 0), now, MONCTON));
    }

    #[test]
    fn test_yesterday_across_month_boundary() {
        let now = utc_ms(2024, 8, 1, 12, 0);
        assert!(is_yesterday(utc_ms(2024, 7, 31, 12, 0), now, MONCTON));
    }

    #[test]
    fn test_iso_week_start() {
        // Mercredi 17 juillet 2024 -> lundi 15 juillet
        assert_eq!(
            iso_week_start_utc(utc_ms(2024, 7, 17, 18, 45)),
            utc_ms(2024, 7, 15, 0, 0)
        );
        // Un lundi reste son propre début de semaine
        assert_eq!(
            iso_week_start_utc(utc_ms(2024, 7, 15, 0, 0)),
            utc_ms(2024, 7, 15, 0, 0)
        );
        // Dimanche -> lundi précédent
        assert_eq!(
            iso_week_start_utc(utc_ms(2024, 7, 21, 23, 59)),
            utc_ms(2024, 7, 15, 0, 0)
        );
        // Jeudi 1er janvier 1970 -> lundi 29 décembre 1969
        assert_eq!(iso_week_start_utc(0), utc_ms(1969, 12, 29, 0, 0));
    }

    #[test]
    fn test_week_start_uses_utc_date_not_zone_date() {
        // Dimanche 21 juillet 22:00 ADT = lundi 22 juillet 01:00 UTC
        let ms = utc_ms(2024, 7, 22, 1, 0);
        assert_eq!(
            day_key(ms, MONCTON),
            Some(DayKey { year: 2024, month: 7, day: 21 })
        );
        // La semaine retenue est celle du lundi UTC, pas celle du dimanche local
        assert_eq!(iso_week_start_utc(ms), utc_ms(2024, 7, 22, 0, 0));
    }

    #[test]
    fn test_empty_series() {
        let series = build_weekly_series(&[], &[], utc_ms(2024, 7, 15, 0, 0));
        assert!(series.is_empty());
        assert!(series.new_counts.is_empty());
        assert!(series.out_counts.is_empty());
        assert!(series.active_counts.is_empty());
    }

    #[test]
    fn test_series_is_gapless_until_now() {
        let detections = [utc_ms(2024, 7, 1, 10, 0), utc_ms(2024, 7, 2, 10, 0)];
        let extinguishes = [utc_ms(2024, 7, 16, 10, 0)];
        let now = utc_ms(2024, 7, 31, 12, 0);

        let series = build_weekly_series(&detections, &extinguishes, now);
        assert_eq!(series.len(), 5);
        assert_eq!(series.week_starts[0], utc_ms(2024, 7, 1, 0, 0));
        assert_eq!(series.week_starts[4], utc_ms(2024, 7, 29, 0, 0));
        assert_eq!(series.new_counts, vec![2, 0, 0, 0, 0]);
        assert_eq!(series.out_counts, vec![0, 0, 1, 0, 0]);
        assert_eq!(series.active_counts, vec![2, 2, 1, 1, 1]);
    }

    #[test]
    fn test_series_runs_past_now_when_events_are_later() {
        let detections = [utc_ms(2024, 7, 1, 10, 0), utc_ms(2024, 7, 20, 10, 0)];
        let now = utc_ms(2024, 7, 2, 0, 0);
        let series = build_weekly_series(&detections, &[], now);
        assert_eq!(series.len(), 3);
        assert_eq!(series.new_counts, vec![1, 0, 1]);
    }

    #[test]
    fn test_active_never_negative() {
        let detections = [utc_ms(2024, 7, 10, 0, 0)];
        let extinguishes = [
            utc_ms(2024, 7, 1, 0, 0),
            utc_ms(2024, 7, 2, 0, 0),
            utc_ms(2024, 7, 3, 0, 0),
        ];
        let series = build_weekly_series(&detections, &extinguishes, utc_ms(2024, 7, 10, 0, 0));
        assert_eq!(series.active_counts, vec![0, 1]);
        assert_eq!(series.week_starts.len(), series.new_counts.len());
        assert_eq!(series.out_counts.len(), series.active_counts.len());
    }

    #[test]
    fn test_outlier_timestamps_do_not_stretch_series() {
        let now = utc_ms(2024, 7, 15, 12, 0);
        let detections = [utc_ms(2024, 7, 1, 10, 0), 8_000_000_000_000_000, i64::MAX];
        let extinguishes = [i64::MIN, -8_000_000_000_000_000];

        let series = build_weekly_series(&detections, &extinguishes, now);
        assert_eq!(series.len(), 3);
        assert_eq!(series.new_counts, vec![1, 0, 0]);
        assert_eq!(series.out_counts, vec![0, 0, 0]);
        assert!(series.len() as i64 <= 2 * MAX_SERIES_WEEKS + 1);
    }

    #[test]
    fn test_series_window_edges() {
        let now = utc_ms(2024, 7, 15, 0, 0);
        let current = iso_week_start_utc(now);
        let oldest = current - MAX_SERIES_WEEKS * WEEK_MS;

        let series = build_weekly_series(&[oldest, oldest - WEEK_MS], &[], now);
        assert_eq!(series.week_starts[0], oldest);
        assert_eq!(series.len() as i64, MAX_SERIES_WEEKS + 1);
        assert_eq!(series.new_counts[0], 1);
    }
}
