//! Decides whether a quiz can be started at a given instant.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{QuizSchedule, ScheduleBoundary},
};

const AVAILABLE: &str = "available";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum WindowBoundary {
    StartsAt(DateTime<Utc>),
    EndedAt(DateTime<Utc>),
    EndsAt(DateTime<Utc>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Accessibility {
    pub accessible: bool,
    pub reason: String,
    pub boundary: Option<WindowBoundary>,
}

impl Accessibility {
    fn open(boundary: Option<WindowBoundary>) -> Self {
        Accessibility {
            accessible: true,
            reason: AVAILABLE.to_string(),
            boundary,
        }
    }

    fn closed(reason: String, boundary: Option<WindowBoundary>) -> Self {
        Accessibility {
            accessible: false,
            reason,
            boundary,
        }
    }

    /// End of the window, for the client-side countdown.
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        match self.boundary {
            Some(WindowBoundary::EndsAt(at)) => Some(at),
            _ => None,
        }
    }

    /// Turns a closed window into `AccessDenied` carrying the boundary.
    pub fn ensure_accessible(self) -> AppResult<Self> {
        if self.accessible {
            return Ok(self);
        }

        let (starts_at, ended_at) = match self.boundary {
            Some(WindowBoundary::StartsAt(at)) => (Some(at), None),
            Some(WindowBoundary::EndedAt(at)) => (None, Some(at)),
            _ => (None, None),
        };

        Err(AppError::AccessDenied {
            message: self.reason,
            starts_at,
            ended_at,
        })
    }
}

pub fn evaluate(schedule: &QuizSchedule, now: DateTime<Utc>) -> Accessibility {
    if !schedule.is_scheduled {
        return Accessibility::open(None);
    }

    let tz: Tz = match schedule.timezone.parse() {
        Ok(tz) => tz,
        Err(_) => {
            return misconfigured(&format!("unknown timezone '{}'", schedule.timezone));
        }
    };

    let (Some(start), Some(end)) = (&schedule.start, &schedule.end) else {
        return misconfigured("start and end dates are required for a scheduled quiz");
    };

    let Some(start_at) = resolve(start, NaiveTime::MIN, tz) else {
        return misconfigured("start time does not exist in the configured timezone");
    };
    let Some(end_at) = resolve(end, end_of_day(), tz) else {
        return misconfigured("end time does not exist in the configured timezone");
    };

    if now < start_at {
        return Accessibility::closed(
            format!("Quiz will be available from {}", render(start_at, tz)),
            Some(WindowBoundary::StartsAt(start_at)),
        );
    }

    if now > end_at {
        return Accessibility::closed(
            format!("Quiz ended at {}", render(end_at, tz)),
            Some(WindowBoundary::EndedAt(end_at)),
        );
    }

    Accessibility::open(Some(WindowBoundary::EndsAt(end_at)))
}

fn misconfigured(detail: &str) -> Accessibility {
    log::warn!("Scheduled quiz is misconfigured: {}", detail);
    Accessibility::closed(format!("Quiz schedule is misconfigured: {}", detail), None)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

/// Local date + time in `tz` to an instant. Ambiguous times take the earlier
/// reading; times skipped by a DST jump move forward one hour.
fn resolve(boundary: &ScheduleBoundary, default_time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    let local = boundary.date.and_time(boundary.time.unwrap_or(default_time));

    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|at| at.with_timezone(&Utc))
}

fn render(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z").to_string()
}
