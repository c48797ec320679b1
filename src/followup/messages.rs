use chrono::{NaiveDateTime, Weekday};

/// Message templates for follow-up recommendations and action descriptions.
/// Staff-facing wording: short, factual, no alarm language.
pub struct FollowUpMessages;

impl FollowUpMessages {
    pub fn insufficient_history() -> String {
        "Not enough visit history yet to detect a pattern. \
         Keep registering this patient's visits."
            .to_string()
    }

    pub fn generic_reminder() -> String {
        "Set a routine follow-up reminder for a check-up in about six months.".to_string()
    }

    pub fn overdue(days_since: i64, average_interval: f64) -> String {
        format!(
            "Last visit was {} days ago, well past the usual interval of {:.0} days. \
             The patient is overdue for a return visit.",
            days_since, average_interval,
        )
    }

    pub fn near_interval(days_since: i64, average_interval: f64) -> String {
        format!(
            "Last visit was {} days ago; the usual interval is {:.0} days. \
             The patient is approaching their next expected visit.",
            days_since, average_interval,
        )
    }

    pub fn top_service(name: &str, count: u32) -> String {
        let times = if count == 1 { "time" } else { "times" };
        format!("Most frequent service: {} ({} {}).", name, count, times)
    }

    pub fn ongoing_treatment(name: &str) -> String {
        format!(
            "{} is an ongoing treatment that needs regular follow-up appointments.",
            name,
        )
    }

    pub fn preferences(weekdays: &[Weekday], hours: &[u32]) -> String {
        let days = weekdays
            .iter()
            .map(|d| weekday_name(*d))
            .collect::<Vec<_>>()
            .join(", ");
        let hours = hours
            .iter()
            .map(|h| format_hour(*h))
            .collect::<Vec<_>>()
            .join(", ");
        match (days.is_empty(), hours.is_empty()) {
            (false, false) => format!("Usually visits on {} around {}.", days, hours),
            (false, true) => format!("Usually visits on {}.", days),
            (true, false) => format!("Usually visits around {}.", hours),
            (true, true) => String::new(),
        }
    }

    pub fn projection(projected: NaiveDateTime) -> String {
        format!(
            "Next visit is estimated for {}.",
            projected.format("%Y-%m-%d"),
        )
    }

    // ─── Action descriptions ────────────────────────────────────────────────

    pub fn contact_overdue() -> String {
        "Contact the patient to schedule a return visit.".to_string()
    }

    pub fn reminder_near_interval() -> String {
        "Send a reminder to book the next appointment.".to_string()
    }

    pub fn maintenance_program(name: &str) -> String {
        format!("Offer a periodic maintenance plan for {}.", name.to_lowercase())
    }

    pub fn ongoing_follow_up(name: &str) -> String {
        format!("Schedule the next {} control visit.", name.to_lowercase())
    }

    pub fn preferred_slot(weekday: Option<Weekday>, hour: Option<u32>) -> String {
        match (weekday, hour) {
            (Some(d), Some(h)) => format!(
                "Offer appointments on {} at {}.",
                weekday_name(d),
                format_hour(h)
            ),
            (Some(d), None) => format!("Offer appointments on {}.", weekday_name(d)),
            (None, Some(h)) => format!("Offer appointments at {}.", format_hour(h)),
            (None, None) => "Offer appointments at the patient's usual time.".to_string(),
        }
    }

    pub fn projection_passed() -> String {
        "The estimated next visit date has already passed. Contact the patient.".to_string()
    }

    pub fn projection_upcoming(projected: NaiveDateTime) -> String {
        format!(
            "Remind the patient of the visit expected around {}.",
            projected.format("%Y-%m-%d"),
        )
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn format_hour(hour: u32) -> String {
    format!("{:02}:00", hour)
}
