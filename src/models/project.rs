use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Path relative to the media root, e.g. `projects/0192....png`.
    pub image: Option<String>,
    /// Empty when the project has not been filed under a category.
    pub category: String,
    /// Whole dollars pledged so far.
    pub funded_amount: i64,
    /// Whole dollars; 0 means no funding goal.
    pub goal_amount: i64,
    pub backers: i32,
    /// Last day of the funding campaign.
    pub ends_on: Option<NaiveDate>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Public URL of the uploaded image, if one is attached.
    pub fn image_url(&self) -> Option<String> {
        self.image
            .as_deref()
            .map(|path| format!("{}/{path}", crate::media::MEDIA_URL))
    }

    /// Share of the goal already pledged, capped at 100.
    pub fn funding_percentage(&self) -> f64 {
        funding_percentage(self.funded_amount, self.goal_amount)
    }

    /// Days left in the campaign as of `today`. Negative once it has ended.
    pub fn days_left_on(&self, today: NaiveDate) -> Option<i64> {
        self.ends_on.map(|ends_on| (ends_on - today).num_days())
    }

    pub fn days_left(&self) -> Option<i64> {
        self.days_left_on(Utc::now().date_naive())
    }

    /// `"12 days left"` or `"Ended"`; `None` without an end date.
    pub fn days_left_label(&self) -> Option<String> {
        self.days_left().map(|days| match days {
            1 => "1 day left".to_string(),
            d if d > 0 => format!("{d} days left"),
            _ => "Ended".to_string(),
        })
    }

    pub fn funded_display(&self) -> String {
        format_currency(self.funded_amount)
    }

    pub fn goal_display(&self) -> String {
        format_currency(self.goal_amount)
    }
}

pub fn funding_percentage(funded: i64, goal: i64) -> f64 {
    if goal <= 0 {
        return 0.0;
    }
    (funded as f64 / goal as f64 * 100.0).min(100.0)
}

/// Compact dollar amount: `$2.4M`, `$890K`, `$650`.
pub fn format_currency(amount: i64) -> String {
    if amount >= 1_000_000 {
        format!("${:.1}M", amount as f64 / 1_000_000.0)
    } else if amount >= 1_000 {
        format!("${:.0}K", amount as f64 / 1_000.0)
    } else {
        format!("${amount}")
    }
}

/// Validated input ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub campaign: Campaign,
}

/// Funding details of a project. Every field has a neutral default so the
/// public entry form, which only asks for title and description, can omit them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Campaign {
    pub category: String,
    pub funded_amount: i64,
    pub goal_amount: i64,
    pub backers: i32,
    pub ends_on: Option<NaiveDate>,
    pub featured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_is_compact() {
        assert_eq!(format_currency(2_400_000), "$2.4M");
        assert_eq!(format_currency(890_000), "$890K");
        assert_eq!(format_currency(650), "$650");
        assert_eq!(format_currency(0), "$0");
    }

    #[test]
    fn funding_is_capped_and_guarded() {
        assert_eq!(funding_percentage(2_400_000, 5_000_000), 48.0);
        assert_eq!(funding_percentage(7, 5), 100.0);
        assert_eq!(funding_percentage(100, 0), 0.0);
    }

    #[test]
    fn days_left_counts_to_end_date() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let project = Project {
            id: Uuid::nil(),
            title: "t".into(),
            description: "d".into(),
            image: None,
            category: String::new(),
            funded_amount: 0,
            goal_amount: 0,
            backers: 0,
            ends_on: NaiveDate::from_ymd_opt(2025, 3, 16),
            featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(project.days_left_on(today), Some(15));

        let ended = Project {
            ends_on: NaiveDate::from_ymd_opt(2025, 2, 1),
            ..project.clone()
        };
        assert_eq!(ended.days_left_on(today), Some(-28));
        assert_eq!(ended.days_left_label().as_deref(), Some("Ended"));

        let open_ended = Project {
            ends_on: None,
            ..project
        };
        assert_eq!(open_ended.days_left_label(), None);
    }
}
