//! Featured banner and quote strip
//!
//! Static content shown alongside the rotating zones. The main banner follows
//! the hotel's local hour; a preview card cycles through every part of the
//! day, and a quote card cycles through a fixed list. Both cycles are derived
//! from time since mount, so they need no timers of their own.

use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;

pub const PREVIEW_ROTATION: Duration = Duration::from_secs(8);
pub const QUOTE_ROTATION: Duration = Duration::from_secs(12);

/// Part of the day used for the featured banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DayPart {
    Morning,
    Brunch,
    Afternoon,
    GoldenHour,
    Evening,
    Night,
}

impl DayPart {
    pub const ALL: [DayPart; 6] = [
        DayPart::Morning,
        DayPart::Brunch,
        DayPart::Afternoon,
        DayPart::GoldenHour,
        DayPart::Evening,
        DayPart::Night,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=10 => DayPart::Morning,
            11..=14 => DayPart::Brunch,
            15..=17 => DayPart::Afternoon,
            18..=19 => DayPart::GoldenHour,
            20..=22 => DayPart::Evening,
            _ => DayPart::Night,
        }
    }

    pub fn banner(self) -> Banner {
        let (title, subtitle, content, hours) = match self {
            DayPart::Morning => (
                "Good Morning",
                "Start Your Jerusalem Adventure",
                "Experience the awakening city with our morning specials and fresh coffee",
                "6:00-11:00",
            ),
            DayPart::Brunch => (
                "Brunch Time",
                "Leisurely Morning Delights",
                "Indulge in our weekend brunch buffet with Jerusalem's finest ingredients",
                "11:00-15:00",
            ),
            DayPart::Afternoon => (
                "Afternoon Exploration",
                "Discover Ancient Wonders",
                "Perfect time to explore the Old City and Mahane Yehuda Market",
                "15:00-18:00",
            ),
            DayPart::GoldenHour => (
                "Golden Hour",
                "Capture Jerusalem's Beauty",
                "The most photogenic time in Jerusalem, perfect for memorable moments",
                "18:00-20:00",
            ),
            DayPart::Evening => (
                "Evening Elegance",
                "Fine Dining Experience",
                "Join us for an exquisite dinner featuring Mediterranean cuisine",
                "20:00-23:00",
            ),
            DayPart::Night => (
                "Peaceful Night",
                "Rest & Rejuvenation",
                "Unwind in luxury comfort after a day of Jerusalem discoveries",
                "23:00-6:00",
            ),
        };
        Banner {
            part: self,
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            content: content.to_string(),
            hours: hours.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Banner {
    pub part: DayPart,
    pub title: String,
    pub subtitle: String,
    pub content: String,
    pub hours: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuoteCategory {
    Cuisine,
    Jerusalem,
    Hospitality,
    Travel,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Quote {
    pub text: String,
    pub author: String,
    pub category: QuoteCategory,
}

const QUOTES: [(&str, &str, QuoteCategory); 8] = [
    (
        "Jerusalem is the city where the past and present dance together in harmony.",
        "Chef Yossi",
        QuoteCategory::Jerusalem,
    ),
    (
        "Every dish tells a story of tradition, innovation, and passion.",
        "Culinary Philosophy",
        QuoteCategory::Cuisine,
    ),
    (
        "Hospitality is not about perfection. It's about making people feel welcomed.",
        "Ambassador Jerusalem",
        QuoteCategory::Hospitality,
    ),
    (
        "Travel makes one modest. You see what a tiny place you occupy in the world.",
        "Gustave Flaubert",
        QuoteCategory::Travel,
    ),
    (
        "In Jerusalem, every stone whispers ancient stories to those who listen.",
        "Local Wisdom",
        QuoteCategory::Jerusalem,
    ),
    (
        "Cooking is love made visible, especially when shared with strangers who become friends.",
        "Kitchen Wisdom",
        QuoteCategory::Cuisine,
    ),
    (
        "True luxury is not in what you have, but in how you make others feel.",
        "Hospitality Creed",
        QuoteCategory::Hospitality,
    ),
    (
        "A journey is best measured in friends, rather than miles.",
        "Tim Cahill",
        QuoteCategory::Travel,
    ),
];

/// Featured strip for one frame
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FeaturedView {
    /// Banner for the current local hour
    pub banner: Banner,
    /// "Coming up" card, cycling through every part of the day
    pub preview: Banner,
    pub quote: Quote,
}

impl FeaturedView {
    pub fn at(hour: u32, since_mount: Duration) -> Self {
        let preview = cycle(since_mount, PREVIEW_ROTATION, DayPart::ALL.len());
        let (text, author, category) = QUOTES[cycle(since_mount, QUOTE_ROTATION, QUOTES.len())];
        Self {
            banner: DayPart::from_hour(hour).banner(),
            preview: DayPart::ALL[preview].banner(),
            quote: Quote {
                text: text.to_string(),
                author: author.to_string(),
                category,
            },
        }
    }
}

fn cycle(elapsed: Duration, period: Duration, len: usize) -> usize {
    let steps = elapsed.as_millis() / period.as_millis().max(1);
    (steps % len as u128) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_part_boundaries() {
        assert_eq!(DayPart::from_hour(5), DayPart::Night);
        assert_eq!(DayPart::from_hour(6), DayPart::Morning);
        assert_eq!(DayPart::from_hour(11), DayPart::Brunch);
        assert_eq!(DayPart::from_hour(15), DayPart::Afternoon);
        assert_eq!(DayPart::from_hour(19), DayPart::GoldenHour);
        assert_eq!(DayPart::from_hour(22), DayPart::Evening);
        assert_eq!(DayPart::from_hour(23), DayPart::Night);
    }

    #[test]
    fn test_preview_and_quote_cycle_independently() {
        let secs = Duration::from_secs;
        assert_eq!(FeaturedView::at(9, secs(0)).preview.part, DayPart::Morning);
        assert_eq!(FeaturedView::at(9, secs(8)).preview.part, DayPart::Brunch);
        assert_eq!(FeaturedView::at(9, secs(48)).preview.part, DayPart::Morning);

        assert_eq!(FeaturedView::at(9, secs(11)).quote.author, "Chef Yossi");
        assert_eq!(FeaturedView::at(9, secs(12)).quote.author, "Culinary Philosophy");
        assert_eq!(FeaturedView::at(9, secs(96)).quote.author, "Chef Yossi");
    }

    #[test]
    fn test_banner_follows_local_hour() {
        let view = FeaturedView::at(21, Duration::from_secs(30));
        assert_eq!(view.banner.part, DayPart::Evening);
        assert_eq!(view.banner.hours, "20:00-23:00");
    }
}
