// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rule-based recommendations from a dashboard summary.

use crate::models::stats::{Priority, RecommendationKind};
use crate::models::{DashboardSummary, Recommendation};

const LOW_MOOD_BELOW: f64 = 5.0;
const HIGH_MOOD_ABOVE: f64 = 7.0;
const HIGH_STRESS_ABOVE: f64 = 7.0;
/// Fewer entries than this in the window suggests journaling more often.
const ENGAGEMENT_MIN_ENTRIES: u32 = 7;

/// All applicable recommendations, ordered mood, stress, engagement.
pub fn recommend(summary: &DashboardSummary) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    match summary.avg_mood {
        Some(mood) if mood < LOW_MOOD_BELOW => recommendations.push(Recommendation {
            kind: RecommendationKind::Mood,
            priority: Priority::High,
            message: "Your recent mood scores suggest you might benefit from additional support. Consider reaching out to campus counseling services.",
            action: "contact_counselor",
        }),
        Some(mood) if mood > HIGH_MOOD_ABOVE => recommendations.push(Recommendation {
            kind: RecommendationKind::Mood,
            priority: Priority::Low,
            message: "Great job maintaining positive mood levels! Keep up the healthy habits.",
            action: "maintain_habits",
        }),
        _ => {}
    }

    if summary.avg_stress.is_some_and(|stress| stress > HIGH_STRESS_ABOVE) {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Stress,
            priority: Priority::High,
            message: "Your stress levels have been elevated. Consider stress management techniques like deep breathing or meditation.",
            action: "stress_management",
        });
    }

    if summary.total_entries < ENGAGEMENT_MIN_ENTRIES {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Engagement,
            priority: Priority::Medium,
            message: "Regular journaling can help improve mental clarity. Try setting a daily reminder.",
            action: "increase_frequency",
        });
    }

    recommendations
}
