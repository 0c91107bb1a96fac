use campus_journal::models::{
    CohortSample, EntryAnalytics, EntryBody, EntryContext, EntryPrivacy, JournalEntry, Location,
    Mood, MoodColor, MoodTag, Prompts, TimeOfDay,
};
use campus_journal::policy::aggregation;
use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

const COLORS: [&str; 5] = ["blue", "green", "yellow", "red", "purple"];
const TAGS: [MoodTag; 4] = [MoodTag::Calm, MoodTag::Stressed, MoodTag::Tired, MoodTag::Happy];
const LOCATIONS: [Location; 3] = [Location::Library, Location::Dorm, Location::Campus];
const TIMES: [TimeOfDay; 4] = [
    TimeOfDay::Morning,
    TimeOfDay::Afternoon,
    TimeOfDay::Evening,
    TimeOfDay::Night,
];

/// A year of daily entries with varied moods, colours and context.
fn year_of_entries() -> Vec<JournalEntry> {
    let now = Utc::now();
    (0..365usize)
        .map(|i| {
            let created = now - Duration::days(i as i64);
            JournalEntry {
                id: format!("e{i}"),
                user_id: "auth0|bench".to_string(),
                entry: EntryBody {
                    content: "Studied for the midterm".to_string(),
                    mood: Mood {
                        scale: (i % 10) as u8 + 1,
                        colors: vec![
                            MoodColor {
                                color: COLORS[i % COLORS.len()].to_string(),
                                intensity: Some((i % 5) as u8 + 1),
                            },
                            MoodColor {
                                color: COLORS[(i + 2) % COLORS.len()].to_string(),
                                intensity: None,
                            },
                        ],
                        tags: vec![TAGS[i % TAGS.len()], TAGS[(i + 1) % TAGS.len()]],
                    },
                    prompts: Prompts::default(),
                    context: EntryContext {
                        location: Some(LOCATIONS[i % LOCATIONS.len()]),
                        time_of_day: Some(TIMES[i % TIMES.len()]),
                        stress_level: (i % 3 != 0).then_some((i % 10) as u8 + 1),
                    },
                },
                privacy: EntryPrivacy::default(),
                analytics: EntryAnalytics {
                    edit_count: 0,
                    read_time: Some(30.0 + (i % 60) as f64),
                    sentiment: None,
                },
                expires_at: None,
                created_at: created,
                updated_at: created,
            }
        })
        .collect()
}

fn benchmark_personal_analytics(c: &mut Criterion) {
    let entries = year_of_entries();

    let mut group = c.benchmark_group("personal_analytics");

    group.bench_function("mood_stats_year", |b| {
        b.iter(|| aggregation::mood_stats(black_box(&entries)))
    });

    group.bench_function("dashboard_year", |b| {
        b.iter(|| aggregation::dashboard(black_box(&entries)))
    });

    group.bench_function("color_stats_year", |b| {
        b.iter(|| aggregation::color_stats(black_box(&entries)))
    });

    group.finish();
}

fn benchmark_cohort(c: &mut Criterion) {
    // Roughly a campus worth of shared entries over a month.
    let samples: Vec<CohortSample> = year_of_entries()
        .iter()
        .cycle()
        .take(10_000)
        .map(CohortSample::from)
        .collect();

    c.bench_function("cohort_stats_10k", |b| {
        b.iter(|| aggregation::cohort_stats(black_box(&samples)))
    });
}

criterion_group!(benches, benchmark_personal_analytics, benchmark_cohort);
criterion_main!(benches);
