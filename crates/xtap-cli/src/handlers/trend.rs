use anyhow::Result;
use serde::Serialize;
use xtap_engine::{LinearFit, linear_fit};

use crate::context::ExecutionContext;
use crate::output::{self, print_json};

#[derive(Serialize)]
struct AuthorTrend {
    username: String,
    points: usize,
    /// Likes gained per hour of age
    fit: LinearFit,
}

pub fn handle(ctx: &ExecutionContext, min_observations: usize, max_age: f64) -> Result<()> {
    let series = ctx.db()?.engagement_series(min_observations, max_age)?;

    let mut trends: Vec<AuthorTrend> = series
        .into_iter()
        .map(|s| {
            let ages: Vec<f64> = s.points.iter().map(|p| p.age_hours).collect();
            let likes: Vec<f64> = s.points.iter().map(|p| p.likes as f64).collect();
            AuthorTrend {
                username: s.username,
                points: s.points.len(),
                fit: linear_fit(&ages, &likes),
            }
        })
        .collect();
    trends.sort_by(|a, b| b.fit.slope.total_cmp(&a.fit.slope));

    if ctx.is_json() {
        return print_json(&trends);
    }
    if trends.is_empty() {
        println!(
            "No author has posts with more than {} snapshots.",
            min_observations
        );
        return Ok(());
    }

    println!(
        "{:<20}  {:>6}  {:>12}  {:>6}",
        "AUTHOR", "POINTS", "LIKES/HOUR", "R²"
    );
    for trend in &trends {
        let fitted = trend.fit.points >= 2;
        println!(
            "{:<20}  {:>6}  {:>12}  {:>6}",
            format!("@{}", trend.username),
            trend.points,
            if fitted {
                format!("{:.1}", trend.fit.slope)
            } else {
                "-".to_string()
            },
            if fitted {
                format!("{:.2}", trend.fit.r_squared)
            } else {
                "-".to_string()
            },
        );
    }
    println!();
    println!(
        "{}",
        output::dim(&format!(
            "posts with more than {} snapshots, points younger than {}h",
            min_observations, max_age
        ))
    );
    Ok(())
}
