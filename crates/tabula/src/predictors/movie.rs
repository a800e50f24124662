//! Movie rating regressor.

use super::{FieldConstraint, FieldRule, PredictorSpec};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tabula_data::{TargetEncoding, TrainingTable};
use tabula_features::{ColumnSpec, RawRecord, TableLayout};
use tabula_model::{Postprocess, Task};
use tabula_output::DisplayFormat;

/// Genres offered by the synthetic generator.
pub const GENRES: [&str; 5] = ["Action", "Comedy", "Drama", "Sci-Fi", "Romance"];

/// Directors offered by the synthetic generator.
pub const DIRECTORS: [&str; 5] = ["Spielberg", "Nolan", "Tarantino", "Wong", "Cameron"];

/// Actors offered by the synthetic generator.
pub const ACTORS: [&str; 5] = ["DiCaprio", "Streep", "Cruise", "Johansson", "Hanks"];

const SYNTHETIC_ROWS: usize = 1000;

/// Attributes of a movie to rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieFeatures {
    /// Genre
    pub genre: String,
    /// Director
    pub director: String,
    /// Lead actor
    pub actor1: String,
    /// Second actor
    pub actor2: String,
    /// Release year
    pub year: u32,
    /// Runtime in minutes
    pub runtime: u32,
}

impl From<MovieFeatures> for RawRecord {
    fn from(m: MovieFeatures) -> Self {
        Self::new()
            .with("Genre", m.genre)
            .with("Director", m.director)
            .with("Actor1", m.actor1)
            .with("Actor2", m.actor2)
            .with("Year", m.year)
            .with("Runtime", m.runtime)
    }
}

fn layout() -> TableLayout {
    TableLayout::new(vec![
        ColumnSpec::categorical("Genre"),
        ColumnSpec::categorical("Director"),
        ColumnSpec::categorical("Actor1"),
        ColumnSpec::categorical("Actor2"),
        ColumnSpec::numeric("Year"),
        ColumnSpec::numeric("Runtime"),
    ])
}

/// Movie predictor definition.
pub fn spec() -> PredictorSpec {
    PredictorSpec {
        name: "movie".to_string(),
        layout: layout(),
        target: "Rating".to_string(),
        target_encoding: TargetEncoding::Numeric,
        task: Task::Regression,
        rules: vec![
            FieldConstraint::new(
                "Year",
                FieldRule::Integer {
                    min: Some(1888),
                    max: Some(2025),
                },
            ),
            FieldConstraint::new(
                "Runtime",
                FieldRule::Integer {
                    min: Some(1),
                    max: None,
                },
            ),
        ],
        postprocess: Postprocess::clip(Some(1.0), Some(10.0)),
        display: DisplayFormat::Score {
            title: "Rating".to_string(),
            out_of: 10.0,
        },
    }
}

/// Uniformly drawn movies with uniform ratings in [1, 10].
pub fn synthetic(seed: u64) -> TrainingTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut table = TrainingTable::new(layout(), "Rating");

    for _ in 0..SYNTHETIC_ROWS {
        let record = RawRecord::new()
            .with("Genre", pick(&GENRES, &mut rng))
            .with("Director", pick(&DIRECTORS, &mut rng))
            .with("Actor1", pick(&ACTORS, &mut rng))
            .with("Actor2", pick(&ACTORS, &mut rng))
            .with("Year", rng.gen_range(1980u32..=2023))
            .with("Runtime", rng.gen_range(80u32..=180));
        table.push(record, rng.gen_range(1.0..=10.0));
    }
    table
}

fn pick(options: &[&'static str], rng: &mut StdRng) -> &'static str {
    options.choose(rng).copied().unwrap_or_default()
}
