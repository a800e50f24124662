//! End-to-end training and inference tests.

use approx::assert_relative_eq;
use rstest::{fixture, rstest};
use std::sync::Arc;
use tabula::features::{RawRecord, UnseenCategoryPolicy};
use tabula::model::{ForestConfig, Outcome, RandomForest};
use tabula::predictors::iris::SPECIES;
use tabula::predictors::sales::MIN_SALES;
use tabula::{
    ArtifactBundle, ArtifactStore, InferencePipeline, IrisMeasurements, MovieFeatures,
    PipelineError, PredictorKind, SalesFeatures, Stage, TrainingConfig, TrainingPipeline,
};

fn train(kind: PredictorKind, seed: u64) -> ArtifactBundle {
    let config = TrainingConfig {
        seed,
        forest: ForestConfig {
            n_estimators: 20,
            ..ForestConfig::default()
        },
        ..TrainingConfig::default()
    };
    let (bundle, _) = TrainingPipeline::new(kind.spec(), config)
        .train(&kind.synthetic(seed))
        .unwrap();
    bundle
}

#[fixture]
fn iris() -> InferencePipeline {
    InferencePipeline::new(Arc::new(train(PredictorKind::Iris, 42)))
}

#[fixture]
fn movie() -> InferencePipeline {
    InferencePipeline::new(Arc::new(train(PredictorKind::Movie, 42)))
}

#[fixture]
fn sales() -> InferencePipeline {
    InferencePipeline::new(Arc::new(train(PredictorKind::Sales, 42)))
}

fn movie_record(director: &str, year: u32) -> RawRecord {
    MovieFeatures {
        genre: "Drama".into(),
        director: director.into(),
        actor1: "Hanks".into(),
        actor2: "Streep".into(),
        year,
        runtime: 130,
    }
    .into()
}

#[rstest]
fn test_iris_predicts_known_species(iris: InferencePipeline) {
    let record = IrisMeasurements {
        sepal_length: 5.1,
        sepal_width: 3.5,
        petal_length: 1.4,
        petal_width: 0.2,
    }
    .into();

    let outcome = iris.predict(&record).unwrap();
    let Outcome::Class {
        label,
        class_index,
        confidence,
    } = outcome
    else {
        panic!("expected a class outcome");
    };
    assert!(SPECIES.contains(&label.as_str()));
    assert_eq!(SPECIES[class_index], label);
    assert_eq!(label, "setosa");
    assert!((0.0..=100.0).contains(&confidence));
}

#[rstest]
fn test_iris_rejects_non_positive(iris: InferencePipeline) {
    let record = RawRecord::new()
        .with("sepal_length", 5.1)
        .with("sepal_width", 0.0)
        .with("petal_length", 1.4)
        .with("petal_width", 0.2);
    let err = iris.predict(&record).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InputValidation { ref field, .. } if field == "sepal_width"
    ));
    assert_eq!(err.stage(), Stage::Validating);
}

#[rstest]
fn test_unseen_director_is_ignored(movie: InferencePipeline) {
    let outcome = movie.predict(&movie_record("Kurosawa", 1999)).unwrap();
    let rating = outcome.value().unwrap();
    assert!(rating.is_finite());
    assert!((1.0..=10.0).contains(&rating));
}

#[rstest]
fn test_unseen_director_with_reject_policy(movie: InferencePipeline) {
    let strict = movie.with_unseen_policy(UnseenCategoryPolicy::Reject);
    let err = strict.predict(&movie_record("Kurosawa", 1999)).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::UnseenCategory { ref column, ref level, .. }
            if column == "Director" && level == "Kurosawa"
    ));
    assert_eq!(err.stage(), Stage::Encoding);

    // known levels still go through under the strict policy
    assert!(strict.predict(&movie_record("Nolan", 1999)).is_ok());
}

#[rstest]
#[case("Spielberg", 1980)]
#[case("Nolan", 2023)]
#[case("Wong", 1888)]
#[case("Lynch", 2025)]
fn test_ratings_stay_in_range(movie: InferencePipeline, #[case] director: &str, #[case] year: u32) {
    let rating = movie
        .predict(&movie_record(director, year))
        .unwrap()
        .value()
        .unwrap();
    assert!((1.0..=10.0).contains(&rating), "rating {rating}");
}

#[rstest]
fn test_movie_year_out_of_range(movie: InferencePipeline) {
    let err = movie.predict(&movie_record("Nolan", 1850)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid input for Year: must be between 1888 and 2025"
    );
}

#[rstest]
fn test_sales_floor(sales: InferencePipeline) {
    let record = SalesFeatures {
        tv: 0.0,
        radio: 0.0,
        newspaper: 0.0,
        age_group: "Senior".into(),
        platform: "Print".into(),
    }
    .into();
    let value = sales.predict(&record).unwrap().value().unwrap();
    assert!(value >= MIN_SALES);

    let record = SalesFeatures {
        tv: 2_500_000.0,
        radio: 800_000.0,
        newspaper: 500_000.0,
        age_group: "Adult".into(),
        platform: "Drive-in".into(),
    }
    .into();
    let value = sales.predict(&record).unwrap().value().unwrap();
    assert!(value > MIN_SALES);
}

#[rstest]
fn test_predict_many_is_independent(sales: InferencePipeline) {
    let good: RawRecord = SalesFeatures {
        tv: 1_000_000.0,
        radio: 200_000.0,
        newspaper: 100_000.0,
        age_group: "Young".into(),
        platform: "Online".into(),
    }
    .into();
    let missing_tv = RawRecord::new()
        .with("Radio", 200_000.0)
        .with("Newspaper", 100_000.0)
        .with("AgeGroup", "Young")
        .with("Platform", "Online");
    let negative = good.clone().with("Radio", -5.0);

    let results = sales.predict_many(&[good.clone(), missing_tv, negative, good.clone()]);
    assert_eq!(results.len(), 4);
    assert!(matches!(
        results[1],
        Err(PipelineError::MissingField { ref field, .. }) if field == "TV"
    ));
    assert!(matches!(results[2], Err(PipelineError::InputValidation { .. })));

    let first = results[0].as_ref().unwrap().value().unwrap();
    let last = results[3].as_ref().unwrap().value().unwrap();
    assert_eq!(first, last);
    assert_eq!(sales.predict(&good).unwrap().value(), Some(first));
}

#[test]
fn test_training_is_reproducible() {
    let record = movie_record("Tarantino", 1994);
    let a = InferencePipeline::new(Arc::new(train(PredictorKind::Movie, 7)));
    let b = InferencePipeline::new(Arc::new(train(PredictorKind::Movie, 7)));
    assert_eq!(a.predict(&record).unwrap(), b.predict(&record).unwrap());
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("movie.json");

    let bundle = train(PredictorKind::Movie, 3);
    bundle.save(&path).unwrap();
    assert!(path.exists());
    assert!(!path.with_file_name("movie.json.tmp").exists());

    let loaded: ArtifactBundle = ArtifactBundle::load(&path).unwrap();
    assert!(loaded.ensure_predictor("movie").is_ok());
    assert!(matches!(
        loaded.ensure_predictor("iris"),
        Err(PipelineError::PredictorMismatch { ref found, .. }) if found == "movie"
    ));
    assert_eq!(loaded.schema(), bundle.schema());
    assert_eq!(loaded.predictor(), bundle.predictor());
    assert_eq!(loaded.seed(), 3);

    let before = InferencePipeline::new(Arc::new(bundle));
    let after = InferencePipeline::new(Arc::new(loaded));
    for director in ["Nolan", "Cameron", "Kurosawa"] {
        let record = movie_record(director, 2001);
        assert_relative_eq!(
            before.predict(&record).unwrap().value().unwrap(),
            after.predict(&record).unwrap().value().unwrap(),
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_load_rejects_bad_artifacts() {
    let dir = tempfile::tempdir().unwrap();

    let missing = ArtifactBundle::<RandomForest>::load(dir.path().join("absent.json"));
    assert!(matches!(missing, Err(PipelineError::Io(_))));

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "{\"predictor\": 3}").unwrap();
    let err = ArtifactBundle::<RandomForest>::load(&garbage).unwrap_err();
    assert!(matches!(err, PipelineError::Serialization(_)));
    assert_eq!(err.stage(), Stage::Persisting);
}

fn point_splits_at(value: &mut serde_json::Value, feature: u64) -> usize {
    match value {
        serde_json::Value::Object(map) => {
            let mut changed = 0;
            if let Some(slot) = map.get_mut("feature") {
                *slot = feature.into();
                changed += 1;
            }
            changed
                + map
                    .values_mut()
                    .map(|v| point_splits_at(v, feature))
                    .sum::<usize>()
        }
        serde_json::Value::Array(items) => items.iter_mut().map(|v| point_splits_at(v, feature)).sum(),
        _ => 0,
    }
}

#[test]
fn test_load_rejects_corrupted_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iris.json");
    train(PredictorKind::Iris, 4).save(&path).unwrap();

    let mut doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(point_splits_at(&mut doc, 99) > 0);
    std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

    let err = ArtifactBundle::<RandomForest>::load(&path).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Model {
            stage: Stage::Loading,
            ..
        }
    ));
    assert!(err.to_string().contains("feature 99"), "{err}");

    // a forest with no trees is rejected as well
    let mut doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    doc["model"]["trees"] = serde_json::json!([]);
    std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
    let err = ArtifactBundle::<RandomForest>::load(&path).unwrap_err();
    assert_eq!(err.stage(), Stage::Loading);
}

#[test]
fn test_failed_save_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("sales.json");
    std::fs::create_dir(&target).unwrap();
    std::fs::write(target.join("keep"), "x").unwrap();

    let err = train(PredictorKind::Sales, 1).save(&target).unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
    assert!(!dir.path().join("sales.json.tmp").exists());
    assert!(target.join("keep").exists());
}

#[test]
fn test_store_swap_keeps_old_snapshot_usable() {
    let store = ArtifactStore::new(train(PredictorKind::Sales, 1));
    assert_eq!(store.generation(), 0);

    let old = store.pipeline();
    let (generation, snapshot) = store.snapshot();
    assert_eq!(generation, 0);

    let previous = store.replace(train(PredictorKind::Sales, 2));
    assert_eq!(store.generation(), 1);
    assert!(Arc::ptr_eq(&previous, &snapshot));
    assert!(!Arc::ptr_eq(&store.current(), &snapshot));
    assert_eq!(store.current().seed(), 2);

    let record: RawRecord = SalesFeatures {
        tv: 1_500_000.0,
        radio: 100_000.0,
        newspaper: 50_000.0,
        age_group: "Adult".into(),
        platform: "TV".into(),
    }
    .into();
    assert!(old.predict(&record).is_ok());
    assert!(store.pipeline().predict(&record).is_ok());
}

#[test]
fn test_concurrent_readers_during_swap() {
    let store = ArtifactStore::new(train(PredictorKind::Iris, 1));
    let replacement = train(PredictorKind::Iris, 2);
    let record: RawRecord = IrisMeasurements {
        sepal_length: 6.7,
        sepal_width: 3.0,
        petal_length: 5.2,
        petal_width: 2.3,
    }
    .into();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..25 {
                    let outcome = store.pipeline().predict(&record).unwrap();
                    assert!(SPECIES.contains(&outcome.label().unwrap()));
                }
            });
        }
        scope.spawn(|| {
            store.replace(replacement);
        });
    });
    assert_eq!(store.generation(), 1);
}
