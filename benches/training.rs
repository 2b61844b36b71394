use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use handsign::features::encode;
use handsign::landmarks::{DetectionFrame, Hand, LANDMARKS_PER_HAND, LandmarkPoint};
use handsign::ml::mlp::{MlpClassifier, MlpOptions};
use handsign::ml::{Classifier, TrainingOptions};

const ROWS_PER_LABEL: usize = 100;
const LABELS: [&str; 4] = ["open", "fist", "point", "peace"];

fn frame(center: f32) -> DetectionFrame {
    let points: Vec<LandmarkPoint> = (0..LANDMARKS_PER_HAND)
        .map(|idx| {
            let offset = idx as f32 * 0.004;
            LandmarkPoint::new(center + offset, center - offset, offset)
        })
        .collect();
    let hand = Hand::from_points(&points).expect("21 landmarks");
    DetectionFrame::new(vec![hand.clone(), hand])
}

fn rows() -> Vec<(Vec<f32>, &'static str)> {
    let mut rows = Vec::with_capacity(ROWS_PER_LABEL * LABELS.len());
    for (class, label) in LABELS.iter().enumerate() {
        for idx in 0..ROWS_PER_LABEL {
            let center = class as f32 * 0.2 + (idx % 10) as f32 * 0.002;
            rows.push((encode(&frame(center)).expect("encode"), *label));
        }
    }
    rows
}

fn bench_train(c: &mut Criterion) {
    let rows = rows();
    c.bench_with_input(BenchmarkId::new("mlp_train", rows.len()), &rows, |b, rows| {
        b.iter(|| {
            let mut clf = MlpClassifier::new(MlpOptions::default());
            for (features, label) in rows {
                clf.add_data(features, label).expect("add");
            }
            clf.normalize_data().expect("normalize");
            clf.train(&TrainingOptions { epochs: 10 }).expect("train");
            black_box(clf.row_count());
        });
    });
}

fn bench_classify(c: &mut Criterion) {
    let rows = rows();
    let mut clf = MlpClassifier::new(MlpOptions::default());
    for (features, label) in &rows {
        clf.add_data(features, label).expect("add");
    }
    clf.normalize_data().expect("normalize");
    clf.train(&TrainingOptions { epochs: 10 }).expect("train");
    let live = encode(&frame(0.41)).expect("encode");
    c.bench_function("mlp_classify", |b| {
        b.iter(|| black_box(clf.classify(black_box(&live)).expect("classify")));
    });
}

criterion_group!(benches, bench_train, bench_classify);
criterion_main!(benches);
