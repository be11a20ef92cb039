use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mental_poker::game::{
    Card, HandEvaluator, StandardEvaluator, Suit, award_pots, compute_pots,
};
use std::hint::black_box;

/// Benchmark hand evaluation with 5 cards (flop)
fn bench_evaluate_5_cards(c: &mut Criterion) {
    let cards = [
        Card(14, Suit::Spade),
        Card(13, Suit::Spade),
        Card(12, Suit::Heart),
        Card(7, Suit::Club),
        Card(2, Suit::Diamond),
    ];

    c.bench_function("evaluate_5_cards", |b| {
        b.iter(|| StandardEvaluator.evaluate(black_box(&cards)));
    });
}

/// Benchmark hand evaluation with 7 cards (hole cards + board)
fn bench_evaluate_7_cards(c: &mut Criterion) {
    let cards = [
        Card(14, Suit::Spade),
        Card(13, Suit::Spade),
        Card(12, Suit::Spade),
        Card(11, Suit::Spade),
        Card(3, Suit::Heart),
        Card(7, Suit::Club),
        Card(2, Suit::Diamond),
    ];

    c.bench_function("evaluate_7_cards", |b| {
        b.iter(|| StandardEvaluator.evaluate(black_box(&cards)));
    });
}

/// Benchmark side pot construction and payout at different table sizes
fn bench_pots(c: &mut Criterion) {
    let mut group = c.benchmark_group("pots");

    for seats in [2usize, 6, 10] {
        let committed: Vec<i64> = (0..seats).map(|i| 500 * (i as i64 % 4 + 1)).collect();
        let live: Vec<bool> = (0..seats).map(|i| i % 3 != 0).collect();
        let strengths: Vec<Option<u32>> = live
            .iter()
            .enumerate()
            .map(|(i, l)| l.then_some(i as u32 * 7 % 5))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(seats), &seats, |b, _| {
            b.iter(|| {
                let pots = compute_pots(black_box(&committed), black_box(&live));
                award_pots(&pots, &strengths)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_evaluate_5_cards,
    bench_evaluate_7_cards,
    bench_pots
);
criterion_main!(benches);
