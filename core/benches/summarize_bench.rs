use criterion::{criterion_group, criterion_main, Criterion};
use essay_core::normalizer::{MorphNormalizer, Normalizer};
use essay_core::{Strategy, Summarizer, SummarizerConfig};

const TEXT: &str = "Кошка спит на диване, а собака лежит у двери. \
Утром кошка просыпается и идёт к миске. \
Собака бежит за кошкой по коридору! \
Хозяин возвращается домой вечером и кормит животных. \
Кошка и собака живут дружно, хотя иногда спорят из-за игрушек.";

fn bench_normalize(c: &mut Criterion) {
    let n = MorphNormalizer::new();
    c.bench_function("content_terms", |b| b.iter(|| n.content_terms(TEXT)));
}

fn bench_summarize(c: &mut Criterion) {
    let mut s = Summarizer::in_memory(SummarizerConfig::default());
    let id = s.add_document("pets", TEXT).unwrap();
    s.add_document("weather", "Сегодня идёт дождь. Завтра будет солнечно.").unwrap();
    c.bench_function("summarize_own", |b| b.iter(|| s.summarize(id, Strategy::Own).unwrap()));
    c.bench_function("summarize_textrank", |b| b.iter(|| s.summarize(id, Strategy::TextRank).unwrap()));
}

criterion_group!(benches, bench_normalize, bench_summarize);
criterion_main!(benches);
