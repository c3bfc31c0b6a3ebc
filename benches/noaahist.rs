use criterion::{black_box, criterion_group, criterion_main, Criterion};
use noaahist::{distance_miles, FieldCoverage, LatLon, StationCatalog};

fn history_text(n: usize) -> String {
    let mut text = String::new();
    for i in 0..n {
        let mut line = vec![b' '; 100];
        let put = |buf: &mut Vec<u8>, offset: usize, s: &str| {
            for (j, b) in s.bytes().enumerate() {
                buf[offset + j] = b;
            }
        };
        put(&mut line, 0, &format!("{:06}", 100000 + i));
        put(&mut line, 7, &format!("{:05}", 10000 + i));
        put(&mut line, 13, "SYNTHETIC STATION");
        put(&mut line, 49, "CA");
        put(&mut line, 58, &format!("{:+06}", 30000 + (i as i64 % 20000)));
        put(&mut line, 65, &format!("{:+07}", -120000 + (i as i64 % 40000)));
        put(&mut line, 83, "19730101");
        put(&mut line, 92, "20131231");
        text.push_str(&String::from_utf8(line).unwrap());
        text.push('\n');
    }
    text
}

fn bench_noaahist(c: &mut Criterion) {
    c.bench_function("distance_miles", |b| {
        b.iter(|| {
            distance_miles(
                black_box(LatLon(37.7749, -122.4194)),
                black_box(LatLon(34.0522, -118.2437)),
            )
        })
    });

    let text = history_text(2000);
    c.bench_function("catalog_parse_2k", |b| {
        b.iter(|| StationCatalog::parse_history(black_box(&text), FieldCoverage::empty()))
    });

    let catalog = StationCatalog::parse_history(&text, FieldCoverage::empty());
    c.bench_function("rank_by_distance_2k", |b| {
        b.iter(|| catalog.rank_by_distance(black_box(LatLon(37.0, -115.0)), |_| true))
    });
}

criterion_group!(benches, bench_noaahist);
criterion_main!(benches);
