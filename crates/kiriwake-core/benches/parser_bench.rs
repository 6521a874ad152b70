use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kiriwake_core::TagParser;

fn bench_parse_release(c: &mut Criterion) {
    let parser = TagParser::builtin().unwrap();

    let inputs = vec![
        "The.Matrix.1999.1080p.BluRay.x264-GROUP.mkv",
        "Star.Trek.Lower.Decks.S03E02.The.Least.Dangerous.Game.1080p.AMZN.WEB-DL.DDP.5.1.H.264-GNOME.mkv",
        "The_Velvet_Underground-The_Complete_Matrix_Tapes-Reissue_Limited_Edition_Boxset-8LP-2019-NOiR",
        "[PMEDIA] T-Pain - The Lost Remixes (2020) Mp3 320kbps",
        "C.S..Lewis~Die.Chroniken.von.Narnia~Der.Koenig.von.Narnia.Bd.3.2013.German.Retail.EPUB.eBook-BitBook",
    ];

    c.bench_function("parse_release_single", |b| {
        b.iter(|| parser.parse_release(black_box(inputs[0].as_bytes())));
    });

    c.bench_function("parse_release_batch_5", |b| {
        b.iter(|| {
            for input in &inputs {
                let _ = parser.parse_release(black_box(input.as_bytes()));
            }
        });
    });

    c.bench_function("parse_tags_only", |b| {
        b.iter(|| parser.parse(black_box(inputs[1].as_bytes())));
    });
}

criterion_group!(benches, bench_parse_release);
criterion_main!(benches);
