use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sbsketch::bitmap::{self, Bitmap};
use sbsketch::raster;

// A noisy bitmap is the worst case for the run collapser: short runs,
// many ops.
fn speckled_bitmap(width: usize, height: usize) -> Bitmap {
    let mut rng = StdRng::seed_from_u64(0x5b);
    let bits = (0..width * height).map(|_| rng.gen_bool(0.4)).collect();
    Bitmap::from_bits(width, height, bits)
}

fn render_pbm(image: &Bitmap) -> String {
    let mut text = format!("P1\n{} {}\n", image.width(), image.height());
    for y in 0..image.height() {
        for x in 0..image.width() {
            text.push(if image.bit(x, y) { '1' } else { '0' });
            text.push(' ');
        }
        text.push('\n');
    }
    text
}

fn bench_rasterize(c: &mut Criterion) {
    // Full wide-panel frame.
    let image = speckled_bitmap(280, 32);
    c.bench_function("rasterize_280x32", |b| {
        b.iter(|| raster::rasterize(black_box(&image)));
    });
}

fn bench_decode(c: &mut Criterion) {
    let text = render_pbm(&speckled_bitmap(64, 64));
    c.bench_function("decode_64x64", |b| {
        b.iter(|| bitmap::decode(black_box(text.as_bytes())).unwrap());
    });
}

fn bench_draw_pipeline(c: &mut Criterion) {
    let text = render_pbm(&speckled_bitmap(32, 32));
    c.bench_function("decode_and_rasterize_32x32", |b| {
        b.iter(|| {
            let image = bitmap::decode(black_box(text.as_bytes())).unwrap();
            raster::rasterize(&image)
        });
    });
}

criterion_group!(benches, bench_rasterize, bench_decode, bench_draw_pipeline);
criterion_main!(benches);
