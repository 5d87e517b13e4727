use std::path::PathBuf;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use ndarray::Array2;

use rusty_sun::map::loader::save_parquet;
use rusty_sun::map::{GenericMap, MapSequence, MetaDict};

const SIZE: usize = 128;
/// Disk radius in pixels.
const RADIUS: f64 = 50.0;
/// Arcsec per pixel at full resolution.
const CDELT: f64 = 4.8;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One instrument the generator imitates.
struct Channel {
    telescop: &'static str,
    instrume: &'static str,
    wavelnth: i64,
    /// Quiet-disk brightness.
    level: f64,
    /// Mask the pixels off the disk.
    mask_off_disk: bool,
}

const CHANNELS: [Channel; 2] = [
    Channel {
        telescop: "SDO/AIA",
        instrume: "AIA_3",
        wavelnth: 171,
        level: 800.0,
        mask_off_disk: false,
    },
    Channel {
        telescop: "SOHO",
        instrume: "EIT",
        wavelnth: 195,
        level: 300.0,
        mask_off_disk: true,
    },
];

/// A limb-brightened disk with an active region that drifts with rotation.
fn render(channel: &Channel, frame: usize, rng: &mut SimpleRng) -> (Array2<f64>, Array2<bool>) {
    let centre = (SIZE as f64 - 1.0) / 2.0;
    let region = (centre - 20.0 + 4.0 * frame as f64, centre + 10.0);

    let data = Array2::from_shape_fn((SIZE, SIZE), |(r, c)| {
        let (dx, dy) = (c as f64 - centre, r as f64 - centre);
        let rho = (dx * dx + dy * dy).sqrt() / RADIUS;
        let background = if rho <= 1.0 {
            channel.level * (1.0 + 0.5 * rho.powi(4))
        } else {
            0.05 * channel.level * (-(rho - 1.0) * 8.0).exp()
        };
        let d2 = (c as f64 - region.0).powi(2) + (r as f64 - region.1).powi(2);
        let active = 4.0 * channel.level * (-d2 / (2.0 * 6.0f64.powi(2))).exp();
        (background + active + rng.gauss(0.0, 0.02 * channel.level)).max(0.0)
    });
    let mask = Array2::from_shape_fn((SIZE, SIZE), |(r, c)| {
        let (dx, dy) = (c as f64 - centre, r as f64 - centre);
        (dx * dx + dy * dy).sqrt() > RADIUS * 1.05
    });
    (data, mask)
}

fn header(channel: &Channel, date: &str) -> MetaDict {
    let mut meta = MetaDict::new();
    meta.insert("telescop", channel.telescop);
    meta.insert("instrume", channel.instrume);
    meta.insert("wavelnth", channel.wavelnth);
    meta.insert("date-obs", date);
    meta.insert("naxis1", SIZE as i64);
    meta.insert("naxis2", SIZE as i64);
    meta.insert("cdelt1", CDELT);
    meta.insert("cdelt2", CDELT);
    meta.insert("crpix1", (SIZE as f64 + 1.0) / 2.0);
    meta.insert("crpix2", (SIZE as f64 + 1.0) / 2.0);
    meta.insert("cunit1", "arcsec");
    meta.insert("cunit2", "arcsec");
    meta.insert("rsun_obs", RADIUS * CDELT);
    meta
}

fn main() -> Result<()> {
    env_logger::init();

    let output: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_maps.parquet"));

    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2011, 6, 7)
        .and_then(|d| d.and_hms_opt(6, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("invalid start date"))?;

    let mut maps = Vec::new();
    for frame in 0..8 {
        let channel = &CHANNELS[frame % CHANNELS.len()];
        let date = (start + Duration::minutes(12 * frame as i64))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();
        let (data, mask) = render(channel, frame, &mut rng);
        let meta = header(channel, &date);
        let map = if channel.mask_off_disk {
            GenericMap::with_mask(data, mask, meta)?
        } else {
            GenericMap::new(data, meta)
        };
        maps.push(map);
    }

    let sequence = MapSequence::new(maps);
    save_parquet(&output, &sequence)?;
    println!("Wrote {sequence} to {}", output.display());
    Ok(())
}
