//! Write a synthetic pitch file with the schema header.

use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use pitchfx::data::schema::{NUM_COLUMNS, PITCH_CLASSES, PITCH_COLUMNS};

/// Mean `(vx0, vy0, vz0, ax, ay, az, px, pz, start_speed)` per class.
const PROFILES: [[f64; 9]; 11] = [
    [-6.0, -137.0, -5.0, 7.0, 30.0, -14.0, -0.1, 2.6, 94.0],  // FF
    [-2.5, -125.0, -3.0, 3.5, 25.0, -33.0, 0.2, 2.0, 85.0],   // SL
    [3.2, -135.0, -2.0, -16.0, 29.5, -22.0, -0.6, 2.4, 92.5], // FT
    [5.0, -123.0, -6.0, -14.0, 26.0, -25.0, -0.4, 1.8, 85.0], // CH
    [3.9, -100.0, -0.6, -1.7, 16.0, -30.0, 0.0, 2.2, 76.0],   // KN
    [0.7, -115.0, 1.5, 4.0, 22.0, -40.0, 0.1, 1.7, 78.0],     // CU
    [1.2, -91.0, 1.4, -1.3, 13.8, -30.6, 0.0, 3.0, 62.0],     // EP
    [9.1, -121.0, -2.8, -11.0, 23.3, -28.0, -0.3, 1.6, 84.0], // FS
    [3.9, -117.5, 1.6, 7.7, 24.3, -40.4, 0.1, 1.7, 79.0],     // KC
    [-3.9, -132.9, -1.5, 18.9, 30.4, -31.6, 0.3, 2.3, 92.0],  // SI
    [7.3, -133.1, -6.8, 2.0, 30.7, -8.2, 0.1, 2.5, 89.0],     // FC
];

/// Box-Muller transform for normal distribution
fn gauss(rng: &mut SmallRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-15);
    let u2: f64 = rng.random();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn pitch_row(rng: &mut SmallRng, row_id: usize, class: usize) -> Vec<String> {
    let p = &PROFILES[class];
    let mut row = vec![String::new(); NUM_COLUMNS];

    let mut set = |name: &str, value: String| {
        if let Some(i) = PITCH_COLUMNS.iter().position(|c| c.name == name) {
            row[i] = value;
        }
    };

    set("des", "Ball".to_string());
    set("id", row_id.to_string());
    set("type", "B".to_string());
    let names = ["vx0", "vy0", "vz0", "ax", "ay", "az", "px", "pz"];
    for (name, mean) in names.iter().zip(p.iter()) {
        let spread = (mean.abs() * 0.05).max(0.2);
        set(*name, format!("{:.3}", gauss(rng, *mean, spread)));
    }
    let start = gauss(rng, p[8], 1.5);
    set("start_speed", format!("{start:.1}"));
    set("end_speed", format!("{:.1}", start - gauss(rng, 7.5, 0.8)));
    set("break_y", "23.8".to_string());
    set("break_angle", format!("{:.1}", gauss(rng, 0.0, 30.0)));
    set("break_length", format!("{:.1}", gauss(rng, 6.0, 2.0).abs()));
    set("pitch_type", PITCH_CLASSES[class].to_string());
    set("pitch_code", class.to_string());
    set("type_confidence", format!("{:.3}", rng.random_range(0.5..1.0)));
    set("zone", rng.random_range(1..=14).to_string());
    row
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output_path = args.next().unwrap_or_else(|| "sample_pitches.csv".to_string());
    let rows: usize = match args.next() {
        Some(n) => n.parse().context("row count must be a number")?,
        None => 1000,
    };

    let mut rng = SmallRng::seed_from_u64(42);
    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;

    writer.write_record(PITCH_COLUMNS.iter().map(|c| c.name))?;
    for row_id in 0..rows {
        let class = rng.random_range(0..PITCH_CLASSES.len());
        writer.write_record(pitch_row(&mut rng, row_id, class))?;
    }
    writer.flush()?;

    log::info!("wrote {rows} pitches to {output_path}");
    println!("Wrote {rows} pitches to {output_path}");
    Ok(())
}
