//! Writes a deterministic synthetic player table as CSV and Parquet.
//!
//! Usage: `generate_sample [OUTPUT_DIR] [ROWS]`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const LEAGUES: [&str; 5] = ["Premier League", "La Liga", "Serie A", "Bundesliga", "Ligue 1"];
const NATIONS: [&str; 10] = [
    "ENG", "ESP", "ITA", "GER", "FRA", "BRA", "ARG", "POR", "NED", "BEL",
];
/// Position codes with a rough share of the squad each.
const POSITIONS: [(&str, u32); 7] = [
    ("GK", 2),
    ("DF", 7),
    ("DF,MF", 1),
    ("MF", 6),
    ("MF,FW", 2),
    ("FW", 4),
    ("FW,MF", 1),
];
const FIRST: [&str; 12] = [
    "Lu", "Ma", "Ra", "Jo", "Ki", "Da", "Se", "To", "Fe", "Al", "Ni", "Ed",
];
const LAST: [&str; 12] = [
    "ran", "vic", "son", "elli", "mann", "ez", "ard", "inho", "sen", "ov", "ier", "ez",
];

#[derive(Debug, Serialize)]
struct PlayerRow {
    #[serde(rename = "Player")]
    player: String,
    #[serde(rename = "Nation")]
    nation: String,
    #[serde(rename = "Pos")]
    pos: String,
    #[serde(rename = "Comp")]
    comp: String,
    #[serde(rename = "Age")]
    age: i64,
    #[serde(rename = "MP")]
    mp: i64,
    #[serde(rename = "Min")]
    min: i64,
    #[serde(rename = "Gls")]
    gls: i64,
    #[serde(rename = "Ast")]
    ast: i64,
}

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }

    /// Poisson draw by inversion; fine for the small means used here.
    fn poisson(&mut self, mean: f64) -> i64 {
        let limit = (-mean).exp();
        let mut k = 0;
        let mut p = self.next_f64();
        while p > limit {
            k += 1;
            p *= self.next_f64();
        }
        k
    }
}

fn pick_position(rng: &mut SimpleRng) -> &'static str {
    let total: u32 = POSITIONS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.below(total as usize) as u32;
    for (pos, weight) in POSITIONS {
        if roll < weight {
            return pos;
        }
        roll -= weight;
    }
    "MF"
}

/// Goals and assists per 90 minutes by primary position.
fn rates(pos: &str) -> (f64, f64) {
    match pos.split(',').next().unwrap_or(pos) {
        "FW" => (0.45, 0.15),
        "MF" => (0.12, 0.18),
        "DF" => (0.04, 0.06),
        _ => (0.0, 0.005),
    }
}

fn generate(rows: usize, rng: &mut SimpleRng) -> Vec<PlayerRow> {
    (0..rows)
        .map(|_| {
            let pos = pick_position(rng);
            let age = 17 + rng.below(21) as i64;
            // about one player in twenty never plays
            let mp = if rng.below(20) == 0 { 0 } else { 1 + rng.below(38) as i64 };
            let min = if mp == 0 {
                0
            } else {
                (mp as f64 * (20.0 + rng.next_f64() * 70.0)).round() as i64
            };
            let (g90, a90) = rates(pos);
            let played = min as f64 / 90.0;
            PlayerRow {
                player: format!(
                    "{}{} {}{}",
                    rng.pick(&FIRST),
                    rng.pick(&LAST),
                    rng.pick(&FIRST),
                    rng.pick(&LAST)
                ),
                nation: rng.pick(&NATIONS).to_string(),
                pos: pos.to_string(),
                comp: rng.pick(&LEAGUES).to_string(),
                age,
                mp,
                min,
                gls: rng.poisson(g90 * played),
                ast: rng.poisson(a90 * played),
            }
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[PlayerRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[PlayerRow]) -> Result<()> {
    let text = |f: fn(&PlayerRow) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let int = |f: fn(&PlayerRow) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("Player", DataType::Utf8, false),
        Field::new("Nation", DataType::Utf8, false),
        Field::new("Pos", DataType::Utf8, false),
        Field::new("Comp", DataType::Utf8, false),
        Field::new("Age", DataType::Int64, false),
        Field::new("MP", DataType::Int64, false),
        Field::new("Min", DataType::Int64, false),
        Field::new("Gls", DataType::Int64, false),
        Field::new("Ast", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(|r| r.player.as_str()),
            text(|r| r.nation.as_str()),
            text(|r| r.pos.as_str()),
            text(|r| r.comp.as_str()),
            int(|r| r.age),
            int(|r| r.mp),
            int(|r| r.min),
            int(|r| r.gls),
            int(|r| r.ast),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));
    let n_rows: usize = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid row count {raw:?}"))?,
        None => 2500,
    };

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let rows = generate(n_rows, &mut rng);

    let csv_path = out_dir.join("players_sample.csv");
    let parquet_path = out_dir.join("players_sample.parquet");
    write_csv(&csv_path, &rows)?;
    write_parquet(&parquet_path, &rows)?;

    log::info!(
        "Wrote {} players to {} and {}",
        rows.len(),
        csv_path.display(),
        parquet_path.display()
    );
    println!("Wrote {} players to {}", rows.len(), out_dir.display());
    Ok(())
}
