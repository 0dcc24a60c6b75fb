use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick from `(item, weight)` pairs.
    fn pick<'a>(&mut self, weighted: &[(&'a str, f64)]) -> &'a str {
        let total: f64 = weighted.iter().map(|(_, w)| w).sum();
        let mut r = self.next_f64() * total;
        for &(item, w) in weighted {
            if r < w {
                return item;
            }
            r -= w;
        }
        weighted.last().map_or("", |&(item, _)| item)
    }

    fn int(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_u64() % (hi - lo + 1) as u64) as i64
    }
}

fn clamp_score(x: f64) -> i64 {
    x.round().clamp(0.0, 100.0) as i64
}

// ---------------------------------------------------------------------------
// Students.csv
// ---------------------------------------------------------------------------

const EDUCATION: &[(&str, f64)] = &[
    ("some high school", 0.18),
    ("high school", 0.20),
    ("some college", 0.22),
    ("associate's degree", 0.22),
    ("bachelor's degree", 0.12),
    ("master's degree", 0.06),
];

fn education_bonus(level: &str) -> f64 {
    match level {
        "some high school" => -3.0,
        "high school" => -2.0,
        "bachelor's degree" => 3.0,
        "master's degree" => 5.0,
        _ => 0.0,
    }
}

fn write_scores(path: &str, rows: usize, rng: &mut SimpleRng) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "gender",
        "race/ethnicity",
        "parental level of education",
        "lunch",
        "test preparation course",
        "math score",
        "reading score",
        "writing score",
        "score",
    ])?;

    for _ in 0..rows {
        let gender = rng.pick(&[("female", 0.52), ("male", 0.48)]);
        let group = rng.pick(&[
            ("group A", 0.09),
            ("group B", 0.19),
            ("group C", 0.32),
            ("group D", 0.26),
            ("group E", 0.14),
        ]);
        let education = rng.pick(EDUCATION);
        let lunch = rng.pick(&[("standard", 0.65), ("free/reduced", 0.35)]);
        let prep = rng.pick(&[("none", 0.64), ("completed", 0.36)]);

        let prep_bonus = if prep == "completed" { 6.0 } else { 0.0 };
        let lunch_bonus = if lunch == "standard" { 4.0 } else { -4.0 };
        let base = 66.0 + education_bonus(education) + prep_bonus + lunch_bonus;
        let verbal = if gender == "female" { 4.0 } else { -3.0 };
        let math = clamp_score(rng.gauss(base - verbal * 0.8, 13.0));
        let reading = clamp_score(rng.gauss(base + verbal, 12.0));
        let writing = clamp_score(rng.gauss(base + verbal * 1.2, 12.5));
        let score = clamp_score((math + reading + writing) as f64 / 3.0);

        writer.write_record([
            gender.to_string(),
            group.to_string(),
            education.to_string(),
            lunch.to_string(),
            prep.to_string(),
            math.to_string(),
            reading.to_string(),
            writing.to_string(),
            score.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Students_AI_Usage.csv / .parquet
// ---------------------------------------------------------------------------

const USE_CASES: &[&str] = &[
    "Assignments",
    "Coding",
    "Exam Prep",
    "Writing",
    "Research",
    "Learning new topics",
    "Projects",
    "Doubt Solving",
];

#[derive(Default)]
struct AiColumns {
    stream: Vec<String>,
    year: Vec<i64>,
    hours: Vec<f64>,
    use_cases: Vec<Option<String>>,
    trust: Vec<i64>,
    impact: Vec<i64>,
    allowed: Vec<String>,
    tool: Vec<String>,
    awareness: Vec<i64>,
    pay: Vec<String>,
    device: Vec<String>,
    internet: Vec<String>,
}

impl AiColumns {
    const HEADERS: [&'static str; 12] = [
        "Stream",
        "Year_of_Study",
        "Daily_Usage_Hours",
        "Use_Cases",
        "Trust_in_AI_Tools",
        "Impact_on_Grades",
        "Do_Professors_Allow_Use",
        "Preferred_AI_Tool",
        "Awareness_Level",
        "Willing_to_Pay_for_Access",
        "Device_Used",
        "Internet_Access",
    ];

    fn generate(rows: usize, rng: &mut SimpleRng) -> Self {
        let mut c = AiColumns::default();
        for _ in 0..rows {
            let stream = rng.pick(&[
                ("Engineering", 0.30),
                ("Science", 0.20),
                ("Commerce", 0.15),
                ("Arts", 0.12),
                ("Medical", 0.13),
                ("Law", 0.10),
            ]);
            let year = rng.int(1, 4);
            let hours = (rng.gauss(2.2 + 0.3 * year as f64, 1.1).clamp(0.2, 8.0) * 10.0).round() / 10.0;
            let allowed = rng.pick(&[("Yes", 0.55), ("No", 0.45)]);
            let trust = rng.int(1, 5);
            let allowed_bonus = if allowed == "Yes" { 1.0 } else { -0.5 };
            let impact_mean = allowed_bonus + 0.2 * (trust - 3) as f64;
            let impact = rng.gauss(impact_mean, 1.4).round().clamp(-3.0, 3.0) as i64;

            // About one answer in fifty leaves the free-text column empty.
            let use_cases = (!rng.chance(0.02)).then(|| {
                let n = rng.int(1, 3) as usize;
                let mut picked: Vec<&str> = Vec::with_capacity(n);
                while picked.len() < n {
                    let case = USE_CASES[rng.int(0, USE_CASES.len() as i64 - 1) as usize];
                    if !picked.contains(&case) {
                        picked.push(case);
                    }
                }
                picked.join(", ")
            });

            c.stream.push(stream.to_string());
            c.year.push(year);
            c.hours.push(hours);
            c.use_cases.push(use_cases);
            c.trust.push(trust);
            c.impact.push(impact);
            c.allowed.push(allowed.to_string());
            c.tool.push(
                rng.pick(&[
                    ("ChatGPT", 0.45),
                    ("Gemini", 0.18),
                    ("Copilot", 0.15),
                    ("Claude", 0.10),
                    ("Perplexity", 0.07),
                    ("Other", 0.05),
                ])
                .to_string(),
            );
            c.awareness.push(rng.int(1, 10));
            c.pay.push(rng.pick(&[("Yes", 0.3), ("No", 0.7)]).to_string());
            c.device.push(rng.pick(&[("Mobile", 0.5), ("Laptop", 0.4), ("Tablet", 0.1)]).to_string());
            c.internet.push(rng.pick(&[("Good", 0.6), ("Poor", 0.25), ("High", 0.15)]).to_string());
        }
        c
    }

    fn len(&self) -> usize {
        self.stream.len()
    }

    fn write_csv(&self, path: &str) -> Result<()> {
        let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
        writer.write_record(Self::HEADERS)?;
        for i in 0..self.len() {
            writer.write_record([
                self.stream[i].clone(),
                self.year[i].to_string(),
                self.hours[i].to_string(),
                self.use_cases[i].clone().unwrap_or_default(),
                self.trust[i].to_string(),
                self.impact[i].to_string(),
                self.allowed[i].clone(),
                self.tool[i].clone(),
                self.awareness[i].to_string(),
                self.pay[i].clone(),
                self.device[i].clone(),
                self.internet[i].clone(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_parquet(&self, path: &str) -> Result<()> {
        let utf8 = |v: &[String]| -> ArrayRef {
            Arc::new(StringArray::from(v.iter().map(String::as_str).collect::<Vec<_>>()))
        };
        let int = |v: &[i64]| -> ArrayRef { Arc::new(Int64Array::from(v.to_vec())) };

        let columns: Vec<ArrayRef> = vec![
            utf8(&self.stream),
            int(&self.year),
            Arc::new(Float64Array::from(self.hours.clone())),
            Arc::new(StringArray::from(self.use_cases.clone())),
            int(&self.trust),
            int(&self.impact),
            utf8(&self.allowed),
            utf8(&self.tool),
            int(&self.awareness),
            utf8(&self.pay),
            utf8(&self.device),
            utf8(&self.internet),
        ];
        let fields: Vec<Field> = Self::HEADERS
            .iter()
            .zip(&columns)
            .map(|(name, col)| Field::new(*name, col.data_type().clone(), *name == "Use_Cases"))
            .collect();
        let schema = Arc::new(Schema::new(fields));

        let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
        let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
        let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
        writer.write(&batch).context("writing batch")?;
        writer.close().context("closing parquet writer")?;
        Ok(())
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let scores_path = "Students.csv";
    let scores_rows = 1000;
    write_scores(scores_path, scores_rows, &mut rng)?;
    println!("Wrote {scores_rows} students to {scores_path}");

    let ai = AiColumns::generate(500, &mut rng);
    ai.write_csv("Students_AI_Usage.csv")?;
    ai.write_parquet("Students_AI_Usage.parquet")?;
    println!(
        "Wrote {} survey answers to Students_AI_Usage.csv and Students_AI_Usage.parquet",
        ai.len()
    );
    Ok(())
}
