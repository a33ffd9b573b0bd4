use std::path::Path;
use std::time::Instant;

use phit_core::{MachineInfo, PhitConfig, PhitRng, SampleStream, detect_machine_info};
use phit_tests::{TestResult, calculate_quality_score, run_all_tests};
use serde::Serialize;

/// Serializable view of one battery result.
#[derive(Debug, Serialize)]
struct TestRecord {
    name: String,
    passed: bool,
    p_value: Option<f64>,
    statistic: f64,
    grade: char,
    details: String,
}

impl From<&TestResult> for TestRecord {
    fn from(t: &TestResult) -> Self {
        Self {
            name: t.name.clone(),
            passed: t.passed,
            p_value: t.p_value,
            statistic: t.statistic,
            grade: t.grade,
            details: t.details.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BatteryReport {
    generated_unix: u64,
    source: String,
    bytes: usize,
    reads: Option<usize>,
    config: PhitConfig,
    machine: MachineInfo,
    score: f64,
    passed: usize,
    total: usize,
    tests: Vec<TestRecord>,
}

pub fn run(
    config: &PhitConfig,
    source: &str,
    bytes: usize,
    reads: usize,
    output_path: Option<&str>,
) {
    println!("🔬 Running test battery on {bytes} bytes of '{source}' output...\n");

    let t0 = Instant::now();
    let data = match collect(config, source, bytes, reads) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Cannot collect '{source}' output: {e}");
            std::process::exit(1);
        }
    };
    let collect_secs = t0.elapsed().as_secs_f64();

    let results = run_all_tests(&data);
    let score = calculate_quality_score(&results);
    let passed = results.iter().filter(|r| r.passed).count();

    println!("{}", "=".repeat(72));
    println!(
        "{:<20} {:>4} {:>6} {:>10} {:>12}",
        "Test", "Pass", "Grade", "p-value", "Statistic"
    );
    println!("{}", "-".repeat(72));
    for t in &results {
        let ok = if t.passed { "✓" } else { "✗" };
        let pval = t
            .p_value
            .map(|p| format!("{p:.6}"))
            .unwrap_or_else(|| "—".to_string());
        println!(
            "{:<20} {:>4} {:>6} {:>10} {:>12.4}",
            t.name, ok, t.grade, pval, t.statistic
        );
    }
    println!("{}", "-".repeat(72));
    println!(
        "Score: {score:.1}/100 (grade {}), {passed}/{} passed, collected in {collect_secs:.2}s",
        super::grade_from_score(score),
        results.len()
    );

    if let Some(path) = output_path {
        let report = BatteryReport {
            generated_unix: unix_now(),
            source: source.to_string(),
            bytes: data.len(),
            reads: (source == "samples").then_some(reads),
            config: *config,
            machine: detect_machine_info(),
            score,
            passed,
            total: results.len(),
            tests: results.iter().map(TestRecord::from).collect(),
        };
        if let Err(e) = super::write_json(Path::new(path), &report) {
            eprintln!("Failed to write report to {path}: {e}");
            std::process::exit(1);
        }
        println!("\n📄 Report saved to: {path}");
    }
}

/// Gather `bytes` bytes from the named stream.
fn collect(
    config: &PhitConfig,
    source: &str,
    bytes: usize,
    reads: usize,
) -> Result<Vec<u8>, String> {
    match source {
        "prng" => {
            let mut rng = PhitRng::with_config(config).map_err(|e| e.to_string())?;
            let mut data = vec![0u8; bytes];
            rng.fill(&mut data);
            Ok(data)
        }
        "samples" => {
            let stream = SampleStream::new(reads).map_err(|e| e.to_string())?;
            let samples: Vec<u32> = stream.take(bytes.div_ceil(4)).collect();
            let mut data = phit_core::samples_to_bytes(&samples);
            data.truncate(bytes);
            Ok(data)
        }
        other => Err(format!("unknown source '{other}' (expected prng or samples)")),
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
