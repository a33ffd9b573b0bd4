use phit_core::self_test;

pub fn run(json: bool) {
    let report = self_test();

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Failed to serialize self test report: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!("phit self test\n");
        for check in &report.checks {
            let mark = if check.passed { "✓" } else { "✗" };
            println!("  {mark} {:<20} {}", check.name, check.details);
        }
        let passed = report.checks.iter().filter(|c| c.passed).count();
        println!("\n  {passed}/{} checks passed", report.checks.len());
    }

    if !report.passed() {
        std::process::exit(1);
    }
}
