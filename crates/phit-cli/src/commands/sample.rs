use std::io::Write;

use phit_core::SampleStream;

use super::OutputFormat;

pub fn run(count: usize, reads: usize, format: OutputFormat) {
    let stream = match SampleStream::new(reads) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Cannot sample: {e}");
            std::process::exit(1);
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for s in stream.take(count) {
        if super::write_value(&mut out, u64::from(s), 4, format).is_err() {
            break; // Broken pipe
        }
    }
    let _ = out.flush();
}
