use std::io::Write;

use phit_core::{PhitConfig, PhitRng};

use super::OutputFormat;

pub fn run(config: &PhitConfig, count: usize, bytes: Option<usize>, format: OutputFormat) {
    let mut rng = match PhitRng::with_config(config) {
        Ok(rng) => rng,
        Err(e) => {
            eprintln!("Cannot create PRNG: {e}");
            std::process::exit(1);
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = match bytes {
        Some(n) => {
            let mut buf = vec![0u8; n];
            rng.fill(&mut buf);
            write_bytes(&mut out, &buf, format)
        }
        None => (0..count)
            .try_for_each(|_| super::write_value(&mut out, rng.next_u64(), 8, format)),
    };
    if result.is_ok() {
        let _ = out.flush();
    }
    log::debug!("generated {} values", rng.generated());
}

fn write_bytes(out: &mut impl Write, buf: &[u8], format: OutputFormat) -> std::io::Result<()> {
    match format {
        OutputFormat::Raw => out.write_all(buf),
        OutputFormat::Hex => {
            let hex: String = buf.iter().map(|b| format!("{b:02x}")).collect();
            writeln!(out, "{hex}")
        }
        OutputFormat::Decimal => buf.iter().try_for_each(|b| writeln!(out, "{b}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bytes_hex() {
        let mut out = Vec::new();
        write_bytes(&mut out, &[0x00, 0x0f, 0xff], OutputFormat::Hex).unwrap();
        assert_eq!(out, b"000fff\n");
    }

    #[test]
    fn test_write_bytes_raw() {
        let mut out = Vec::new();
        write_bytes(&mut out, &[9, 8, 7], OutputFormat::Raw).unwrap();
        assert_eq!(out, [9, 8, 7]);
    }

    #[test]
    fn test_write_bytes_decimal() {
        let mut out = Vec::new();
        write_bytes(&mut out, &[1, 255], OutputFormat::Decimal).unwrap();
        assert_eq!(out, b"1\n255\n");
    }
}
