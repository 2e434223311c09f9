use std::env;
use std::path::PathBuf;

use semgen_generate::{GenerateOptions, Generator};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let mut model_path: Option<PathBuf> = None;
    let mut out: Option<PathBuf> = None;
    let mut samples = 1000_u64;
    let mut options = GenerateOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => out = args.next().map(PathBuf::from),
            "--samples" => samples = args.next().ok_or("missing --samples value")?.parse()?,
            "--seed" => options.seed = Some(args.next().ok_or("missing --seed value")?.parse()?),
            _ => {
                if model_path.is_none() {
                    model_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let model_path = model_path.ok_or("missing model path")?;
    let mut generator = Generator::from_path(&model_path, options)?;
    let report = generator.generate(samples, true, out.as_deref())?;

    print!("{}", generator.describe_realized_model()?);
    println!(
        "wrote {} rows to {}",
        report.rows_written,
        report.path.display()
    );
    Ok(())
}
