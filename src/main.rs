use std::env;
use std::error::Error;
use std::fs::read_to_string;

use tracing::info;
use tracing_subscriber::EnvFilter;
use vocabulary::{RegexTokenizer, Tokenizer};

const DEFAULT_VOCAB_SIZE: usize = 1000;
const DEFAULT_SAMPLE: &str = "Hello've world12345 how's are you!!!?";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = env::args().skip(1);
    let Some(corpus) = args.next() else {
        return Err("usage: vocabulary <corpus> [vocab size] [text]".into());
    };
    let vocab_size = match args.next() {
        Some(size) => size.parse()?,
        None => DEFAULT_VOCAB_SIZE,
    };
    let sample = args.next().unwrap_or_else(|| DEFAULT_SAMPLE.to_string());

    let train_text = read_to_string(&corpus)?;
    let mut tokenizer = RegexTokenizer::new();
    let added = tokenizer.train(&train_text, vocab_size)?;
    info!(
        corpus = %corpus,
        added,
        len = tokenizer.vocabulary().len(),
        "built vocabulary"
    );

    let enc = tokenizer.encode(&sample)?;
    let dec = tokenizer.decode(&enc)?;

    println!("{:?}", enc);
    println!("{:?}", dec);
    Ok(())
}
