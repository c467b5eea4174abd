use clap::Parser;
use std::fs;
use std::io::{self, Read};

/// Convert romaji and katakana text to hiragana, one line at a time.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input text file. If not provided, reads from stdin.
    #[arg(short, long)]
    input: Option<String>,

    /// Skip NFKC folding and only convert kana/romaji.
    #[arg(long)]
    raw: bool,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let content = if let Some(input_path) = args.input {
        fs::read_to_string(input_path)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    for line in content.lines() {
        let converted = if args.raw {
            kamatama_kana::to_hiragana(line)
        } else {
            kamatama_kana::normalize(line)
        };
        println!("{converted}");
    }

    Ok(())
}
