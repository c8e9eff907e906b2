use clap::{Arg, Command};
use jieba_seg_rs::{Dictionary, HmmModel};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

const ZSTD_LEVEL: i32 = 19;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    const BLUE: &str = "\x1B[1;34m"; // Bold Blue
    const RESET: &str = "\x1B[0m"; // Reset color

    let matches = Command::new("Dictionary Generator")
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("format")
                .default_value("zstd")
                .help("Action: [zstd|validate|hmm-json]"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("filename")
                .help("Dictionary, IDF or model file to compress or validate."),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("filename")
                .help("Write generated file to <filename>. If not specified, a default filename is used."),
        )
        .about(format!(
            "{BLUE}Dict Generator: Command Line Dictionary Tool for jieba-seg-rs{RESET}"
        ))
        .get_matches();

    let dict_format = matches.get_one::<String>("format").map(String::as_str);
    let input_file = matches.get_one::<String>("input").map(String::as_str);
    let output_file = matches.get_one::<String>("output").map(String::as_str);

    match (dict_format, input_file) {
        (Some("zstd"), Some(input)) => {
            let default_output = format!("{input}.zst");
            let output = output_file.unwrap_or(&default_output);
            compress(Path::new(input), Path::new(output))?;
            eprintln!("{BLUE}File saved in ZSTD format at: {output}{RESET}");
        }
        (Some("validate"), Some(input)) => {
            let dictionary = Dictionary::from_path(input)?;
            eprintln!(
                "{BLUE}Dictionary OK: {} entries, total frequency {}{RESET}",
                dictionary.len(),
                dictionary.total_frequency()
            );
        }
        (Some("hmm-json"), _) => {
            // Re-emits a model file, or the built-in tables when no input is given.
            let model = match input_file {
                Some(input) => HmmModel::from_path(input)?,
                None => HmmModel::default(),
            };
            let output = output_file.unwrap_or("hmm_model.json");
            let file = File::create(output)?;
            serde_json::to_writer_pretty(file, &model.to_tables())?;
            eprintln!("{BLUE}HMM model saved in JSON format at: {output}{RESET}");
        }
        (Some("zstd" | "validate"), None) => {
            eprintln!("{BLUE}An --input file is required{RESET}");
        }
        (other, _) => {
            let format_str = other.unwrap_or("unknown");
            eprintln!("{BLUE}Unsupported format: {format_str}{RESET}");
        }
    }

    Ok(())
}

fn compress(input: &Path, output: &Path) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(input)?);
    let writer = BufWriter::new(File::create(output)?);
    let mut encoder = zstd::stream::write::Encoder::new(writer, ZSTD_LEVEL)?;
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?.flush()
}
