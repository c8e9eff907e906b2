use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::process;

use clap::{Arg, ArgAction, ArgMatches, Command};
use encoding_rs::Encoding;
use encoding_rs_io::DecodeReaderBytesBuilder;
use tracing_subscriber::EnvFilter;

use jieba_seg_rs::keywords::top_k_from_request;
use jieba_seg_rs::{CutMode, EngineConfig, Jieba};

const BLUE: &str = "\x1B[1;34m";
const RESET: &str = "\x1B[0m";

// Bounds the front end enforces before a word reaches the dictionary.
const MAX_WORD_WEIGHT: u64 = 5000;
const DEFAULT_POS: &str = "n";

fn io_args() -> [Arg; 4] {
    [
        Arg::new("input")
            .short('i')
            .long("input")
            .value_name("file")
            .help("Read original text from <file>."),
        Arg::new("output")
            .short('o')
            .long("output")
            .value_name("file")
            .help("Write result to <file>."),
        Arg::new("in_enc")
            .long("in-enc")
            .value_name("encoding")
            .default_value("UTF-8")
            .help("Encoding for input"),
        Arg::new("out_enc")
            .long("out-enc")
            .value_name("encoding")
            .default_value("UTF-8")
            .help("Encoding for output"),
    ]
}

fn main() {
    let matches = Command::new("Jieba Rust")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("file")
                .global(true)
                .help("Engine configuration (JSON)."),
        )
        .arg(
            Arg::new("dict")
                .long("dict")
                .value_name("file")
                .global(true)
                .help("Standard dictionary, used when no --config is given."),
        )
        .arg(
            Arg::new("user_dict")
                .long("user-dict")
                .value_name("file")
                .global(true)
                .help("User dictionary to load and append to."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Log loading and segmentation details to stderr."),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("cut")
                .about("Segment text into words")
                .args(io_args())
                .arg(
                    Arg::new("mode")
                        .short('m')
                        .long("mode")
                        .value_name("mode")
                        .default_value("default")
                        .help("Cut mode: [default|full|accurate|nohmm|search]"),
                )
                .arg(
                    Arg::new("delimiter")
                        .short('d')
                        .long("delimiter")
                        .value_name("delimiter")
                        .default_value("/")
                        .help("Delimiter placed between words"),
                ),
        )
        .subcommand(
            Command::new("keywords")
                .about("Extract TF-IDF keywords")
                .args(io_args())
                .arg(
                    Arg::new("count")
                        .short('k')
                        .long("count")
                        .value_name("n")
                        .default_value("20")
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(i64))
                        .help("Number of keywords; zero or negative means 20"),
                )
                .arg(
                    Arg::new("weight")
                        .short('w')
                        .long("weight")
                        .action(ArgAction::SetTrue)
                        .help("Output keywords with weights as JSON"),
                ),
        )
        .subcommand(
            Command::new("add-word")
                .about("Add a word to the user dictionary")
                .arg(Arg::new("word").required(true))
                .arg(
                    Arg::new("freq")
                        .short('f')
                        .long("freq")
                        .value_name("n")
                        .default_value("1")
                        .value_parser(clap::value_parser!(u64))
                        .help("Word weight, 0 to 5000"),
                )
                .arg(
                    Arg::new("pos")
                        .short('p')
                        .long("pos")
                        .value_name("tag")
                        .default_value(DEFAULT_POS)
                        .help("Part-of-speech tag"),
                ),
        )
        .subcommand(
            Command::new("add-stop-word")
                .about("Add a stop word")
                .arg(Arg::new("word").required(true)),
        )
        .about(format!(
            "{BLUE}Jieba Rust: Command Line Chinese Word Segmentation{RESET}"
        ))
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    let jieba = match build_engine(&matches) {
        Ok(jieba) => jieba,
        Err(err) => {
            eprintln!("{BLUE}Failed to initialize: {err}{RESET}");
            process::exit(1);
        }
    };

    let result = match matches.subcommand() {
        Some(("cut", sub)) => run_cut(&jieba, sub),
        Some(("keywords", sub)) => run_keywords(&jieba, sub),
        Some(("add-word", sub)) => run_add_word(&jieba, sub),
        Some(("add-stop-word", sub)) => run_add_stop_word(&jieba, sub),
        _ => Ok(()),
    };
    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "jieba_seg_rs=debug" } else { "jieba_seg_rs=warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

fn build_engine(matches: &ArgMatches) -> Result<Jieba, Box<dyn std::error::Error>> {
    let mut config = match (
        matches.get_one::<String>("config"),
        matches.get_one::<String>("dict"),
    ) {
        (Some(config_file), _) => EngineConfig::from_json_file(config_file)?,
        (None, Some(dict_file)) => EngineConfig::new(dict_file),
        (None, None) => return Err("either --config or --dict is required".into()),
    };
    if let Some(user_dict) = matches.get_one::<String>("user_dict") {
        config = config.user_dict(user_dict);
    }
    Ok(Jieba::from_config(&config)?)
}

fn run_cut(jieba: &Jieba, matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let mode_name = matches.get_one::<String>("mode").map_or("default", String::as_str);
    let mode = CutMode::try_from(mode_name).unwrap_or_else(|_| {
        eprintln!("{BLUE}Unknown mode: {mode_name}, using default{RESET}");
        CutMode::Default
    });
    let delimiter = matches.get_one::<String>("delimiter").map_or("/", String::as_str);

    let input_str = read_input(matches)?;
    let output_str = jieba.cut_and_join(&input_str, mode, delimiter);
    write_output(matches, &output_str)?;

    eprintln!(
        "{BLUE}Segmentation completed ({}): {} -> {}{RESET}",
        mode.name(),
        describe(matches, "input", "<stdin>"),
        describe(matches, "output", "stdout")
    );
    Ok(())
}

fn run_keywords(jieba: &Jieba, matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let count = matches.get_one::<i64>("count").copied().unwrap_or(0);
    let top_k = top_k_from_request(count);
    let input_str = read_input(matches)?;

    let output_str = if matches.get_flag("weight") {
        let keywords = jieba.extract_keywords_weight(&input_str, top_k);
        serde_json::to_string_pretty(&keywords)?
    } else {
        jieba.extract_keywords(&input_str, top_k).join("\n")
    };
    write_output(matches, &output_str)
}

fn run_add_word(jieba: &Jieba, matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let word = matches.get_one::<String>("word").map_or("", |w| w.trim());
    if word.is_empty() {
        return Err("word must not be empty".into());
    }
    let freq = matches.get_one::<u64>("freq").copied().unwrap_or(1);
    if freq > MAX_WORD_WEIGHT {
        return Err(format!("weight {freq} out of range [0, {MAX_WORD_WEIGHT}]").into());
    }
    let pos = matches.get_one::<String>("pos").map_or(DEFAULT_POS, |p| p.trim());
    let pos = if pos.is_empty() { DEFAULT_POS } else { pos };

    if jieba.dictionary().user_dict_path().is_none() {
        eprintln!("{BLUE}No user dictionary configured, the word is not saved{RESET}");
    }
    let existed = jieba.add_dict_word(word, freq, pos)?;
    println!("{}", if existed { "exists" } else { "added" });
    Ok(())
}

fn run_add_stop_word(
    jieba: &Jieba,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let word = matches.get_one::<String>("word").map_or("", |w| w.trim());
    if word.is_empty() {
        return Err("word must not be empty".into());
    }
    let existed = jieba.add_stop_word(word)?;
    println!("{}", if existed { "exists" } else { "added" });
    Ok(())
}

fn describe<'a>(matches: &'a ArgMatches, id: &str, fallback: &'a str) -> &'a str {
    matches.get_one::<String>(id).map_or(fallback, String::as_str)
}

fn read_input(matches: &ArgMatches) -> Result<String, Box<dyn std::error::Error>> {
    let input_file = matches.get_one::<String>("input");
    let mut input: Box<dyn Read> = match input_file {
        Some(file_name) => Box::new(File::open(file_name)?),
        None => {
            eprintln!("{BLUE}Input text, <ctrl-z> or <ctrl-d> to submit:{RESET}");
            Box::new(io::stdin())
        }
    };

    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;

    let in_enc = matches.get_one::<String>("in_enc").map_or("UTF-8", String::as_str);
    if in_enc.eq_ignore_ascii_case("UTF-8") {
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }
    let encoding = Encoding::for_label(in_enc.as_bytes())
        .ok_or_else(|| format!("Unsupported input encoding: {in_enc}"))?;
    let mut decoder = DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .build(&*bytes);
    let mut input_str = String::new();
    decoder.read_to_string(&mut input_str)?;
    Ok(input_str)
}

fn write_output(matches: &ArgMatches, output_str: &str) -> Result<(), Box<dyn std::error::Error>> {
    let output: Box<dyn Write> = match matches.get_one::<String>("output") {
        Some(file_name) => Box::new(File::create(file_name)?),
        None => Box::new(io::stdout()),
    };
    let mut output_buf = BufWriter::new(output);

    let out_enc = matches.get_one::<String>("out_enc").map_or("UTF-8", String::as_str);
    if out_enc.eq_ignore_ascii_case("UTF-8") {
        writeln!(output_buf, "{output_str}")?;
    } else {
        let encoding = Encoding::for_label(out_enc.as_bytes())
            .ok_or_else(|| format!("Unsupported output encoding: {out_enc}"))?;
        let encoded_bytes = encoding.encode(output_str).0;
        output_buf.write_all(&encoded_bytes)?;
        output_buf.write_all(b"\n")?;
    }
    output_buf.flush()?;
    Ok(())
}
