// (c) 2022 Dimitar Rusev <mitikodev@gmail.com> licensed under GPL-3.0

use std::collections::HashSet;
use std::env;
use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use log::{info, warn, Level, LevelFilter, Log, Metadata, Record};
use rayon::prelude::*;

use arcoder::{
    codec::{self, Options},
    helpers::{cmp, file_entropy},
    Error, Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Compress,
    Decompress,
    Test,
}

#[derive(Debug)]
struct Opts {
    action: Action,
    path: PathBuf,
    output: Option<PathBuf>,
    overwrite: bool,
    stats: bool,
    verbose: bool,
    codec: Options,
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Info => eprintln!("{}", record.args()),
            level => eprintln!("[{level}] {}", record.args()),
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() -> ExitCode {
    let opts = match parse_args(env::args().skip(1)) {
        Ok(opts) => opts,
        Err(msg) if msg.is_empty() => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("{msg}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    let level = if opts.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }

    match dispatch(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> std::result::Result<Opts, String> {
    let mut positional = Vec::new();
    let mut overwrite = false;
    let mut stats = false;
    let mut verbose = false;
    let mut codec = Options::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-f" | "--overwrite" => overwrite = true,
            "-s" | "--stats" => stats = true,
            "-v" | "--verbose" => verbose = true,
            "--strict" => codec.strict = true,
            "--bits" => {
                let value = args.next().ok_or("--bits needs a value")?;
                codec.num_state_bits =
                    value.parse().map_err(|_| format!("Invalid bit count: {value}"))?;
            }
            "-h" | "--help" => return Err(String::new()),
            flag if flag.starts_with('-') => return Err(format!("Unknown option: {flag}")),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let action = match positional.next().as_deref() {
        Some("c") => Action::Compress,
        Some("d") => Action::Decompress,
        Some("t") => Action::Test,
        Some(other) => return Err(format!("Unrecognized action: {other}")),
        None => return Err(String::from("Action not specified")),
    };
    let path = positional.next().map(PathBuf::from).ok_or("Input path not specified")?;
    let output = positional.next().map(PathBuf::from);
    if positional.next().is_some() {
        return Err(String::from("Too many arguments"));
    }

    Ok(Opts { action, path, output, overwrite, stats, verbose, codec })
}

/// Paths of one file's session, absolute and resolved before anything is written.
#[derive(Debug)]
struct Job {
    input: PathBuf,
    compressed: Option<PathBuf>,
    restored: Option<PathBuf>,
}

impl Job {
    fn targets(&self) -> impl Iterator<Item = &PathBuf> {
        self.compressed.iter().chain(self.restored.iter())
    }
}

fn dispatch(opts: &Opts) -> Result<()> {
    let cwd = env::current_dir()?;
    let mut confirm = confirm_overwrite;

    if opts.path.is_dir() {
        if opts.output.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "an explicit output only works with a single input file",
            )
            .into());
        }
        return run_batch(&opts.path, opts, &cwd, &mut confirm);
    }

    if !opts.path.is_file() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "input does not exist").into());
    }
    run(&opts.path, opts.output.as_deref(), opts, &cwd, &mut confirm)
}

fn run(
    file_path: &Path,
    output: Option<&Path>,
    opts: &Opts,
    cwd: &Path,
    confirm: &mut impl FnMut(&Path) -> Result<bool>,
) -> Result<()> {
    let job = plan(file_path, output, opts, cwd)?;
    confirm_targets(&job, opts, confirm)?;
    execute(&job, opts)
}

/// Codes every file of `dir` (shallow), one independent session per file.
///
/// Output names and overwrite answers are settled up front, the parallel part
/// only reads and writes files.
fn run_batch(
    dir: &Path,
    opts: &Opts,
    cwd: &Path,
    confirm: &mut impl FnMut(&Path) -> Result<bool>,
) -> Result<()> {
    let mut files = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    files.retain(|path| path.is_file());
    files.sort();

    let mut failures = 0;
    let mut jobs = Vec::with_capacity(files.len());
    for file in &files {
        match plan(file, None, opts, cwd) {
            Ok(job) => jobs.push(job),
            Err(err) => {
                warn!("{}: {err}", file.display());
                failures += 1;
            }
        }
    }

    // nothing may write over a batch input or another job's output
    let mut taken = files.iter().map(|f| normalize(f)).collect::<io::Result<HashSet<_>>>()?;
    for target in jobs.iter().flat_map(|job| job.targets()) {
        if !taken.insert(target.clone()) {
            return Err(Error::OutputCollision(target.clone()));
        }
    }

    let mut confirmed = Vec::with_capacity(jobs.len());
    for job in jobs {
        match confirm_targets(&job, opts, confirm) {
            Ok(()) => confirmed.push(job),
            Err(err) => {
                warn!("{}: {err}", job.input.display());
                failures += 1;
            }
        }
    }

    failures += confirmed
        .par_iter()
        .map(|job| execute(job, opts).map_err(|err| warn!("{}: {err}", job.input.display())))
        .filter(|res| res.is_err())
        .count();

    if failures > 0 {
        return Err(io::Error::other(format!("{failures} file(s) failed")).into());
    }
    Ok(())
}

/// Absolute form of a path whose last component may not exist yet.
fn normalize(path: &Path) -> io::Result<PathBuf> {
    if path.exists() {
        return path.canonicalize();
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.canonicalize()?,
        _ => env::current_dir()?,
    };
    Ok(match path.file_name() {
        Some(name) => parent.join(name),
        None => parent,
    })
}

fn plan(file_path: &Path, output: Option<&Path>, opts: &Opts, cwd: &Path) -> Result<Job> {
    let default_out = |extension: &str| {
        cwd.join(file_path.file_name().unwrap_or(file_path.as_os_str())).with_extension(extension)
    };
    let explicit = |extension: &str| output.map_or_else(|| default_out(extension), Path::to_path_buf);

    let (compressed, restored) = match opts.action {
        Action::Compress => (Some(explicit("bin")), None),
        Action::Decompress => (None, Some(explicit("orig"))),
        Action::Test => (Some(default_out("bin")), Some(explicit("orig"))),
    };
    let job = Job {
        input: normalize(file_path)?,
        compressed: compressed.as_deref().map(normalize).transpose()?,
        restored: restored.as_deref().map(normalize).transpose()?,
    };

    if job.targets().any(|target| *target == job.input) {
        return Err(Error::OutputIsInput(job.input));
    }
    if let (Some(compressed), Some(restored)) = (&job.compressed, &job.restored) {
        if compressed == restored {
            return Err(Error::OutputCollision(restored.clone()));
        }
    }
    Ok(job)
}

fn confirm_targets(
    job: &Job,
    opts: &Opts,
    confirm: &mut impl FnMut(&Path) -> Result<bool>,
) -> Result<()> {
    for target in job.targets() {
        if target.exists() && !opts.overwrite && !confirm(target.as_path())? {
            return Err(Error::OutputExists(target.clone()));
        }
    }
    Ok(())
}

fn execute(job: &Job, opts: &Opts) -> Result<()> {
    let mut source = job.input.as_path();

    if let Some(compressed) = &job.compressed {
        let timer = Instant::now();
        compress(source, compressed, opts)?;
        info!("Compression took: {:?}", timer.elapsed());
        report(source, compressed, opts)?;
        source = compressed.as_path();
    }

    if let Some(restored) = &job.restored {
        let timer = Instant::now();
        decompress(source, restored, opts)?;
        info!("Decompression took: {:?}", timer.elapsed());
        if opts.action == Action::Test {
            cmp(&job.input, restored)?;
            info!("Compare: OK");
        } else {
            report(source, restored, opts)?;
        }
    }
    Ok(())
}

fn compress(input: &Path, output: &Path, opts: &Opts) -> Result<()> {
    let reader = File::open(input)?;
    let summary = codec::compress(reader, File::create(output)?, &opts.codec)?;
    info!(
        "{} -> {}: {} -> {} bytes",
        input.display(),
        output.display(),
        summary.input_bytes,
        summary.output_bytes
    );
    Ok(())
}

fn decompress(input: &Path, output: &Path, opts: &Opts) -> Result<()> {
    let reader = File::open(input)?;
    let summary = codec::decompress(reader, File::create(output)?, &opts.codec)?;
    info!(
        "{} -> {}: {} -> {} bytes",
        input.display(),
        output.display(),
        summary.input_bytes,
        summary.output_bytes
    );
    Ok(())
}

/// Asks on the terminal, holding both stdio locks for the whole exchange.
fn confirm_overwrite(path: &Path) -> Result<bool> {
    let mut stdout = io::stdout().lock();
    let mut stdin = io::stdin().lock();
    write!(stdout, "Overwrite {}? (y/n) ", path.display())?;
    stdout.flush()?;
    let mut answer = String::new();
    stdin.read_line(&mut answer)?;
    Ok(answer.trim() == "y")
}

fn report(input: &Path, output: &Path, opts: &Opts) -> Result<()> {
    if !opts.stats {
        return Ok(());
    }
    let entropy_input = file_entropy(input)?;
    let entropy_output = file_entropy(output)?;
    let input_size = fs::metadata(input)?.len();
    let output_size = fs::metadata(output)?.len();

    println!("Statistics ({}):", input.display());
    println!("\tEntropy:");
    println!("\t\tInput entropy:\t{entropy_input:.4}");
    println!("\t\tOutput entropy:\t{entropy_output:.4}");
    println!("\tFile size:");
    println!("\t\tInput file size:\t{input_size}");
    println!("\t\tOutput file size:\t{output_size}");
    if output_size > 0 {
        println!("\tSize ratio: {:.3}", input_size as f64 / output_size as f64);
    }
    Ok(())
}

fn print_usage() {
    println!("Usage: arcoder <Action> <Path> [Output] [Options]");
    println!("<Action>: c (compress), d (decompress), t (test = c + d + compare)");
    println!("<Path> can be a single file or a directory");
    println!("Note: Directories are shallow traversed, outputs go to the current directory");
    println!("Options:");
    println!("  -f, --overwrite   Overwrite existing outputs without asking");
    println!("  -s, --stats       Show entropy and size statistics");
    println!("  -v, --verbose     Debug logging");
    println!("      --strict      Check that the input length matches the decoded content");
    println!("      --bits N      Coding precision in bits (default 32)");
}
