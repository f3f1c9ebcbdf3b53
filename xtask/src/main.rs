use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_BINARIES: [&str; 2] = ["deploy_handler", "pipeline_notifier"];
const PACKAGE_ENTRY_NAME: &str = "package.zip";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the static-site deployment workspace",
    long_about = "A unified CLI for packaging the deployment Lambdas, building\n\
                  site artifacts, and running CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and package Rust Lambda artifacts for infrastructure inputs
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory receiving the packaged zips
        #[arg(long, default_value = "dist")]
        dist_dir: PathBuf,
    },
    /// Wrap a built site directory into a deployable build artifact
    SiteArtifact {
        /// Directory holding the built site
        #[arg(long)]
        source: PathBuf,
        /// Output artifact path
        #[arg(long, default_value = "artifact.zip")]
        output: PathBuf,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Tests for every workspace crate
    Test,
    /// Run lint + test
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_serverless_lambdas(target: &str, profile: BuildProfile, dist_dir: &Path) {
    ensure_rust_target_installed(target);

    step("Build serverless lambda binaries");

    let mut cargo_args = vec!["build", "-p", "site_deploy_lambda", "--target", target];
    for binary in LAMBDA_BINARIES {
        cargo_args.push("--bin");
        cargo_args.push(binary);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifacts");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    fs::create_dir_all(dist_dir).expect("failed to create lambda dist directory");

    let mut packaged = Vec::new();
    for binary in LAMBDA_BINARIES {
        let zip_path = dist_dir.join(format!("{binary}.zip"));
        package_lambda_zip(&target_dir.join(binary_name(binary, target)), &zip_path);
        packaged.push(zip_path);
    }

    eprintln!("\nPackaged artifacts:");
    for path in packaged {
        eprintln!("- {}", path.display());
    }
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- serverless-package`"
        );
    }
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

fn package_lambda_zip(binary_path: &Path, zip_path: &Path) {
    if !binary_path.exists() {
        panic!("expected lambda binary at '{}'", binary_path.display());
    }

    let binary = fs::read(binary_path).expect("failed to read lambda binary");
    let file = fs::File::create(zip_path).expect("failed to create lambda zip");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .expect("failed to start bootstrap entry in lambda zip");
    zip.write_all(&binary)
        .expect("failed to write bootstrap entry");
    zip.finish().expect("failed to finish lambda zip");
}

// ── site artifacts ─────────────────────────────────────────────────

/// Builds the two-level artifact the deploy handler expects: an outer zip whose
/// `package.zip` entry holds the site files.
fn build_site_artifact(source: &Path, output: &Path) {
    if !source.is_dir() {
        panic!("site source '{}' is not a directory", source.display());
    }

    let mut files = Vec::new();
    collect_files(source, source, &mut files);
    files.sort();
    if files.is_empty() {
        panic!("site source '{}' contains no files", source.display());
    }

    let mut package = ZipWriter::new(Cursor::new(Vec::new()));
    for relative in &files {
        let body = fs::read(source.join(relative)).expect("failed to read site file");
        add_zip_entry(&mut package, relative, &body);
    }
    let package = package
        .finish()
        .expect("failed to finish package zip")
        .into_inner();

    let file = fs::File::create(output).expect("failed to create artifact zip");
    let mut artifact = ZipWriter::new(file);
    add_zip_entry(&mut artifact, PACKAGE_ENTRY_NAME, &package);
    artifact.finish().expect("failed to finish artifact zip");

    eprintln!(
        "\nPackaged {} site files into {}",
        files.len(),
        output.display()
    );
}

fn collect_files(root: &Path, dir: &Path, files: &mut Vec<String>) {
    let entries = fs::read_dir(dir).expect("failed to read site directory");
    for entry in entries {
        let path = entry.expect("failed to read site directory entry").path();
        if path.is_dir() {
            collect_files(root, &path, files);
            continue;
        }
        let relative = path
            .strip_prefix(root)
            .expect("site file should live under the source root")
            .components()
            .map(|part| part.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push(relative);
    }
}

fn add_zip_entry<W: Write + Seek>(zip: &mut ZipWriter<W>, name: &str, body: &[u8]) {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)
        .expect("failed to start zip entry");
    zip.write_all(body).expect("failed to write zip entry");
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    step("Test site_deploy_core");
    run_cargo(&["test", "-p", "site_deploy_core"]);

    step("Test site_deploy_lambda");
    run_cargo(&["test", "-p", "site_deploy_lambda"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::ServerlessPackage {
            target,
            profile,
            dist_dir,
        } => {
            package_serverless_lambdas(&target, profile, &dist_dir);
        }
        Commands::SiteArtifact { source, output } => {
            build_site_artifact(&source, &output);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::Check => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
