//! # Favicon 生成工具 — 命令行入口
//!
//! 本文件只负责参数解析、构造 `GenerationRequest` 与结果输出。
//! 业务逻辑全部在 `favicon` 模块中，详见 `lib.rs` 架构文档。

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use favicon_generator::error::AppError;
use favicon_generator::favicon::{
    FaviconConfig, FaviconProfile, FaviconService, GenerationRequest, IcoDirectory, SizePreset,
    SizeSpec,
};

#[derive(Parser)]
#[command(name = "favicon-generator")]
#[command(about = "Generate multi-size ICO favicons and PNG sets from a source image")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resample a source image into an ICO container and/or PNG files
    Generate {
        /// Source image (PNG or any format the image crate decodes)
        source: PathBuf,
        /// Output directory (defaults to the source's directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Base file name (defaults to the source file stem)
        #[arg(short, long)]
        name: Option<String>,
        /// Comma separated sizes, e.g. "16,32,48"
        #[arg(long, conflicts_with = "preset")]
        sizes: Option<String>,
        /// Preset: all | all-png | 16 | 32 | 48
        #[arg(long, default_value = "all")]
        preset: String,
        /// Also write one PNG per size
        #[arg(long)]
        png: bool,
        /// Skip the ICO container
        #[arg(long)]
        no_ico: bool,
        /// Generation profile: quality | balanced | compact
        #[arg(long)]
        profile: Option<String>,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the generation report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the directory of an existing ICO file
    Inspect {
        /// ICO file
        ico: PathBuf,
        /// Print the directory as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            source,
            out,
            name,
            sizes,
            preset,
            png,
            no_ico,
            profile,
            config,
            json,
        } => {
            run_generate(GenerateArgs {
                source,
                out,
                name,
                sizes,
                preset,
                png,
                no_ico,
                profile,
                config,
                json,
            })
            .await
        }
        Commands::Inspect { ico, json } => run_inspect(&ico, json),
    };

    if let Err(err) = result {
        log::error!("❌ {} ({})", err, err.code());
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

struct GenerateArgs {
    source: PathBuf,
    out: Option<PathBuf>,
    name: Option<String>,
    sizes: Option<String>,
    preset: String,
    png: bool,
    no_ico: bool,
    profile: Option<String>,
    config: Option<PathBuf>,
    json: bool,
}

async fn run_generate(args: GenerateArgs) -> Result<(), AppError> {
    let mut config = match &args.config {
        Some(path) => FaviconConfig::load_from_file(path)?,
        None => FaviconConfig::default(),
    };
    if let Some(profile) = &args.profile {
        config.apply_profile(profile.parse::<FaviconProfile>()?);
    }

    let request = build_request(&args)?;
    let service = FaviconService::with_config(config);
    let report = service.generate(request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for path in report.written_files() {
        println!("Created {}", path.display());
    }
    Ok(())
}

fn build_request(args: &GenerateArgs) -> Result<GenerationRequest, AppError> {
    let preset = match &args.sizes {
        Some(list) => SizePreset::Custom(SizeSpec::parse_list(list)),
        None => args.preset.parse::<SizePreset>()?,
    };
    let (sizes, preset_ico, preset_png) = preset.resolve();

    let output_dir = match &args.out {
        Some(dir) => dir.clone(),
        None => args
            .source
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let base_name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .source
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .ok_or_else(|| AppError::Argument("无法从源文件名推导输出文件名".to_string()))?,
    };

    Ok(GenerationRequest {
        source_path: args.source.clone(),
        output_dir,
        base_name,
        sizes,
        emit_ico: preset_ico && !args.no_ico,
        emit_png: preset_png || args.png,
    })
}

fn run_inspect(path: &Path, json: bool) -> Result<(), AppError> {
    let directory = IcoDirectory::read_file(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&directory)?);
        return Ok(());
    }

    println!("{} ({} entries)", path.display(), directory.entries.len());
    for (index, entry) in directory.entries.iter().enumerate() {
        println!(
            "  #{index}: {}x{} {}bpp {:?} {} bytes @ {}",
            entry.width,
            entry.height,
            entry.bit_count,
            entry.payload,
            entry.bytes_in_resource,
            entry.image_offset
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use favicon_generator::favicon::{FaviconError, STANDARD_SIZES};

    fn args(source: &str) -> GenerateArgs {
        GenerateArgs {
            source: PathBuf::from(source),
            out: None,
            name: None,
            sizes: None,
            preset: "all".to_string(),
            png: false,
            no_ico: false,
            profile: None,
            config: None,
            json: false,
        }
    }

    #[test]
    fn defaults_come_from_source_path() {
        let request = build_request(&args("assets/logo.png")).expect("request");
        assert_eq!(request.output_dir, PathBuf::from("assets"));
        assert_eq!(request.base_name, "logo");
        assert_eq!(request.sizes.to_vec(), STANDARD_SIZES.to_vec());
        assert!(request.emit_ico && !request.emit_png);
    }

    #[test]
    fn bare_file_name_writes_to_current_directory() {
        let request = build_request(&args("logo.png")).expect("request");
        assert_eq!(request.output_dir, PathBuf::from("."));
    }

    #[test]
    fn explicit_out_and_name_win() {
        let mut cli = args("assets/logo.png");
        cli.out = Some(PathBuf::from("dist"));
        cli.name = Some("favicon".to_string());
        let request = build_request(&cli).expect("request");
        assert_eq!(request.ico_path(), PathBuf::from("dist").join("favicon.ico"));
    }

    #[test]
    fn preset_all_png_emits_both() {
        let mut cli = args("logo.png");
        cli.preset = "all-png".to_string();
        let request = build_request(&cli).expect("request");
        assert!(request.emit_ico && request.emit_png);
    }

    #[test]
    fn single_size_preset() {
        let mut cli = args("logo.png");
        cli.preset = "48".to_string();
        let request = build_request(&cli).expect("request");
        assert_eq!(request.sizes.to_vec(), vec![48]);
    }

    #[test]
    fn sizes_list_overrides_preset() {
        let mut cli = args("logo.png");
        cli.preset = "not-a-preset".to_string();
        cli.sizes = Some("32,16,16,abc".to_string());
        let request = build_request(&cli).expect("request");
        assert_eq!(request.sizes.to_vec(), vec![16, 32]);
        assert!(request.emit_ico);
    }

    #[test]
    fn png_and_no_ico_flags_merge_with_preset() {
        let mut cli = args("logo.png");
        cli.png = true;
        cli.no_ico = true;
        let request = build_request(&cli).expect("request");
        assert!(!request.emit_ico && request.emit_png);

        let mut cli = args("logo.png");
        cli.preset = "all-png".to_string();
        cli.no_ico = true;
        let request = build_request(&cli).expect("request");
        assert!(!request.emit_ico && request.emit_png);
    }

    #[test]
    fn unknown_preset_is_invalid_request() {
        let mut cli = args("logo.png");
        cli.preset = "huge".to_string();
        let err = build_request(&cli).expect_err("unknown preset");
        assert!(matches!(err, AppError::Favicon(FaviconError::InvalidRequest(_))));
        assert_eq!(err.code(), "invalid_request");
    }
}
