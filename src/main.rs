use clap::{Args, Parser, Subcommand, ValueEnum};
use prodshot::{
    download, logger, source, AspectRatio, Config, GeminiClient, GenerationOptions, Platform,
    Session, SubjectType,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prodshot")]
#[command(about = "Turn a product photo into platform-ready marketing images with Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the prompt that would be sent, without calling the API
    Prompt(OptionArgs),

    /// Ask the text model to improve the custom instruction
    Refine(OptionArgs),

    /// Generate images from a source photo
    Generate(GenerateArgs),
}

#[derive(Args)]
struct OptionArgs {
    /// Target platform
    #[arg(short, long, value_enum, default_value = "mercado-livre")]
    platform: PlatformArg,

    /// What the image should show
    #[arg(short, long, value_enum, default_value = "object")]
    subject: SubjectArg,

    /// Aspect ratio (1:1, 16:9, 9:16, 4:3, 3:4); defaults to the platform's
    #[arg(short, long)]
    aspect_ratio: Option<AspectRatio>,

    /// Extra instruction appended to the prompt
    #[arg(short, long, default_value = "")]
    instruction: String,
}

impl OptionArgs {
    fn to_options(&self) -> GenerationOptions {
        let options = GenerationOptions::new()
            .with_platform(self.platform.into())
            .with_subject_type(self.subject.into())
            .with_custom_instruction(self.instruction.clone());
        match self.aspect_ratio {
            Some(ratio) => options.with_aspect_ratio(ratio),
            None => options,
        }
    }
}

#[derive(Args)]
struct GenerateArgs {
    #[command(flatten)]
    options: OptionArgs,

    /// Source image: file path, http(s) URL or data URL
    #[arg(long)]
    image: String,

    /// Number of images (1-5)
    #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=5))]
    count: u8,

    /// Refine the instruction before generating
    #[arg(long)]
    refine: bool,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    MercadoLivre,
    Facebook,
    Instagram,
    Tiktok,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::MercadoLivre => Platform::MercadoLivre,
            PlatformArg::Facebook => Platform::Facebook,
            PlatformArg::Instagram => Platform::Instagram,
            PlatformArg::Tiktok => Platform::TikTok,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SubjectArg {
    Object,
    Person,
}

impl From<SubjectArg> for SubjectType {
    fn from(arg: SubjectArg) -> Self {
        match arg {
            SubjectArg::Object => SubjectType::Object,
            SubjectArg::Person => SubjectType::PersonWithProduct,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let log_config = if cli.json_logs {
        logger::LoggerConfig::production()
    } else if cli.verbose {
        logger::LoggerConfig::development()
    } else {
        logger::LoggerConfig::default()
    };
    logger::init_with_config(log_config)?;

    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    }

    let config = Config::from_env();
    logger::log_config_info(&config);

    match cli.command {
        Commands::Prompt(args) => {
            println!("{}", prodshot::compose(&args.to_options(), true));
        }
        Commands::Refine(args) => {
            let client = GeminiClient::new(config.gemini)?;
            let mut session = Session::new();
            session.with_options(args.to_options())?;
            let refined = session.refine(&client).await?;
            println!("{}", refined);
        }
        Commands::Generate(args) => {
            let client = GeminiClient::new(config.gemini.clone())?;
            let source = source::load(&args.image, &config.fetch).await?;

            let mut session = Session::new();
            session
                .with_options(args.options.to_options().with_requested_count(args.count))?
                .with_source(source)?;

            if args.refine {
                let refined = session.refine(&client).await?;
                log::info!("✨ Refined instruction: {}", refined);
            }

            log::debug!("Prompt: {}", session.prompt());
            let images = session.generate(&client).await?;
            for path in download::save_all(images, &args.out).await? {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
