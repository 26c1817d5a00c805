use clap::Parser;
use sigep_batch::config::{Cli, Command, LogFormat};
use sigep_batch::utils::error::ErrorCategory;
use sigep_batch::utils::logger;
use sigep_batch::utils::validation::Validate;
use sigep_batch::{
    ArchiveRenderer, BatchFile, DocumentRenderer, HttpRegistrar, PostingSession, Registrar,
    SessionConfig, SigepError,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = SessionConfig::from_file(&cli.config).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    let (format, verbose) = match &config {
        Ok(config) => (config.log_format(), cli.verbose || config.verbose()),
        Err(_) => (LogFormat::Compact, cli.verbose),
    };
    let format = if cli.json_logs { LogFormat::Json } else { format };
    logger::init_logger(format, verbose);

    tracing::info!("Starting sigep-batch CLI");

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(exit_code(&e));
        }
    };

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!("❌ Command failed: {} (Category: {:?})", e, e.category());
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

fn exit_code(e: &SigepError) -> i32 {
    match e.category() {
        ErrorCategory::Input | ErrorCategory::Lifecycle => 1,
        ErrorCategory::Remote => 2,
        ErrorCategory::Configuration | ErrorCategory::System => 3,
    }
}

async fn run(command: Command, config: &SessionConfig) -> sigep_batch::Result<()> {
    let registrar = HttpRegistrar::from_config(config)?;
    let mut session = PostingSession::from_config(config, registrar, ArchiveRenderer::new())?;

    match command {
        Command::Close {
            batch,
            output_dir,
            custom_id,
            metrics,
            dry_run,
        } => {
            BatchFile::from_file(&batch)?.apply(&mut session)?;
            tracing::info!(packages = session.packages().len(), "Batch loaded");

            if dry_run {
                println!("✅ Batch is valid: {} package(s)", session.packages().len());
                return Ok(());
            }

            let list = session.close_posting_list(custom_id).await?;
            let (batch_id, number, count) = (list.custom_id(), list.number(), list.len());
            println!(
                "✅ Posting list {} closed (carrier #{}, {} label(s))",
                batch_id, number, count
            );
            for code in session.tracking_codes()? {
                println!("   {}", code);
            }

            let labels_path = output_dir.join(format!("labels-{}.zip", batch_id));
            let manifest_path = output_dir.join(format!("posting-list-{}.csv", batch_id));
            session.generate_labels_document(&labels_path, None)?;
            session.generate_manifest_document(&manifest_path, None)?;
            println!("📁 Labels saved to: {}", labels_path.display());
            println!("📁 Manifest saved to: {}", manifest_path.display());

            if metrics {
                print_metrics(&session).await?;
            }
        }
        Command::TrackingCodes { service, quantity } => {
            for code in session
                .request_tracking_codes(service.as_str(), quantity)
                .await?
            {
                println!("{}", code);
            }
        }
        Command::CardStatus => {
            let active = session.get_posting_card_status(None).await?;
            println!(
                "Posting card {}: {}",
                session.posting_card().number,
                if active { "active" } else { "inactive" }
            );
        }
    }

    Ok(())
}

async fn print_metrics<R: Registrar, D: DocumentRenderer>(
    session: &PostingSession<R, D>,
) -> sigep_batch::Result<()> {
    let codes = session.tracking_codes()?;
    let mut delivery_times = session.delivery_times()?;
    let mut freights = session.freights()?;
    let mut availability = session.service_availability()?;

    println!("tracking_code\tdays\tfreight\tavailable");
    for code in codes {
        let days = delivery_times.try_next().await.transpose()?;
        let freight = freights.try_next().await.transpose()?;
        let available = availability.try_next().await.transpose()?;
        println!(
            "{}\t{}\t{}\t{}",
            code,
            days.map(|d| d.to_string()).unwrap_or_default(),
            freight.map(|f| format!("{:.2}", f.total)).unwrap_or_default(),
            available.map(|a| a.to_string()).unwrap_or_default()
        );
    }
    Ok(())
}
