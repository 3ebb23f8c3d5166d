use admission_cli::{cli, commands, logging, AppConfig, Overrides};
use admission_http::HttpAdmissionBackend;
use admission_sync::{DraftSyncController, FileStore, LocalStore, TracingNotifier};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("log-json"));

    let config = AppConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?
        .with_overrides(Overrides {
            base_url: matches.get_one::<String>("base-url").cloned(),
            token: matches.get_one::<String>("token").cloned(),
            data_dir: matches.get_one::<PathBuf>("data-dir").cloned(),
        });
    config.validate()?;

    let store: Arc<dyn LocalStore> = Arc::new(FileStore::new(&config.storage.data_dir));
    let mut out = std::io::stdout();

    let Some((name, args)) = matches.subcommand() else {
        return Ok(());
    };
    if name == "reset" {
        return commands::reset(store, &mut out);
    }

    let backend = HttpAdmissionBackend::new(&config.backend).context("building http client")?;
    let controller = DraftSyncController::new(
        config.sync.clone(),
        Arc::new(backend),
        store,
        Arc::new(TracingNotifier),
    );

    match name {
        "status" => commands::status(&controller, args.get_flag("json"), &mut out).await,
        "set" => {
            let field = args.get_one::<String>("field").context("missing field")?;
            let value = args.get_one::<String>("value").context("missing value")?;
            commands::set_field(&controller, field, value, &mut out).await
        }
        "step" => {
            let step = *args.get_one::<u8>("n").context("missing step")?;
            commands::set_step(&controller, step, &mut out).await
        }
        "submit" => commands::submit(&controller, &mut out).await,
        other => anyhow::bail!("unknown command '{other}'"),
    }
}
