use clap::{App, AppSettings, Arg, SubCommand};
use cmsblog::build::build_site;
use cmsblog::config::Config;
use cmsblog::preview::PreviewQuery;
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let matches = App::new("cmsblog")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a static blog from a headless CMS")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .short("p")
                        .takes_value(true)
                        .help("The project directory (defaults to the current directory)"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .help("The output directory (defaults to `_output` in the project)"),
                )
                .arg(
                    Arg::with_name("preview-token")
                        .long("preview-token")
                        .takes_value(true)
                        .help(
                            "Builds the draft revision identified by this token. Write preview \
                             builds to their own --output; their pages link to the published site",
                        ),
                )
                .arg(
                    Arg::with_name("document-id")
                        .long("document-id")
                        .takes_value(true)
                        .requires("preview-token")
                        .help("The document the preview was opened from"),
                ),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("build") {
        let project = PathBuf::from(matches.value_of("project").unwrap_or("."));
        let output = match matches.value_of("output") {
            Some(output) => PathBuf::from(output),
            None => project.join("_output"),
        };
        let preview = match matches.value_of("preview-token") {
            None => None,
            Some(token) => Some(PreviewQuery {
                token: Some(token.to_owned()),
                document_id: matches.value_of("document-id").map(str::to_owned),
            }),
        };
        if let Err(e) = build(&project, &output, preview).await {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

async fn build(
    project: &Path,
    output: &Path,
    preview: Option<PreviewQuery>,
) -> anyhow::Result<()> {
    let project = std::fs::canonicalize(project)?;
    let config = Config::from_directory(&project, output)?;
    build_site(config, preview).await?;
    Ok(())
}
