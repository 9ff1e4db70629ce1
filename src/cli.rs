use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};

use crate::api::{ApiClient, Credentials, PublishApi};
use crate::builders::{BuilderConfig, BuilderError, BuilderKind, build_publish_request, load_builders};
use crate::cloud::{Image, PublishedImage, Source};
use crate::helpers::{choose_indices, progress::spinner};
use crate::publish::{
    ImageContext, ImageUri, call_publish_webservice, fetch_image, fetch_source, is_image_ready_to_publish,
};

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Root URL of the image factory service
    #[arg(long, global = true, env = "IMAGE_PUBLISHER_URL")]
    url: Option<String>,

    /// Login used for the service and for the user-scoped resource paths
    #[arg(short, long, global = true, env = "IMAGE_PUBLISHER_USER")]
    user: Option<String>,

    #[arg(short, long, global = true, env = "IMAGE_PUBLISHER_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Publish a generated image to the cloud providers of a builder file
    #[command(arg_required_else_help = true)]
    Publish(PublishArgs),

    /// Check that every builder of a file has its required fields
    #[command(arg_required_else_help = true)]
    Validate {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Debug, Args)]
struct PublishArgs {
    /// YAML or JSON file holding a `builders` list
    #[arg(short, long)]
    file: PathBuf,

    /// Image URI, eg. users/guest/appliances/5/images/1234
    #[arg(short, long)]
    image: String,

    /// Only publish the builders of this provider
    #[arg(short = 't', long = "type")]
    kind: Option<BuilderKind>,

    /// Publish every builder without prompting
    #[arg(long, conflicts_with = "kind")]
    all: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Validate { ref file } => validate(file),
            Commands::Publish(ref args) => {
                let credentials = self.credentials()?;
                publish(credentials, args).await
            }
        }
    }

    fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            url: self
                .url
                .clone()
                .context("no service url, pass --url or set IMAGE_PUBLISHER_URL")?,
            login: self
                .user
                .clone()
                .context("no login, pass --user or set IMAGE_PUBLISHER_USER")?,
            password: self.password.clone(),
        })
    }
}

fn validate(file: &Path) -> Result<()> {
    let builders = load_builders(file).with_context(|| format!("load builders from {}", file.display()))?;

    let mut invalid = 0;
    for (idx, builder) in builders.iter().enumerate() {
        match build_publish_request(builder) {
            Ok(request) => println!("builder #{}: {} OK", idx + 1, request.kind()),
            Err(BuilderError::MissingFields(missing)) => {
                invalid += 1;
                println!(
                    "builder #{}: {} missing {}",
                    idx + 1,
                    missing.provider(),
                    missing.fields().join(", ")
                );
            }
            Err(err) => {
                invalid += 1;
                println!("builder #{}: {err}", idx + 1);
            }
        }
    }

    if invalid > 0 {
        bail!("{invalid} of {} builder(s) are invalid", builders.len());
    }
    Ok(())
}

/// Builders of the given provider; entries with a bad `type` never match.
fn builders_of_kind(builders: Vec<BuilderConfig>, kind: BuilderKind) -> Vec<BuilderConfig> {
    builders
        .into_iter()
        .filter(|b| b.kind().is_ok_and(|k| k == kind))
        .collect()
}

fn select_builders(builders: Vec<BuilderConfig>, args: &PublishArgs) -> Result<Vec<BuilderConfig>> {
    if let Some(kind) = args.kind {
        let selected = builders_of_kind(builders, kind);
        if selected.is_empty() {
            bail!("no {kind} builder in {}", args.file.display());
        }
        return Ok(selected);
    }

    if args.all || builders.len() == 1 {
        return Ok(builders);
    }

    let labels: Vec<String> = builders
        .iter()
        .map(|b| b.type_name().unwrap_or("<no type>").to_string())
        .collect();
    let picked = choose_indices("Select builder to publish", labels)?;

    Ok(builders
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| picked.contains(idx))
        .map(|(_, b)| b)
        .collect())
}

async fn publish(credentials: Credentials, args: &PublishArgs) -> Result<()> {
    let builders = load_builders(&args.file).with_context(|| format!("load builders from {}", args.file.display()))?;
    let selected = select_builders(builders, args)?;

    let image_uri: ImageUri = args.image.parse()?;
    let api = ApiClient::new(credentials)?;
    let login = api.login().to_string();
    if image_uri.login() != login {
        warn!("image uri names user '{}', addressing it as '{login}'", image_uri.login());
    }
    let context = ImageContext::new(api, login);

    let image = fetch_image(&context, &image_uri)
        .await
        .with_context(|| format!("fetch image {image_uri}"))?;
    let source = fetch_source(&context, &image_uri)
        .await
        .with_context(|| format!("fetch source of image {image_uri}"))?;

    info!("publishing image {} from {} to {} builder(s)", image.db_id(), source.label(), selected.len());

    let mut failures = 0;
    for builder in &selected {
        match publish_builder(&context, &image, &source, builder).await {
            Ok(published) => print_published(&image, &source, &published),
            Err(err) => {
                failures += 1;
                error!("{err:#}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} publish(es) failed", selected.len());
    }
    Ok(())
}

async fn publish_builder<A: PublishApi>(
    context: &ImageContext<A>,
    image: &Image,
    source: &Source,
    builder: &BuilderConfig,
) -> Result<PublishedImage> {
    let kind = builder.kind()?;

    if !is_image_ready_to_publish(image, builder) {
        let status = image.status();
        bail!(
            "image {} is not ready to be published to {kind} (state: {}{})",
            image.db_id(),
            status.state(),
            status.message().map(|m| format!(", {m}")).unwrap_or_default()
        );
    }

    let request = build_publish_request(builder)?;

    let pb = spinner(format!("Publishing image {} to {kind}", image.db_id()));
    let result = call_publish_webservice(context, image, source, request).await;
    pb.finish_and_clear();

    result.with_context(|| format!("publish image {} to {kind}", image.db_id()))
}

fn print_published(image: &Image, source: &Source, published: &PublishedImage) {
    println!("\n=== Published ===");
    println!("Image:     {} ({})", image.db_id(), image.target_format().unwrap_or("unknown format"));
    println!("Source:    {}", source.label());
    println!("Id:        {}", published.db_id());
    println!("Uri:       {}", published.uri());
    println!("Status:    {}", published.status().unwrap_or("<pending>"));
    println!("Cloud id:  {}", published.cloud_id().unwrap_or("<none>"));
}
