//! EODH API CLI binary.
//!
//! A command-line interface for browsing the resource catalogue, running
//! ADES workflows and uploading workspace files.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use eodhapi::cli::{init_tracing, parse_bbox, parse_inputs, Cli, Command, CwlArgs, Entity};
use eodhapi::{
    CatalogService, Collection, CwlSource, EodhClient, EodhError, Item, Job, MapService, PrettyPrint,
    Process, Resource, SearchParams,
};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Give up on `execute --wait` after this many polls.
const MAX_POLLS: u32 = 720;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let client = match cli.connection.connect() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Check EODH_API_URL and EODH_ENVIRONMENT");
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli.command, cli.json).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if matches!(e, EodhError::ConfigMissing(_)) {
                eprintln!("Hint: Set EODH_USERNAME and EODH_TOKEN environment variables");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &EodhClient, command: Command, json: bool) -> eodhapi::Result<()> {
    match command {
        Command::Ping => {
            let catalogue = client.resource_catalog().await?;
            let message = catalogue.ping().await?;
            println!("{}", message.unwrap_or_else(|| "ok".to_string()));
        }
        Command::Conformance => {
            let catalogue = client.resource_catalog().await?;
            let classes = catalogue.get_conformance().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&classes)?);
            } else {
                classes.iter().for_each(|c| println!("{c}"));
            }
        }
        Command::Get {
            entity,
            id,
            catalog,
            collection,
        } => handle_get(client, entity, &id, catalog.as_deref(), collection.as_deref(), json).await?,
        Command::List {
            entity,
            catalog,
            collection,
            limit,
        } => {
            handle_list(client, entity, catalog.as_deref(), collection.as_deref(), limit, json)
                .await?
        }
        Command::Search {
            collections,
            catalog,
            bbox,
            datetime,
            query,
            limit,
        } => {
            let mut params = SearchParams::new().limit(limit);
            if !collections.is_empty() {
                params.collections = Some(collections);
            }
            if let Some(bbox) = bbox {
                params.bbox = Some(parse_bbox(&bbox)?);
            }
            params.datetime = datetime;
            if !query.is_empty() {
                params = params.query_expressions(&query)?;
            }

            let catalogue = client.resource_catalog().await?;
            let mut results = match catalog {
                Some(id) => catalogue.get_catalog(&id).await?.search(&params)?,
                None => catalogue.search(&params)?,
            };
            let items = results.get_limited().await?.to_vec();
            output_list(&items, json, |i| ItemRow::from(i))?;
            if !json {
                if let Some(total) = results.total_count() {
                    println!("\n{} of {} matching items", items.len(), total);
                }
            }
        }
        Command::Deploy { cwl } => {
            let ades = client.ades().await?;
            let process = ades.deploy_process(cwl_source(cwl).await?).await?;
            output_single(&process, json)?;
        }
        Command::Execute {
            process,
            inputs,
            wait,
            poll_secs,
        } => {
            let ades = client.ades().await?;
            let process = ades.get_process(&process).await?;
            let mut job = process.execute(parse_inputs(&inputs)?).await?;
            if wait {
                job.wait_until_finished(Duration::from_secs(poll_secs), MAX_POLLS)
                    .await?;
            }
            output_single(&job, json)?;
        }
        Command::Capabilities { service } => {
            let service = MapService::from(service);
            let caps = client
                .get_capabilities(service, service.default_path())
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&caps)?);
            } else {
                println!("{}", caps.document);
            }
        }
        Command::Upload {
            file,
            path,
            workspace,
        } => {
            client
                .workspace()
                .upload_file(&file, &path, workspace.as_deref())
                .await?;
            if !json {
                println!("Uploaded {} to {}", file.display(), path);
            }
        }
    }
    Ok(())
}

async fn cwl_source(args: CwlArgs) -> eodhapi::Result<CwlSource> {
    match (args.cwl_url, args.cwl_file) {
        (Some(url), _) => Ok(CwlSource::Url(url)),
        (None, Some(path)) => Ok(CwlSource::Yaml(tokio::fs::read_to_string(path).await?)),
        (None, None) => Err(EodhError::InvalidArgument(
            "one of --cwl-url or --cwl-file is required".to_string(),
        )),
    }
}

async fn open_collection(
    catalogue: &Resource<CatalogService>,
    catalog: Option<&str>,
    collection: &str,
) -> eodhapi::Result<Resource<Collection>> {
    match catalog {
        Some(id) => catalogue.get_catalog(id).await?.get_collection(collection).await,
        None => catalogue.get_collection(collection).await,
    }
}

fn require<'a>(value: Option<&'a str>, flag: &str, entity: &str) -> eodhapi::Result<&'a str> {
    value.ok_or_else(|| EodhError::InvalidArgument(format!("--{flag} is required for {entity}")))
}

async fn handle_get(
    client: &EodhClient,
    entity: Entity,
    id: &str,
    catalog: Option<&str>,
    collection: Option<&str>,
    json: bool,
) -> eodhapi::Result<()> {
    match entity {
        Entity::Catalog => {
            let catalogue = client.resource_catalog().await?;
            output_single(&catalogue.get_catalog(id).await?, json)?;
        }
        Entity::Collection => {
            let catalogue = client.resource_catalog().await?;
            output_single(&open_collection(&catalogue, catalog, id).await?, json)?;
        }
        Entity::Item => {
            let collection = require(collection, "collection", "items")?;
            let catalogue = client.resource_catalog().await?;
            let collection = open_collection(&catalogue, catalog, collection).await?;
            output_single(&collection.get_item(id).await?, json)?;
        }
        Entity::Process => {
            let ades = client.ades().await?;
            output_single(&ades.get_process(id).await?, json)?;
        }
        Entity::Job => {
            let ades = client.ades().await?;
            output_single(&ades.get_job(id).await?, json)?;
        }
    }
    Ok(())
}

async fn handle_list(
    client: &EodhClient,
    entity: Entity,
    catalog: Option<&str>,
    collection: Option<&str>,
    limit: Option<usize>,
    json: bool,
) -> eodhapi::Result<()> {
    let limit = limit.unwrap_or(usize::MAX);

    match entity {
        Entity::Catalog => {
            let catalogue = client.resource_catalog().await?;
            let catalogs = match catalog {
                Some(id) => catalogue.get_catalog(id).await?.get_catalogs().await?,
                None => catalogue.get_catalogs().await?,
            };
            let catalogs: Vec<_> = catalogs.into_iter().take(limit).collect();
            output_list(&catalogs, json, |c| NamedRow {
                id: c.id.clone(),
                title: c.title.clone().unwrap_or_default(),
            })?;
        }
        Entity::Collection => {
            let catalogue = client.resource_catalog().await?;
            let collections = match catalog {
                Some(id) => catalogue.get_catalog(id).await?.get_collections().await?,
                None => catalogue.get_collections().await?,
            };
            let collections: Vec<_> = collections.into_iter().take(limit).collect();
            output_list(&collections, json, |c| NamedRow {
                id: c.id.clone(),
                title: c.title.clone().unwrap_or_default(),
            })?;
        }
        Entity::Item => {
            let collection = require(collection, "collection", "items")?;
            let catalogue = client.resource_catalog().await?;
            let collection = open_collection(&catalogue, catalog, collection).await?;
            let mut pages = collection.get_items()?;
            let mut items = Vec::new();
            while items.len() < limit {
                match pages.next().await? {
                    Some(item) => items.push(item),
                    None => break,
                }
            }
            output_list(&items, json, |i| ItemRow::from(i))?;
        }
        Entity::Process => {
            let ades = client.ades().await?;
            let processes: Vec<_> = ades.get_processes().await?.into_iter().take(limit).collect();
            output_list(&processes, json, |p| ProcessRow::from(p))?;
        }
        Entity::Job => {
            let ades = client.ades().await?;
            let jobs: Vec<_> = ades.get_jobs().await?.into_iter().take(limit).collect();
            output_list(&jobs, json, |j| JobRow::from(j))?;
        }
    }
    Ok(())
}

fn output_single<T: Serialize + PrettyPrint>(item: &T, json: bool) -> eodhapi::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        println!("{}", item.pretty_print());
    }
    Ok(())
}

fn output_list<T, R, F>(items: &[T], json: bool, to_row: F) -> eodhapi::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        let rows: Vec<R> = items.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
    }
    Ok(())
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct NamedRow {
    id: String,
    title: String,
}

#[derive(Tabled)]
struct ItemRow {
    id: String,
    collection: String,
    datetime: String,
}

impl From<&Resource<Item>> for ItemRow {
    fn from(i: &Resource<Item>) -> Self {
        Self {
            id: i.id.clone(),
            collection: i.collection.clone().unwrap_or_default(),
            datetime: i.datetime().map(|dt| dt.to_rfc3339()).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct ProcessRow {
    id: String,
    version: String,
    title: String,
}

impl From<&Resource<Process>> for ProcessRow {
    fn from(p: &Resource<Process>) -> Self {
        Self {
            id: p.id.clone(),
            version: p.version.clone().unwrap_or_default(),
            title: p.title.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct JobRow {
    id: String,
    process: String,
    status: String,
    progress: String,
}

impl From<&Resource<Job>> for JobRow {
    fn from(j: &Resource<Job>) -> Self {
        Self {
            id: j.id.clone(),
            process: j.process_id.clone().unwrap_or_default(),
            status: j.status.to_string(),
            progress: j.progress.map(|p| format!("{p}%")).unwrap_or_default(),
        }
    }
}
