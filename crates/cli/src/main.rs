use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use restbench_openapi::{ConvertOptions, convert, descriptors_to_openapi, import_document, parse_openapi_document, source_origin_from_url};
use restbench_types::{ApiDescriptor, AuthSecret, Field, FieldKind, RequestAssembly, RequestConfig};
use restbench_util::{
    apply_auth, dispatch, redact_sensitive, resolve_assembly_variables, resolve_value_variables, resolve_variables, route,
    validate_fields, visible_fields,
};
use serde_json::{Map, Value, json};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "restbench", version, about = "Import OpenAPI documents and exercise their operations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert an OpenAPI document into API descriptors (JSON on stdout)
    Import(ImportArgs),
    /// Rebuild an OpenAPI document from a descriptor collection
    Export(ExportArgs),
    /// Validate, assemble and send one operation
    Request(RequestArgs),
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// OpenAPI document (JSON or YAML)
    #[arg(required_unless_present = "url", conflicts_with = "url")]
    file: Option<PathBuf>,
    /// Fetch the document from a URL instead of a file
    #[arg(long)]
    url: Option<String>,
    /// Origin used to absolutize relative server URLs (defaults to the --url origin)
    #[arg(long)]
    origin: Option<String>,
    /// Base URL that replaces the document's servers
    #[arg(long)]
    base_url: Option<String>,
    /// Only import these operations, e.g. --select "GET /pets"
    #[arg(long = "select")]
    selected: Vec<String>,
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Descriptor collection produced by `import`
    descriptors: PathBuf,
}

#[derive(Debug, Args)]
struct RequestArgs {
    /// Descriptor collection or OpenAPI document
    file: PathBuf,
    /// Descriptor id, as printed by `import`
    api_id: String,
    /// Field value as name=value; number, select and array fields take JSON
    #[arg(long = "value", value_parser = parse_key_value)]
    values: Vec<(String, String)>,
    /// JSON object with field values; --value entries override it
    #[arg(long)]
    values_json: Option<PathBuf>,
    /// Environment variable for {{name}} placeholders as name=value
    #[arg(long = "var", value_parser = parse_key_value)]
    variables: Vec<(String, String)>,
    /// Bearer token
    #[arg(long)]
    token: Option<String>,
    /// API key
    #[arg(long)]
    api_key: Option<String>,
    /// Origin for relative server URLs when FILE is an OpenAPI document
    #[arg(long)]
    origin: Option<String>,
    /// Call the API directly instead of through the relay
    #[arg(long)]
    no_proxy: bool,
    /// Print the assembled request (secrets redacted) without sending it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Import(args) => run_import(args).await,
        Command::Export(args) => run_export(&args),
        Command::Request(args) => run_request(args).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_import(args: ImportArgs) -> Result<()> {
    let (text, fetched_origin) = match (&args.file, &args.url) {
        (Some(path), _) => (read_text(path)?, None),
        (None, Some(url)) => (fetch_document(url).await?, source_origin_from_url(url)),
        (None, None) => bail!("provide a FILE or --url"),
    };

    let mut options = ConvertOptions::default();
    if let Some(origin) = args.origin.or(fetched_origin) {
        options = options.with_source_origin(origin);
    }
    if let Some(base_url) = args.base_url {
        options = options.with_base_url(base_url);
    }
    if !args.selected.is_empty() {
        options = options.with_selected_operations(args.selected);
    }

    let descriptors = import_document(&text, &options).context("import failed")?;
    info!(count = descriptors.len(), "imported operations");
    let output = if args.pretty {
        serde_json::to_string_pretty(&descriptors)?
    } else {
        serde_json::to_string(&descriptors)?
    };
    println!("{output}");
    Ok(())
}

async fn fetch_document(url: &str) -> Result<String> {
    debug!(url = %url, "fetching OpenAPI document");
    let response = reqwest::get(url).await.with_context(|| format!("fetch {url}"))?;
    let status = response.status();
    if !status.is_success() {
        bail!("fetching {url} returned HTTP {status}");
    }
    response.text().await.with_context(|| format!("read body of {url}"))
}

fn run_export(args: &ExportArgs) -> Result<()> {
    let descriptors: Vec<ApiDescriptor> = serde_json::from_str(&read_text(&args.descriptors)?)
        .with_context(|| format!("{} is not a descriptor collection", args.descriptors.display()))?;
    println!("{}", serde_json::to_string_pretty(&descriptors_to_openapi(&descriptors))?);
    Ok(())
}

async fn run_request(args: RequestArgs) -> Result<()> {
    let descriptors = load_descriptors(&args.file, args.origin.as_deref())?;
    let api = descriptors
        .iter()
        .find(|descriptor| descriptor.id == args.api_id)
        .with_context(|| {
            let known: Vec<&str> = descriptors.iter().map(|descriptor| descriptor.id.as_str()).collect();
            format!("no operation '{}'; available: {}", args.api_id, known.join(", "))
        })?;

    let variables: IndexMap<String, String> = args.variables.into_iter().collect();
    let values = collect_values(args.values_json.as_deref(), &args.values, &api.fields)?;
    let values = resolve_value_variables(values, &variables);
    let shown: Vec<Field> = visible_fields(&api.fields, &values).into_iter().cloned().collect();

    let report = validate_fields(&shown, &values);
    if !report.valid {
        for (field, message) in &report.errors {
            eprintln!("{field}: {message}");
        }
        bail!("{} field(s) failed validation", report.errors.len());
    }

    let secret = AuthSecret {
        token: args.token,
        api_key: args.api_key,
    };
    let assembly = assemble_request(api, &values, &shown, &secret, &variables);

    if args.dry_run {
        let preview = json!({
            "method": api.method,
            "url": assembly.final_endpoint,
            "headers": assembly.headers,
            "body": assembly.has_body().then_some(&assembly.body),
        });
        println!("{}", redact_sensitive(&serde_json::to_string_pretty(&preview)?));
        return Ok(());
    }

    let mut config = RequestConfig::from_env();
    if args.no_proxy {
        config = config.with_proxy(false);
    }
    let outcome = dispatch(&api.method, &assembly, &config).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.ok {
        bail!("{} {} returned HTTP {} {}", api.method, api.id, outcome.status, outcome.status_text);
    }
    Ok(())
}

/// Routes already-interpolated values, adds credentials, then resolves the
/// placeholders left in the template, headers and body.
fn assemble_request(
    api: &ApiDescriptor,
    values: &Map<String, Value>,
    fields: &[Field],
    secret: &AuthSecret,
    variables: &IndexMap<String, String>,
) -> RequestAssembly {
    let endpoint = resolve_variables(&api.endpoint, variables);
    let assembly = route(&endpoint, values, fields);
    let assembly = apply_auth(&api.auth, secret, assembly);
    resolve_assembly_variables(assembly, variables)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// Accepts either a descriptor array or an OpenAPI document.
fn load_descriptors(path: &Path, origin: Option<&str>) -> Result<Vec<ApiDescriptor>> {
    let document = parse_openapi_document(&read_text(path)?).with_context(|| format!("parse {}", path.display()))?;
    if document.is_array() {
        return serde_json::from_value(document).with_context(|| format!("{} is not a descriptor collection", path.display()));
    }
    let mut options = ConvertOptions::default();
    if let Some(origin) = origin {
        options = options.with_source_origin(origin);
    }
    Ok(convert(&document, &options)?)
}

fn collect_values(
    values_json: Option<&Path>,
    pairs: &[(String, String)],
    fields: &[Field],
) -> Result<Map<String, Value>> {
    let mut values = match values_json {
        Some(path) => match serde_json::from_str::<Value>(&read_text(path)?)
            .with_context(|| format!("parse {}", path.display()))?
        {
            Value::Object(map) => map,
            _ => bail!("{} must contain a JSON object", path.display()),
        },
        None => Map::new(),
    };
    for (name, raw) in pairs {
        let field = fields.iter().find(|field| &field.name == name);
        values.insert(name.clone(), parse_value(raw, field));
    }
    Ok(values)
}

/// Interprets a command-line value for `field`. Numbers and arrays keep their
/// JSON type, selects take JSON only when it matches an option value, and
/// everything else (text, dates, unknown names) stays a string.
fn parse_value(raw: &str, field: Option<&Field>) -> Value {
    let as_text = || Value::String(raw.to_string());
    let Some(field) = field else {
        return as_text();
    };
    let parsed = serde_json::from_str::<Value>(raw.trim()).ok();
    match (&field.kind, parsed) {
        (FieldKind::Number(_), Some(number @ Value::Number(_))) => number,
        (FieldKind::Array { .. }, Some(items @ Value::Array(_))) => items,
        (FieldKind::BooleanSelect { options } | FieldKind::Select { options }, Some(parsed))
            if options.iter().any(|option| option.value == parsed) =>
        {
            parsed
        }
        _ => as_text(),
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use restbench_types::{ArrayItem, ParamLocation, SelectOption};
    use std::io::Write;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn key_value_pairs_split_on_first_equals() {
        assert_eq!(parse_key_value("q=a=b"), Ok(("q".to_string(), "a=b".to_string())));
        assert_eq!(parse_key_value("empty="), Ok(("empty".to_string(), String::new())));
        assert!(parse_key_value("=x").is_err());
        assert!(parse_key_value("novalue").is_err());
    }

    #[test]
    fn values_keep_json_types_and_override_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"id": "1", "tags": ["a"]}}"#).expect("write");

        let fields = [
            Field::new("id", "Id", FieldKind::Number(Default::default())),
            Field::new("name", "Name", FieldKind::default()),
        ];
        let pairs = vec![("id".to_string(), "42".to_string()), ("name".to_string(), "Rex".to_string())];
        let values = collect_values(Some(file.path()), &pairs, &fields).expect("values");
        assert_eq!(values.get("id"), Some(&json!(42)));
        assert_eq!(values.get("name"), Some(&json!("Rex")));
        assert_eq!(values.get("tags"), Some(&json!(["a"])));
    }

    #[test]
    fn text_fields_keep_numeric_looking_values_as_strings() {
        let fields = [
            Field::new("zip", "PLZ", FieldKind::default()).with_required(true),
            Field::new("name", "Name", FieldKind::default()).with_required(true),
        ];
        let pairs = vec![("zip".to_string(), "12345".to_string()), ("name".to_string(), "null".to_string())];
        let values = collect_values(None, &pairs, &fields).expect("values");
        assert_eq!(values.get("zip"), Some(&json!("12345")));
        assert_eq!(values.get("name"), Some(&json!("null")));
        assert!(validate_fields(&fields, &values).valid);

        let assembly = route("/addresses", &values, &fields);
        assert_eq!(Value::Object(assembly.body), json!({"zip": "12345", "name": "null"}));
    }

    #[test]
    fn selects_take_json_only_when_it_matches_an_option() {
        let body_flag = Field::new(
            "vaccinated",
            "Vaccinated",
            FieldKind::BooleanSelect {
                options: vec![SelectOption::new(true, "Ja"), SelectOption::new(false, "Nein")],
            },
        );
        let query_flag = Field::new(
            "active",
            "Active",
            FieldKind::BooleanSelect {
                options: vec![SelectOption::new("true", "true"), SelectOption::new("false", "false")],
            },
        );
        let tags = Field::new("tags", "Tags", FieldKind::Array { item: ArrayItem::Text });

        assert_eq!(parse_value("true", Some(&body_flag)), json!(true));
        assert_eq!(parse_value("true", Some(&query_flag)), json!("true"));
        assert_eq!(parse_value(r#"["a","b"]"#, Some(&tags)), json!(["a", "b"]));
        assert_eq!(parse_value("7", None), json!("7"));
    }

    #[test]
    fn variables_resolve_in_path_and_query_values() {
        let api = ApiDescriptor {
            id: "getpet".into(),
            name: "Get pet".into(),
            description: String::new(),
            endpoint: "{{baseUrl}}/pets/{petId}".into(),
            method: "GET".into(),
            tag: "pets".into(),
            auth: Default::default(),
            fields: vec![
                Field::new("petId", "Pet Id", FieldKind::default()).with_location(ParamLocation::Path),
                Field::new("q", "Q", FieldKind::default()).with_location(ParamLocation::Query),
            ],
        };
        let variables = IndexMap::from([
            ("baseUrl".to_string(), "https://api.example.com".to_string()),
            ("id".to_string(), "7".to_string()),
            ("term".to_string(), "cat".to_string()),
        ]);
        let pairs = vec![("petId".to_string(), "{{id}}".to_string()), ("q".to_string(), "{{term}}".to_string())];
        let values = resolve_value_variables(collect_values(None, &pairs, &api.fields).expect("values"), &variables);

        let assembly = assemble_request(&api, &values, &api.fields, &AuthSecret::default(), &variables);
        assert_eq!(assembly.final_endpoint, "https://api.example.com/pets/7?q=cat");
    }

    #[test]
    fn descriptors_load_from_collection_or_document() {
        let mut document = tempfile::NamedTempFile::new().expect("temp file");
        write!(document, "openapi: 3.0.0\nservers:\n  - url: /v1\npaths:\n  /pets:\n    get:\n      operationId: listPets\n").expect("write");
        let from_document = load_descriptors(document.path(), Some("https://api.example.com")).expect("document");
        assert_eq!(from_document[0].endpoint, "https://api.example.com/v1/pets");

        let mut collection = tempfile::NamedTempFile::new().expect("temp file");
        write!(collection, "{}", serde_json::to_string(&from_document).expect("serialize")).expect("write");
        let from_collection = load_descriptors(collection.path(), None).expect("collection");
        assert_eq!(from_collection, from_document);
    }
}
