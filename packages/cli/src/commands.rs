//! Command execution.

use std::io::{self, Read, Write};
use std::path::Path;

use dirb_json_store::{
    into_object, DirRepository, DocumentRepository, Error, JsonCodec, Object, Value,
};

use crate::cli::{Cli, Command};
use crate::registry::{Registry, RegistryError};

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid input: {0}")]
    Input(#[source] Error),

    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

/// Run `cli` against the shop collections.
pub fn run(cli: &Cli, input: &mut dyn Read, out: &mut dyn Write) -> Result<(), CliError> {
    run_with(&Registry::shop(), cli, input, out)
}

/// Run `cli`, resolving `--collection` through `registry`. JSON given as
/// `-` is read from `input`.
pub fn run_with(
    registry: &Registry,
    cli: &Cli,
    input: &mut dyn Read,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let dir = match &cli.collection {
        Some(name) => registry.resolve(name)?.dir(&cli.dir),
        None => cli.dir.clone(),
    };

    let docs = || DocumentRepository::open(&dir);
    match &cli.command {
        Command::Init => init(&dir),
        Command::Create { json } => {
            let document = read_object(json, input)?;
            let name = docs()?.create(&document)?;
            writeln!(out, "{}", name).map_err(CliError::Output)
        }
        Command::Get { name, pretty } => {
            let value = docs()?.get(name)?;
            let codec = if *pretty {
                JsonCodec::pretty()
            } else {
                JsonCodec::default()
            };
            out.write_all(&codec.encode(&value)?)
                .map_err(CliError::Output)
        }
        Command::Update { name, json } => {
            let patch = read_object(json, input)?;
            Ok(docs()?.update(name, &patch)?)
        }
        Command::Overwrite { name, json } => {
            let value = read_value(json, input)?;
            Ok(docs()?.overwrite(name, &value)?)
        }
        Command::Remove { name } => Ok(docs()?.remove(name)?),
        Command::List => {
            for name in docs()?.list()? {
                writeln!(out, "{}", name).map_err(CliError::Output)?;
            }
            Ok(())
        }
    }
}

fn init(dir: &Path) -> Result<(), CliError> {
    let repo = DirRepository::create(dir).map_err(Error::from)?;
    log::debug!("Initialized {}", repo.root().display());
    Ok(())
}

fn read_value(arg: &str, input: &mut dyn Read) -> Result<Value, CliError> {
    let codec = JsonCodec::default();
    if arg == "-" {
        codec.decode(input)
    } else {
        codec.decode_slice(arg.as_bytes())
    }
    .map_err(CliError::Input)
}

fn read_object(arg: &str, input: &mut dyn Read) -> Result<Object, CliError> {
    into_object(read_value(arg, input)?).map_err(CliError::Input)
}
