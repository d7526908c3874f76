// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    clap::{Arg, ArgMatches, Command},
    log::LevelFilter,
    p2_macos_fixup::{
        fixup::{run, Architecture, FixupConfig},
        FixupError,
    },
    std::{path::PathBuf, str::FromStr},
};

fn config_from_args(args: &ArgMatches) -> Result<FixupConfig, FixupError> {
    let output_directory = PathBuf::from(
        args.value_of_os("output_directory")
            .ok_or(FixupError::CliBadArgument)?,
    );
    let project_version = args
        .value_of("project_version")
        .ok_or(FixupError::CliBadArgument)?
        .to_string();
    let product_id = args
        .value_of("product_id")
        .ok_or(FixupError::CliBadArgument)?
        .to_string();
    let app_name = args
        .value_of("app_name")
        .ok_or(FixupError::CliBadArgument)?
        .to_string();

    // `KEY=VALUE` sets a property; a bare `KEY` (or empty value) removes it.
    let properties = args
        .values_of("set")
        .map(|values| {
            values
                .map(|pair| match pair.split_once('=') {
                    Some((key, value)) => (key.to_string(), value.to_string()),
                    None => (pair.to_string(), String::new()),
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let architectures = match args.values_of("arch") {
        Some(values) => values
            .map(Architecture::from_str)
            .collect::<Result<Vec<_>, FixupError>>()?,
        None => Architecture::ALL.to_vec(),
    };

    Ok(FixupConfig {
        output_directory,
        project_version,
        product_id,
        app_name,
        properties,
        architectures,
    })
}

fn main_impl() -> Result<(), FixupError> {
    let app = Command::new("p2-macos-fixup")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Synchronize macOS Info.plist content and p2 repository checksums after a build")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Increase logging verbosity. Can be specified multiple times."),
        )
        .arg(
            Arg::new("output_directory")
                .long("output-directory")
                .takes_value(true)
                .required(true)
                .allow_invalid_utf8(true)
                .help("Build output directory containing products/ and repository/"),
        )
        .arg(
            Arg::new("project_version")
                .long("project-version")
                .takes_value(true)
                .required(true)
                .help("Qualified project version used in binary archive filenames"),
        )
        .arg(
            Arg::new("product_id")
                .long("product-id")
                .takes_value(true)
                .required(true)
                .help("p2 product identifier"),
        )
        .arg(
            Arg::new("app_name")
                .long("app-name")
                .takes_value(true)
                .required(true)
                .help("Application bundle name, e.g. Example.app"),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .takes_value(true)
                .multiple_occurrences(true)
                .value_name("KEY[=VALUE]")
                .help("Set an Info.plist property; omit the value to remove the key"),
        )
        .arg(
            Arg::new("arch")
                .long("arch")
                .takes_value(true)
                .multiple_occurrences(true)
                .possible_values(["x86_64", "aarch64"])
                .help("Restrict processing to the given architecture(s)"),
        );

    let matches = app.get_matches();

    let log_level = match matches.occurrences_of("verbose") {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str()),
    );

    // Disable log context except at higher log levels.
    if log_level <= LevelFilter::Info {
        builder
            .format_timestamp(None)
            .format_level(false)
            .format_target(false);
    }

    builder.init();

    let config = config_from_args(&matches)?;

    run(&config)
}

fn main() {
    let exit_code = match main_impl() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {}", err);
            1
        }
    };

    std::process::exit(exit_code)
}
