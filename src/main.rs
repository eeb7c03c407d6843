// Copyright @yucwang 2026

use std::env;
use std::io::{ self, BufRead, Write };
use std::path::{ Path, PathBuf };

use console::style;
use tangent_graft::core::import_export::import_export;
use tangent_graft::core::session::Session;
use tangent_graft::io::format_registry::FormatSelector;

const USAGE: &str = "<first> <second> <output> [--format N] [--embed-media] [--password PW] [--list-formats]";

fn stdin_password(path: &Path) -> Option<String> {
    eprint!("Password for {}: ", path.display());
    io::stderr().flush().ok()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let line = line.trim_end_matches(&['\r', '\n'][..]).to_string();
    if line.is_empty() { None } else { Some(line) }
}

fn list_formats(session: &Session) {
    println!("Readers:");
    for filter in session.reader_filters() {
        println!("    {}", filter);
    }
    println!("Writers:");
    for (i, filter) in session.writer_filters().iter().enumerate() {
        let native = if session.registry().writer_is_native(i) { " (native)" } else { "" };
        println!("  {}: {}{}", i, filter, native);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let mut session = Session::new();

    let mut positional: Vec<&str> = Vec::new();
    let mut format = FormatSelector::Native;
    let mut embed_media = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--format" => {
                i += 1;
                format = args.get(i)
                    .and_then(|v| v.parse::<i64>().ok())
                    .map(FormatSelector::from_index)
                    .unwrap_or(FormatSelector::Native);
            }
            "--embed-media" => {
                embed_media = true;
            }
            "--password" => {
                i += 1;
                session.settings_mut().password = args.get(i).cloned();
            }
            "--list-formats" => {
                list_formats(&session);
                return;
            }
            other => positional.push(other),
        }
        i += 1;
    }

    if positional.len() < 3 {
        eprintln!("Usage: {} {}", args[0], USAGE);
        std::process::exit(1);
    }

    let (first, second) = (positional[0], positional[1]);
    let mut output = PathBuf::from(positional[2]);
    let writer_index = session.registry().resolve_writer(format, embed_media);
    if output.extension().is_none() {
        if let Some(ext) = writer_index.and_then(|w| session.writer_extension(w)) {
            output.set_extension(ext.trim_start_matches('.'));
        }
    }
    let format = match writer_index {
        Some(index) => FormatSelector::Index(index),
        None => format,
    };

    let mut prompt = stdin_password;
    match import_export(&mut session, first, second, &output, format, &mut prompt) {
        Ok(report) => {
            for skipped in report.skipped.iter() {
                log::warn!("{} was not processed: {}", skipped.path, skipped.error);
            }
            println!("{}", style("Program Success!").green());
        }
        Err(err) => {
            log::error!("{}", err);
            eprintln!("{}", style("Program Failed!").red());
            std::process::exit(1);
        }
    }
}
