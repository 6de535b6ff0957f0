//! Lathe CLI - resolve, inspect, and watch module graphs

use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;

mod config;
mod logging;

use crate::config::{parse_level, LogConfig};
use crate::logging::{init, LogFormat};
use lathe_api::{CompileOutput, CompileSession};
use lathe_config::{LimitConfig, SearchPaths};
use lathe_core::ast::Printed;
use lathe_core::FileModule;
use lathe_vfs::native_fs;

#[derive(Parser)]
#[command(
    name = "lathe",
    about = "Lathe modeling language - module graph tools",
    version = "0.1.0"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Library search directory (repeatable); LATHEPATH supplies defaults
    #[arg(long = "lib", global = true, value_name = "DIR")]
    lib: Vec<PathBuf>,

    /// Maximum include/use recursion depth
    #[arg(long, global = true, default_value_t = 64)]
    max_include_depth: usize,

    /// Emit machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a file and all its references, reporting every failure
    Resolve { file: PathBuf },
    /// Print the resolved dependency tree
    Deps { file: PathBuf },
    /// Print the resolved module, scope merged
    Dump { file: PathBuf },
    /// Resolve and exit nonzero if any reference failed
    Check { file: PathBuf },
    /// Recompile whenever the file or a transitive include changes
    Watch {
        file: PathBuf,
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match parse_level(&cli.log_level) {
        Some(level) => level,
        None => {
            eprintln!("Error: unknown log level '{}'", cli.log_level);
            process::exit(2);
        }
    };
    let log_config = LogConfig {
        global: level,
        ..LogConfig::default()
    };
    init(&log_config, if cli.json { LogFormat::Json } else { LogFormat::Compact });

    let mut session = CompileSession::new(Box::new(native_fs()))
        .with_limits(LimitConfig {
            max_include_depth: cli.max_include_depth,
        });
    if !cli.lib.is_empty() {
        session = session.with_search_paths(SearchPaths {
            dirs: cli.lib.clone(),
        });
    }

    let code = match &cli.command {
        Command::Resolve { file } => run_resolve(&mut session, file, cli.json),
        Command::Deps { file } => run_deps(&mut session, file, cli.json),
        Command::Dump { file } => run_dump(&mut session, file),
        Command::Check { file } => run_check(&mut session, file, cli.json),
        Command::Watch { file, interval_ms } => run_watch(&mut session, file, *interval_ms),
    };
    process::exit(code);
}

fn compile(session: &mut CompileSession, file: &Path) -> Option<CompileOutput> {
    match session.compile(file) {
        Ok(output) => Some(output),
        Err(error) => {
            eprintln!("Error: {}", error);
            None
        }
    }
}

fn print_diagnostics(output: &CompileOutput, json: bool) {
    let reports = output.reports();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).unwrap_or_else(|_| "[]".to_string())
        );
    } else {
        for report in &reports {
            eprintln!("{}", report);
        }
    }
}

fn run_resolve(session: &mut CompileSession, file: &Path, json: bool) -> i32 {
    let Some(output) = compile(session, file) else {
        return 1;
    };
    print_diagnostics(&output, json);
    if output.has_errors() {
        1
    } else {
        if !json {
            println!("{}: all references resolved", file.display());
        }
        0
    }
}

fn run_check(session: &mut CompileSession, file: &Path, json: bool) -> i32 {
    let Some(output) = compile(session, file) else {
        return 1;
    };
    print_diagnostics(&output, json);
    if output.has_errors() {
        1
    } else {
        0
    }
}

fn run_dump(session: &mut CompileSession, file: &Path) -> i32 {
    let Some(output) = compile(session, file) else {
        return 1;
    };
    print_diagnostics(&output, false);
    print!("{}", Printed(&*output.module.borrow(), ""));
    0
}

fn run_deps(session: &mut CompileSession, file: &Path, json: bool) -> i32 {
    let Some(output) = compile(session, file) else {
        return 1;
    };
    let module = output.module.borrow();
    if json {
        let tree = deps_json(&module, &mut HashSet::new());
        println!(
            "{}",
            serde_json::to_string_pretty(&tree).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("{}", file.display());
        print_deps(&module, 1, &mut HashSet::new());
    }
    if output.has_errors() {
        1
    } else {
        0
    }
}

fn print_deps(module: &FileModule, depth: usize, visited: &mut HashSet<PathBuf>) {
    let indent = "  ".repeat(depth);
    for node in module.externals() {
        let keyword = node.kind().keyword();
        match (node.resolved_module(), node.resolved_path()) {
            (Some(sub), Some(path)) => {
                if visited.insert(path.to_path_buf()) {
                    println!("{}{} {} -> {}", indent, keyword, node.filename(), path.display());
                    print_deps(&sub.borrow(), depth + 1, visited);
                } else {
                    println!(
                        "{}{} {} -> {} (already shown)",
                        indent,
                        keyword,
                        node.filename(),
                        path.display()
                    );
                }
            }
            _ => {
                let reason = node
                    .error()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unresolved".to_string());
                println!("{}{} {} !! {}", indent, keyword, node.filename(), reason);
            }
        }
    }
}

fn deps_json(module: &FileModule, visited: &mut HashSet<PathBuf>) -> serde_json::Value {
    let references: Vec<serde_json::Value> = module
        .externals()
        .map(|node| {
            let mut entry = serde_json::json!({
                "kind": node.kind().keyword(),
                "filename": node.filename(),
            });
            match (node.resolved_module(), node.resolved_path()) {
                (Some(sub), Some(path)) => {
                    entry["path"] = serde_json::json!(path.to_string_lossy());
                    if visited.insert(path.to_path_buf()) {
                        let mut sub_tree = deps_json(&sub.borrow(), visited);
                        entry["references"] = sub_tree["references"].take();
                    } else {
                        entry["repeated"] = serde_json::json!(true);
                    }
                }
                _ => {
                    if let Some(error) = node.error() {
                        entry["error"] = serde_json::json!(error.to_string());
                    }
                }
            }
            entry
        })
        .collect();
    serde_json::json!({ "references": references })
}

fn run_watch(session: &mut CompileSession, file: &Path, interval_ms: u64) -> i32 {
    if compile(session, file).map(|output| {
        print_diagnostics(&output, false);
        println!("{}: watching (interval {}ms)", file.display(), interval_ms);
    }).is_none() {
        return 1;
    }

    loop {
        std::thread::sleep(std::time::Duration::from_millis(interval_ms));
        match session.is_stale() {
            Ok(true) => {
                println!("{}: changed, recompiling", file.display());
                if let Some(output) = compile(session, file) {
                    print_diagnostics(&output, false);
                    if !output.has_errors() {
                        println!("{}: ok", file.display());
                    }
                }
            }
            Ok(false) => {}
            Err(error) => {
                eprintln!("Error: {}", error);
                return 1;
            }
        }
    }
}
